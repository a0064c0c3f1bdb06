//! Module: query::builder
//! Responsibility: turn loosely-typed request inputs into native scan/query requests.
//! Does not own: predicate semantics (see `query::predicate`) or execution.
//! Boundary: every check runs before the native request is touched.

mod descriptor;

#[cfg(test)]
mod tests;

pub use descriptor::RequestDescriptor;

use crate::{
    config::{Config, QueryPolicy, ScanPolicy},
    convert::{ConversionError, ValueConverter},
    native::{QueryRequest, ScanRequest},
    obs::sink::{self, MetricsEvent, RequestKind},
    query::{
        marshal::marshal,
        predicate::{self, AttachError, ValidateError},
    },
    value::Value,
};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// ParamError
///
/// Malformed or missing request fields. Messages are stable.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
pub enum ParamError {
    #[error("Namespace/Set must be non empty string")]
    ScanNamespace,

    #[error("Namespace/Set must not be empty")]
    BackgroundNamespace,

    #[error("Namespace must be non empty string")]
    QueryNamespace,

    #[error("Set must be NULL or non empty string")]
    Set,

    #[error("Bin names must be an Array")]
    Bins,

    #[error(
        "Predicate must be an Array containing the keys 'bin', ['index_type',] 'op', and 'val'"
    )]
    Predicate,

    #[error("Module/Function must not be empty")]
    ModuleFunction,

    #[error("Function arguments must be of type array")]
    Args,
}

///
/// ApplyTarget
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ApplyTarget {
    #[display("background scan")]
    BackgroundScan,
    #[display("aggregate")]
    Aggregate,
}

///
/// BuildError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BuildError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Predicate(#[from] ValidateError),

    #[error(transparent)]
    Attach(#[from] AttachError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Unable to initiate {0} : UDF apply failed")]
    UdfApplyFailed(ApplyTarget),
}

///
/// RequestBuilder
///
/// Stateless apart from the policies it stamps onto requests and the
/// converter it marshals UDF arguments with.
///

#[derive(Clone, Copy)]
pub struct RequestBuilder<'a> {
    converter: &'a dyn ValueConverter,
    scan_policy: ScanPolicy,
    query_policy: QueryPolicy,
}

impl<'a> RequestBuilder<'a> {
    #[must_use]
    pub fn new(converter: &'a dyn ValueConverter) -> Self {
        Self {
            converter,
            scan_policy: ScanPolicy::default(),
            query_policy: QueryPolicy::default(),
        }
    }

    #[must_use]
    pub const fn from_config(converter: &'a dyn ValueConverter, config: &Config) -> Self {
        Self {
            converter,
            scan_policy: config.scan,
            query_policy: config.query,
        }
    }

    /// Foreach scan over all (or the selected) bins.
    pub fn build_scan(
        &self,
        namespace: &Value,
        set: &Value,
        bins: &Value,
    ) -> Result<ScanRequest, BuildError> {
        record(RequestKind::Scan, self.try_build_scan(namespace, set, bins))
    }

    /// Secondary-index query with an optional predicate descriptor.
    pub fn build_query(
        &self,
        namespace: &Value,
        set: &Value,
        predicate: &Value,
        bins: &Value,
    ) -> Result<QueryRequest, BuildError> {
        record(
            RequestKind::Query,
            self.try_build_query(namespace, set, predicate, bins),
        )
    }

    /// Scan that runs `module.function` against every record server-side.
    pub fn build_background_scan(
        &self,
        namespace: &Value,
        set: &Value,
        module: &Value,
        function: &Value,
        args: &Value,
    ) -> Result<ScanRequest, BuildError> {
        record(
            RequestKind::BackgroundScan,
            self.try_build_background_scan(namespace, set, module, function, args),
        )
    }

    /// Query whose results are reduced by `module.function`.
    pub fn build_aggregate(
        &self,
        namespace: &Value,
        set: &Value,
        predicate: &Value,
        module: &Value,
        function: &Value,
        args: &Value,
    ) -> Result<QueryRequest, BuildError> {
        record(
            RequestKind::Aggregate,
            self.try_build_aggregate(namespace, set, predicate, module, function, args),
        )
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    fn try_build_scan(
        &self,
        namespace: &Value,
        set: &Value,
        bins: &Value,
    ) -> Result<ScanRequest, BuildError> {
        let namespace = check_namespace(namespace, ParamError::ScanNamespace)?;
        let set = check_set(set)?;
        let bins = check_bins(bins)?;

        let mut scan = ScanRequest::new(namespace, set);
        scan.set_policy(self.scan_policy);
        if let Some(bins) = bins.filter(|bins| !bins.is_empty()) {
            scan.select_init(bins.len());
            for name in bin_names(bins) {
                scan.select(&name);
            }
        }

        Ok(scan)
    }

    fn try_build_query(
        &self,
        namespace: &Value,
        set: &Value,
        predicate: &Value,
        bins: &Value,
    ) -> Result<QueryRequest, BuildError> {
        let namespace = check_namespace(namespace, ParamError::QueryNamespace)?;
        let set = check_set(set)?;
        let bins = check_bins(bins)?;
        check_predicate(predicate)?;

        let mut query = QueryRequest::new(namespace, set);
        query.set_policy(self.query_policy);
        if let Some(bins) = bins.filter(|bins| !bins.is_empty()) {
            query.select_init(bins.len());
            for name in bin_names(bins) {
                query.select(&name);
            }
        }
        attach_predicate(&mut query, predicate)?;

        Ok(query)
    }

    fn try_build_background_scan(
        &self,
        namespace: &Value,
        set: &Value,
        module: &Value,
        function: &Value,
        args: &Value,
    ) -> Result<ScanRequest, BuildError> {
        let namespace = check_namespace(namespace, ParamError::BackgroundNamespace)?;
        let set = check_set(set)?;
        let (module, function) = check_udf(module, function)?;
        let args = check_args(args)?;

        let mut scan = ScanRequest::new(namespace, set);
        scan.set_policy(self.scan_policy);
        let args = marshal(args, self.converter)?;
        if !scan.apply_each(module, function, args) {
            return Err(BuildError::UdfApplyFailed(ApplyTarget::BackgroundScan));
        }

        Ok(scan)
    }

    fn try_build_aggregate(
        &self,
        namespace: &Value,
        set: &Value,
        predicate: &Value,
        module: &Value,
        function: &Value,
        args: &Value,
    ) -> Result<QueryRequest, BuildError> {
        let namespace = check_namespace(namespace, ParamError::QueryNamespace)?;
        let set = check_set(set)?;
        check_predicate(predicate)?;
        let (module, function) = check_udf(module, function)?;
        let args = check_args(args)?;

        let mut query = QueryRequest::new(namespace, set);
        query.set_policy(self.query_policy);
        // the UDF is only applied once the predicate is in place
        attach_predicate(&mut query, predicate)?;

        let args = marshal(args, self.converter)?;
        if !query.apply(module, function, args) {
            return Err(BuildError::UdfApplyFailed(ApplyTarget::Aggregate));
        }

        Ok(query)
    }
}

// ----------------------------------------------------------------------
// Field checks
// ----------------------------------------------------------------------

fn record<T>(kind: RequestKind, result: Result<T, BuildError>) -> Result<T, BuildError> {
    match &result {
        Ok(_) => {
            sink::record(MetricsEvent::RequestBuilt { kind });
            tracing::debug!(?kind, "request built");
        }
        Err(err) => {
            sink::record(MetricsEvent::BuildRejected { kind });
            tracing::debug!(?kind, error = %err, "request rejected");
        }
    }

    result
}

fn check_namespace(namespace: &Value, err: ParamError) -> Result<&str, ParamError> {
    namespace.as_non_empty_text().ok_or(err)
}

fn check_set(set: &Value) -> Result<Option<&str>, ParamError> {
    if set.is_null() {
        return Ok(None);
    }

    set.as_non_empty_text().map(Some).ok_or(ParamError::Set)
}

fn check_bins(bins: &Value) -> Result<Option<&[Value]>, ParamError> {
    if bins.is_null() {
        return Ok(None);
    }

    bins.as_list().map(Some).ok_or(ParamError::Bins)
}

const fn check_predicate(predicate: &Value) -> Result<(), ParamError> {
    if predicate.is_null() || predicate.is_map() {
        Ok(())
    } else {
        Err(ParamError::Predicate)
    }
}

fn check_udf<'v>(module: &'v Value, function: &'v Value) -> Result<(&'v str, &'v str), ParamError> {
    match (module.as_non_empty_text(), function.as_non_empty_text()) {
        (Some(module), Some(function)) => Ok((module, function)),
        _ => Err(ParamError::ModuleFunction),
    }
}

fn check_args(args: &Value) -> Result<Option<&[Value]>, ParamError> {
    if args.is_null() {
        return Ok(None);
    }

    args.as_list().map(Some).ok_or(ParamError::Args)
}

// Nested collections are skipped rather than rejected.
fn bin_names(bins: &[Value]) -> impl Iterator<Item = String> + '_ {
    bins.iter().filter_map(Value::to_name)
}

fn attach_predicate(query: &mut QueryRequest, predicate: &Value) -> Result<(), BuildError> {
    if predicate.is_empty_collection() || predicate.is_null() {
        return Ok(());
    }

    let shape = predicate::validate(predicate)?;
    predicate::attach(query, &shape)?;

    Ok(())
}

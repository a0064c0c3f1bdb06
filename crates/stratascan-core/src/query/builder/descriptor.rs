use super::{BuildError, RequestBuilder};
use crate::{
    native::{QueryRequest, ScanRequest},
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// RequestDescriptor
///
/// Loosely-typed description of a scan, query or aggregate, usually decoded
/// from JSON. Missing fields are `Value::Null`; the builder decides which
/// of them are required.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RequestDescriptor {
    pub namespace: Value,
    pub set: Value,
    pub bins: Value,
    pub predicate: Value,
    pub module: Value,
    pub function: Value,
    pub args: Value,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(namespace: impl Into<Value>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Decode a descriptor from JSON text.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    #[must_use]
    pub fn with_set(mut self, set: impl Into<Value>) -> Self {
        self.set = set.into();
        self
    }

    #[must_use]
    pub fn with_bins(mut self, bins: impl Into<Value>) -> Self {
        self.bins = bins.into();
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Into<Value>) -> Self {
        self.predicate = predicate.into();
        self
    }

    #[must_use]
    pub fn with_udf(mut self, module: impl Into<Value>, function: impl Into<Value>) -> Self {
        self.module = module.into();
        self.function = function.into();
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: impl Into<Value>) -> Self {
        self.args = args.into();
        self
    }

    // ------------------------------------------------------------------
    // Forwarding
    // ------------------------------------------------------------------

    pub fn build_scan(&self, builder: &RequestBuilder<'_>) -> Result<ScanRequest, BuildError> {
        builder.build_scan(&self.namespace, &self.set, &self.bins)
    }

    pub fn build_query(&self, builder: &RequestBuilder<'_>) -> Result<QueryRequest, BuildError> {
        builder.build_query(&self.namespace, &self.set, &self.predicate, &self.bins)
    }

    pub fn build_background_scan(
        &self,
        builder: &RequestBuilder<'_>,
    ) -> Result<ScanRequest, BuildError> {
        builder.build_background_scan(
            &self.namespace,
            &self.set,
            &self.module,
            &self.function,
            &self.args,
        )
    }

    pub fn build_aggregate(
        &self,
        builder: &RequestBuilder<'_>,
    ) -> Result<QueryRequest, BuildError> {
        builder.build_aggregate(
            &self.namespace,
            &self.set,
            &self.predicate,
            &self.module,
            &self.function,
            &self.args,
        )
    }
}

use crate::{
    config::{QueryPolicy, ScanPolicy},
    native::{Filter, NativeValue},
};

///
/// CONSTANTS
///

/// Longest UDF module name the execution layer accepts, in bytes.
pub const UDF_MODULE_MAX_LEN: usize = 63;

/// Longest UDF function name the execution layer accepts, in bytes.
pub const UDF_FUNCTION_MAX_LEN: usize = 63;

///
/// UdfCall
///
/// Server-side function reference. `args` is `None` when the caller
/// supplied no argument list at all.
///

#[derive(Clone, Debug, PartialEq)]
pub struct UdfCall {
    pub module: String,
    pub function: String,
    pub args: Option<Vec<NativeValue>>,
}

impl UdfCall {
    /// Native constructor; rejects names the execution layer cannot store.
    fn new(module: &str, function: &str, args: Option<Vec<NativeValue>>) -> Option<Self> {
        if module.is_empty()
            || function.is_empty()
            || module.len() > UDF_MODULE_MAX_LEN
            || function.len() > UDF_FUNCTION_MAX_LEN
        {
            return None;
        }

        Some(Self {
            module: module.to_string(),
            function: function.to_string(),
            args,
        })
    }

    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.args.as_ref().map_or(0, Vec::len)
    }
}

///
/// ScanRequest
///
/// Native scan over a namespace and optional set.
/// `select` stays `None` until `select_init` is called; `None` means all bins.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ScanRequest {
    namespace: String,
    set: Option<String>,
    select: Option<Vec<String>>,
    apply: Option<UdfCall>,
    policy: ScanPolicy,
}

impl ScanRequest {
    #[must_use]
    pub fn new(namespace: &str, set: Option<&str>) -> Self {
        Self {
            namespace: namespace.to_string(),
            set: set.map(ToString::to_string),
            select: None,
            apply: None,
            policy: ScanPolicy::default(),
        }
    }

    pub fn select_init(&mut self, capacity: usize) {
        self.select = Some(Vec::with_capacity(capacity));
    }

    /// Add a projected bin. Returns false before `select_init`.
    pub fn select(&mut self, bin: &str) -> bool {
        match self.select.as_mut() {
            Some(bins) => {
                bins.push(bin.to_string());
                true
            }
            None => false,
        }
    }

    /// Attach a per-record UDF for a background scan.
    pub fn apply_each(
        &mut self,
        module: &str,
        function: &str,
        args: Option<Vec<NativeValue>>,
    ) -> bool {
        match UdfCall::new(module, function, args) {
            Some(call) => {
                self.apply = Some(call);
                true
            }
            None => false,
        }
    }

    pub const fn set_policy(&mut self, policy: ScanPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn set(&self) -> Option<&str> {
        self.set.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&[String]> {
        self.select.as_deref()
    }

    #[must_use]
    pub const fn udf(&self) -> Option<&UdfCall> {
        self.apply.as_ref()
    }

    #[must_use]
    pub const fn policy(&self) -> &ScanPolicy {
        &self.policy
    }
}

///
/// QueryRequest
///
/// Native secondary-index query. Holds at most one filter.
///

#[derive(Clone, Debug, PartialEq)]
pub struct QueryRequest {
    namespace: String,
    set: Option<String>,
    select: Option<Vec<String>>,
    filter: Option<Filter>,
    apply: Option<UdfCall>,
    policy: QueryPolicy,
}

impl QueryRequest {
    #[must_use]
    pub fn new(namespace: &str, set: Option<&str>) -> Self {
        Self {
            namespace: namespace.to_string(),
            set: set.map(ToString::to_string),
            select: None,
            filter: None,
            apply: None,
            policy: QueryPolicy::default(),
        }
    }

    pub fn select_init(&mut self, capacity: usize) {
        self.select = Some(Vec::with_capacity(capacity));
    }

    /// Add a projected bin. Returns false before `select_init`.
    pub fn select(&mut self, bin: &str) -> bool {
        match self.select.as_mut() {
            Some(bins) => {
                bins.push(bin.to_string());
                true
            }
            None => false,
        }
    }

    /// Attach the query filter. Returns false if one is already attached.
    pub fn where_(&mut self, filter: Filter) -> bool {
        if self.filter.is_some() {
            return false;
        }
        self.filter = Some(filter);

        true
    }

    /// Attach an aggregation UDF.
    pub fn apply(&mut self, module: &str, function: &str, args: Option<Vec<NativeValue>>) -> bool {
        match UdfCall::new(module, function, args) {
            Some(call) => {
                self.apply = Some(call);
                true
            }
            None => false,
        }
    }

    pub const fn set_policy(&mut self, policy: QueryPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn set(&self) -> Option<&str> {
        self.set.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&[String]> {
        self.select.as_deref()
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    #[must_use]
    pub const fn udf(&self) -> Option<&UdfCall> {
        self.apply.as_ref()
    }

    #[must_use]
    pub const fn policy(&self) -> &QueryPolicy {
        &self.policy
    }
}

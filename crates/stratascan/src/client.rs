use crate::Error;
use stratascan_core::{
    bridge::{self, CallbackContext, HostSession, ThreadLocalSession},
    config::Config,
    convert::{DefaultConverter, ValueConverter},
    executor::{Executor, MemoryExecutor, NativeError, ScanInfo},
    query::{RequestBuilder, RequestDescriptor},
    value::Value,
};

///
/// Client
///
/// Builds requests from descriptors, hands them to the executor and
/// delivers results through the callback bridge.
///

pub struct Client<E: Executor = MemoryExecutor> {
    executor: E,
    converter: Box<dyn ValueConverter + Send>,
    session: Box<dyn HostSession + Send>,
    config: Config,
}

impl Client<MemoryExecutor> {
    /// Client over an in-process executor sized from `config.executor`.
    pub fn in_memory(config: Config) -> Result<Self, Error> {
        let executor = MemoryExecutor::from_config(&config.executor);

        Self::new(executor, config)
    }
}

impl<E: Executor> Client<E> {
    pub fn new(executor: E, config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            executor,
            converter: Box::new(DefaultConverter::new(config.client.serializer)),
            session: Box::new(ThreadLocalSession::default()),
            config,
        })
    }

    #[must_use]
    pub fn with_converter(mut self, converter: impl ValueConverter + Send + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: impl HostSession + Send + 'static) -> Self {
        self.session = Box::new(session);
        self
    }

    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    fn builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::from_config(&*self.converter, &self.config)
    }

    /// Stream every matching record of a scan into `handler`.
    ///
    /// The handler stops the scan by returning `false`.
    pub fn scan<F, R>(&self, descriptor: &RequestDescriptor, handler: F) -> Result<(), Error>
    where
        F: FnMut(Value) -> R + Send,
        R: Into<Value>,
    {
        let request = descriptor.build_scan(&self.builder())?;
        let context = CallbackContext::streaming(&*self.converter, &*self.session, handler);

        let result = self
            .executor
            .scan_foreach(&request, &|native| bridge::on_result(native, &context));

        finish(&context, result)
    }

    /// Stream every record matching the descriptor's predicate into `handler`.
    pub fn query<F, R>(&self, descriptor: &RequestDescriptor, handler: F) -> Result<(), Error>
    where
        F: FnMut(Value) -> R + Send,
        R: Into<Value>,
    {
        let request = descriptor.build_query(&self.builder())?;
        let context = CallbackContext::streaming(&*self.converter, &*self.session, handler);

        let result = self
            .executor
            .query_foreach(&request, &|native| bridge::on_result(native, &context));

        finish(&context, result)
    }

    /// Run a stream UDF over the query results and collect its output.
    ///
    /// Empty lists and maps emitted by the UDF are dropped.
    pub fn aggregate(&self, descriptor: &RequestDescriptor) -> Result<Vec<Value>, Error> {
        let request = descriptor.build_aggregate(&self.builder())?;
        let context = CallbackContext::aggregate(&*self.converter, &*self.session);

        let result = self
            .executor
            .query_foreach(&request, &|native| bridge::on_result(native, &context));
        finish(&context, result)?;

        Ok(context.into_results())
    }

    /// Start a background scan applying the descriptor's UDF to each record.
    pub fn scan_apply(&self, descriptor: &RequestDescriptor) -> Result<u64, Error> {
        let request = descriptor.build_background_scan(&self.builder())?;

        let scan_id = self.executor.scan_background(&request).inspect_err(|err| {
            tracing::warn!(error = %err, "background scan failed to start");
        })?;
        tracing::debug!(scan_id, namespace = request.namespace(), "background scan started");

        Ok(scan_id)
    }

    pub fn scan_info(&self, scan_id: u64) -> Result<ScanInfo, Error> {
        Ok(self.executor.scan_info(scan_id)?)
    }
}

// A conversion error recorded during delivery outranks the executor's status.
fn finish(context: &CallbackContext<'_>, result: Result<(), NativeError>) -> Result<(), Error> {
    if let Some(err) = context.take_error() {
        return Err(err.into());
    }

    result.map_err(|err| {
        tracing::warn!(error = %err, "execution layer reported failure");
        err.into()
    })
}

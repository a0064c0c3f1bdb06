//! Module: bridge
//! Responsibility: deliver native results into the caller's context, one at a time.
//! Does not own: producing results (see `executor`) or value conversion rules (see `convert`).
//! Boundary: every delivery in the process is serialized behind `CALLBACK_LOCK`.

mod session;


pub use session::{HostSession, ThreadLocalSession};

use crate::{
    convert::{ConversionError, ValueConverter},
    native::NativeValue,
    obs::sink::{self, MetricsEvent},
    value::Value,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};

/// Held for writing for the whole of every callback, across all requests.
static CALLBACK_LOCK: RwLock<()> = parking_lot::const_rwlock(());

type Handler<'a> = Box<dyn FnMut(Value) -> Value + Send + 'a>;

///
/// Delivery
///

enum Delivery<'a> {
    Stream(Mutex<Handler<'a>>),
    Aggregate(Mutex<Vec<Value>>),
}

///
/// CallbackContext
///
/// State for one request execution, shared by reference with every
/// callback the execution layer makes for that request.
///

pub struct CallbackContext<'a> {
    delivery: Delivery<'a>,
    error: Mutex<Option<ConversionError>>,
    stopped: AtomicBool,
    converter: &'a dyn ValueConverter,
    session: &'a dyn HostSession,
}

impl<'a> CallbackContext<'a> {
    /// Context that hands each record to `handler`.
    ///
    /// A handler return of `false` stops the stream; any other value continues it.
    pub fn streaming<F, R>(
        converter: &'a dyn ValueConverter,
        session: &'a dyn HostSession,
        mut handler: F,
    ) -> Self
    where
        F: FnMut(Value) -> R + Send + 'a,
        R: Into<Value>,
    {
        let handler: Handler<'a> = Box::new(move |record| handler(record).into());

        Self::with_delivery(converter, session, Delivery::Stream(Mutex::new(handler)))
    }

    /// Context that accumulates every non-empty aggregate value.
    #[must_use]
    pub fn aggregate(converter: &'a dyn ValueConverter, session: &'a dyn HostSession) -> Self {
        Self::with_delivery(
            converter,
            session,
            Delivery::Aggregate(Mutex::new(Vec::new())),
        )
    }

    const fn with_delivery(
        converter: &'a dyn ValueConverter,
        session: &'a dyn HostSession,
        delivery: Delivery<'a>,
    ) -> Self {
        Self {
            delivery,
            error: Mutex::new(None),
            stopped: AtomicBool::new(false),
            converter,
            session,
        }
    }

    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self.delivery, Delivery::Aggregate(_))
    }

    /// Whether a delivery for this request has already asked to stop.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn stop(&self) -> bool {
        self.stopped.store(true, Ordering::Release);

        false
    }

    /// Remove the recorded conversion error, if any.
    pub fn take_error(&self) -> Option<ConversionError> {
        self.error.lock().take()
    }

    /// Accumulated aggregate values; always empty for streaming contexts.
    #[must_use]
    pub fn into_results(self) -> Vec<Value> {
        match self.delivery {
            Delivery::Aggregate(results) => results.into_inner(),
            Delivery::Stream(_) => Vec::new(),
        }
    }

    // First error wins; later callbacks of the same request are already stopping.
    fn fail(&self, err: ConversionError) -> bool {
        tracing::warn!(error = %err, "result conversion failed; stopping request");
        sink::record(MetricsEvent::ConversionFailed);

        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(err);
        }

        self.stop()
    }
}

/// Deliver one native result. Returns `true` to continue, `false` to stop.
///
/// `None` is the end-of-stream signal: it stops without touching the context.
/// Once a delivery has stopped the request, later ones return `false` without
/// converting or dispatching.
pub fn on_result(native: Option<&NativeValue>, context: &CallbackContext<'_>) -> bool {
    let Some(native) = native else {
        sink::record(MetricsEvent::StreamFinished);
        return false;
    };

    // released on every exit, unwinding included
    let _guard = CALLBACK_LOCK.write();
    if context.is_stopped() {
        return false;
    }
    context.session.ensure_active();

    match &context.delivery {
        Delivery::Stream(handler) => deliver_record(native, context, handler),
        Delivery::Aggregate(results) => deliver_aggregate(native, context, results),
    }
}

fn deliver_record(
    native: &NativeValue,
    context: &CallbackContext<'_>,
    handler: &Mutex<Handler<'_>>,
) -> bool {
    let Some(record) = native.as_record() else {
        tracing::debug!("streaming request received a non-record value; stopping");
        return context.stop();
    };

    let value = match context.converter.record_to_value(record) {
        Ok(value) => value,
        Err(err) => return context.fail(err),
    };

    sink::record(MetricsEvent::ResultDelivered);
    tracing::trace!(namespace = %record.key.namespace, "record delivered");

    let mut guard = handler.lock();
    let handler = &mut **guard;
    if matches!(handler(value), Value::Bool(false)) {
        sink::record(MetricsEvent::HandlerStopped);
        return context.stop();
    }

    true
}

fn deliver_aggregate(
    native: &NativeValue,
    context: &CallbackContext<'_>,
    results: &Mutex<Vec<Value>>,
) -> bool {
    let value = match context.converter.native_to_value(native) {
        Ok(value) => value,
        Err(err) => return context.fail(err),
    };

    if value.is_empty_collection() {
        sink::record(MetricsEvent::AggregateValueFiltered);
        return true;
    }

    sink::record(MetricsEvent::ResultDelivered);
    tracing::trace!(kind = value.kind(), "aggregate value delivered");
    results.lock().push(value);

    true
}

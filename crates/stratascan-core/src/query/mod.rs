//! Module: query
//! Responsibility: request assembly from loosely-typed input.
//! Does not own: request execution or result delivery.

pub mod builder;
pub mod marshal;
pub mod predicate;

pub use builder::{ApplyTarget, BuildError, ParamError, RequestBuilder, RequestDescriptor};
pub use marshal::marshal;

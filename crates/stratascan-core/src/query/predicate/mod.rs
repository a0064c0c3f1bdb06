//! Module: query::predicate
//! Responsibility: the four predicate kinds, descriptor validation and filter attachment.
//! Does not own: request assembly (see `query::builder`).

mod attach;
mod model;
mod validate;


pub use attach::{AttachError, attach};
pub use model::{
    ConstructError, OP_BETWEEN, OP_CONTAINS, OP_EQUALS, OP_RANGE, Predicate, PredicateValue,
    RangeBounds,
};
pub use validate::{ShapeValue, ValidateError, ValidatedShape, validate};

use super::{
    model::{OP_BETWEEN, OP_CONTAINS, OP_EQUALS, OP_RANGE, Predicate, PredicateValue, RangeBounds},
    validate::{ShapeValue, ValidateError, ValidatedShape},
};
use crate::native::{IndexType, QueryRequest};
use thiserror::Error as ThisError;

///
/// AttachError
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
pub enum AttachError {
    #[error("Predicate must be an Array : 'index_type' key : Invalid index type")]
    InvalidIndexType,

    /// The value passed validation but does not fit the operator.
    #[error(transparent)]
    ValueShape(ValidateError),

    #[error("query already carries a predicate")]
    AlreadyAttached,
}

impl ValidatedShape {
    /// Interpret the operator. Unknown operators resolve to `None`.
    pub fn resolve(&self) -> Result<Option<Predicate>, AttachError> {
        let bin = self.bin.clone();

        let predicate = match self.op.as_str() {
            OP_EQUALS => Predicate::Equals {
                bin,
                value: self.scalar()?,
            },
            OP_CONTAINS => {
                let index_type = self.collection_index()?;
                Predicate::Contains {
                    bin,
                    index_type,
                    value: self.scalar()?,
                }
            }
            OP_BETWEEN => match self.val {
                ShapeValue::IntegerPair(min, max) => Predicate::Between { bin, min, max },
                _ => return Err(AttachError::ValueShape(ValidateError::IntegerPair)),
            },
            OP_RANGE => {
                let index_type = self.collection_index()?;
                let bounds = match &self.val {
                    ShapeValue::IntegerPair(min, max) => RangeBounds::Integer(*min, *max),
                    ShapeValue::TextPair(min, max) => RangeBounds::Text(min.clone(), max.clone()),
                    _ => return Err(AttachError::ValueShape(ValidateError::RangePair)),
                };
                Predicate::Range {
                    bin,
                    index_type,
                    bounds,
                }
            }
            _ => return Ok(None),
        };

        Ok(Some(predicate))
    }

    fn collection_index(&self) -> Result<IndexType, AttachError> {
        self.index_type
            .and_then(IndexType::from_code)
            .ok_or(AttachError::InvalidIndexType)
    }

    fn scalar(&self) -> Result<PredicateValue, AttachError> {
        match &self.val {
            ShapeValue::Integer(v) => Ok(PredicateValue::Integer(*v)),
            ShapeValue::Text(s) => Ok(PredicateValue::Text(s.clone())),
            _ => Err(AttachError::ValueShape(ValidateError::Scalar)),
        }
    }
}

/// Attach a validated predicate to a query.
///
/// Returns the attached predicate, or `None` when the operator is not one
/// of the four known tags; that case attaches nothing and is not an error.
pub fn attach(
    request: &mut QueryRequest,
    shape: &ValidatedShape,
) -> Result<Option<Predicate>, AttachError> {
    let Some(predicate) = shape.resolve()? else {
        tracing::debug!(op = %shape.op, bin = %shape.bin, "unrecognized predicate operator; no filter attached");
        return Ok(None);
    };

    if !request.where_(predicate.filter()) {
        return Err(AttachError::AlreadyAttached);
    }

    Ok(Some(predicate))
}

use super::model::OP_RANGE;
use crate::value::Value;
use thiserror::Error as ThisError;

///
/// ValidateError
///
/// Messages are part of the public contract; callers match on them.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
pub enum ValidateError {
    #[error(
        "Predicate must be an Array containing the keys 'bin', ['index_type',] 'op', and 'val'"
    )]
    MissingKeys,

    #[error("Predicate must be an Array : 'bin' key value must be non empty string")]
    Bin,

    #[error("Predicate must be an Array : 'index_type' key value must be integer")]
    IndexType,

    #[error("Predicate must be an Array : 'op' key value must be non empty string")]
    Op,

    #[error(
        "Predicate must be an Array : 'val' key value must be an array containing min and max integers"
    )]
    IntegerPair,

    #[error(
        "Predicate must be an Array : 'val' key value must be an array containing min and max integers or strings"
    )]
    RangePair,

    #[error("Predicate must be an Array : 'val' key value must be integer or non empty string")]
    Scalar,
}

///
/// ShapeValue
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShapeValue {
    Integer(i64),
    Text(String),
    IntegerPair(i64, i64),
    TextPair(String, String),
}

impl ShapeValue {
    #[must_use]
    pub const fn is_pair(&self) -> bool {
        matches!(self, Self::IntegerPair(..) | Self::TextPair(..))
    }
}

///
/// ValidatedShape
///
/// A descriptor whose keys and field types have been checked.
/// The operator and index type are still raw; `attach` interprets them.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidatedShape {
    pub bin: String,
    pub index_type: Option<i64>,
    pub op: String,
    pub val: ShapeValue,
}

/// Check a predicate descriptor. The first failing rule wins.
pub fn validate(descriptor: &Value) -> Result<ValidatedShape, ValidateError> {
    let (Some(bin), Some(op), Some(val)) = (
        descriptor.get("bin"),
        descriptor.get("op"),
        descriptor.get("val"),
    ) else {
        return Err(ValidateError::MissingKeys);
    };
    let index_type = descriptor.get("index_type");

    let bin = bin.as_non_empty_text().ok_or(ValidateError::Bin)?;
    let index_type = match index_type {
        Some(v) => Some(v.as_int().ok_or(ValidateError::IndexType)?),
        None => None,
    };
    let op = op.as_non_empty_text().ok_or(ValidateError::Op)?;
    let val = validate_val(op, val)?;

    Ok(ValidatedShape {
        bin: bin.to_string(),
        index_type,
        op: op.to_string(),
        val,
    })
}

fn validate_val(op: &str, val: &Value) -> Result<ShapeValue, ValidateError> {
    if let Some(items) = val.as_list() {
        return match (items.first(), items.get(1)) {
            (Some(Value::Int(min)), Some(Value::Int(max))) => {
                Ok(ShapeValue::IntegerPair(*min, *max))
            }
            // string bounds are only meaningful for collection ranges
            (Some(Value::Text(min)), Some(Value::Text(max)))
                if op == OP_RANGE && !min.is_empty() && !max.is_empty() =>
            {
                Ok(ShapeValue::TextPair(min.clone(), max.clone()))
            }
            _ if op == OP_RANGE => Err(ValidateError::RangePair),
            _ => Err(ValidateError::IntegerPair),
        };
    }

    match val {
        Value::Int(v) => Ok(ShapeValue::Integer(*v)),
        Value::Text(s) if !s.is_empty() => Ok(ShapeValue::Text(s.clone())),
        _ => Err(ValidateError::Scalar),
    }
}

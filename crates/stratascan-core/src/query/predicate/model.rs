use crate::{
    native::{Filter, IndexType},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// Operator tags
///

pub const OP_EQUALS: &str = "=";
pub const OP_CONTAINS: &str = "CONTAINS";
pub const OP_BETWEEN: &str = "BETWEEN";
pub const OP_RANGE: &str = "RANGE";

///
/// ConstructError
///
/// Rejections raised when building a predicate in code.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConstructError {
    #[error("predicate bin name must be a non empty string")]
    Bin,

    #[error("predicate value must be an integer or non empty string")]
    Value,

    #[error("between bounds must be integers")]
    BetweenBounds,

    #[error("range bounds must be both integers or both non empty strings")]
    RangeBounds,
}

///
/// PredicateValue
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PredicateValue {
    Integer(i64),
    Text(String),
}

impl PredicateValue {
    fn from_value(value: &Value) -> Result<Self, ConstructError> {
        match value {
            Value::Int(v) => Ok(Self::Integer(*v)),
            Value::Text(s) if !s.is_empty() => Ok(Self::Text(s.clone())),
            _ => Err(ConstructError::Value),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Integer(v) => Value::Int(*v),
            Self::Text(s) => Value::Text(s.clone()),
        }
    }
}

///
/// RangeBounds
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RangeBounds {
    Integer(i64, i64),
    Text(String, String),
}

///
/// Predicate
///
/// One secondary-index condition. Exactly four kinds exist; anything
/// richer is out of reach of the native filter primitives.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    Equals {
        bin: String,
        value: PredicateValue,
    },
    Contains {
        bin: String,
        index_type: IndexType,
        value: PredicateValue,
    },
    Between {
        bin: String,
        min: i64,
        max: i64,
    },
    Range {
        bin: String,
        index_type: IndexType,
        bounds: RangeBounds,
    },
}

impl Predicate {
    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn equals(bin: impl Into<Value>, value: impl Into<Value>) -> Result<Self, ConstructError> {
        Ok(Self::Equals {
            bin: bin_name(&bin.into())?,
            value: PredicateValue::from_value(&value.into())?,
        })
    }

    pub fn contains(
        bin: impl Into<Value>,
        index_type: IndexType,
        value: impl Into<Value>,
    ) -> Result<Self, ConstructError> {
        Ok(Self::Contains {
            bin: bin_name(&bin.into())?,
            index_type,
            value: PredicateValue::from_value(&value.into())?,
        })
    }

    /// Booleans are accepted as bounds and read as 0 or 1.
    pub fn between(
        bin: impl Into<Value>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Result<Self, ConstructError> {
        let bin = bin_name(&bin.into())?;
        let (Some(min), Some(max)) = (integer_like(&min.into()), integer_like(&max.into())) else {
            return Err(ConstructError::BetweenBounds);
        };

        Ok(Self::Between { bin, min, max })
    }

    pub fn range(
        bin: impl Into<Value>,
        index_type: IndexType,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Result<Self, ConstructError> {
        let bin = bin_name(&bin.into())?;
        let bounds = match (min.into(), max.into()) {
            (Value::Int(min), Value::Int(max)) => RangeBounds::Integer(min, max),
            (Value::Text(min), Value::Text(max)) if !min.is_empty() && !max.is_empty() => {
                RangeBounds::Text(min, max)
            }
            _ => return Err(ConstructError::RangeBounds),
        };

        Ok(Self::Range {
            bin,
            index_type,
            bounds,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn bin(&self) -> &str {
        match self {
            Self::Equals { bin, .. }
            | Self::Contains { bin, .. }
            | Self::Between { bin, .. }
            | Self::Range { bin, .. } => bin,
        }
    }

    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::Equals { .. } => OP_EQUALS,
            Self::Contains { .. } => OP_CONTAINS,
            Self::Between { .. } => OP_BETWEEN,
            Self::Range { .. } => OP_RANGE,
        }
    }

    #[must_use]
    pub const fn index_type(&self) -> Option<IndexType> {
        match self {
            Self::Contains { index_type, .. } | Self::Range { index_type, .. } => Some(*index_type),
            Self::Equals { .. } | Self::Between { .. } => None,
        }
    }

    /// Render into the loosely-typed descriptor accepted by `validate`.
    #[must_use]
    pub fn descriptor(&self) -> Value {
        let val = match self {
            Self::Equals { value, .. } | Self::Contains { value, .. } => value.to_value(),
            Self::Between { min, max, .. }
            | Self::Range {
                bounds: RangeBounds::Integer(min, max),
                ..
            } => Value::list([*min, *max]),
            Self::Range {
                bounds: RangeBounds::Text(min, max),
                ..
            } => Value::list([min.as_str(), max.as_str()]),
        };

        let mut entries = vec![(Value::from("bin"), Value::from(self.bin()))];
        if let Some(index_type) = self.index_type() {
            entries.push((Value::from("index_type"), Value::Int(index_type.code())));
        }
        entries.push((Value::from("op"), Value::from(self.op())));
        entries.push((Value::from("val"), val));

        Value::Map(entries)
    }

    /// Lower into the native filter this predicate stands for.
    #[must_use]
    pub fn filter(&self) -> Filter {
        match self {
            Self::Equals {
                bin,
                value: PredicateValue::Integer(v),
            } => Filter::integer_equals(bin, *v),
            Self::Equals {
                bin,
                value: PredicateValue::Text(s),
            } => Filter::string_equals(bin, s),
            Self::Contains {
                bin,
                index_type,
                value: PredicateValue::Integer(v),
            } => Filter::contains_integer(bin, *index_type, *v),
            Self::Contains {
                bin,
                index_type,
                value: PredicateValue::Text(s),
            } => Filter::contains_string(bin, *index_type, s),
            Self::Between { bin, min, max } => Filter::integer_range(bin, *min, *max),
            Self::Range {
                bin,
                index_type,
                bounds: RangeBounds::Integer(min, max),
            } => Filter::range_integer(bin, *index_type, *min, *max),
            Self::Range {
                bin,
                index_type,
                bounds: RangeBounds::Text(min, max),
            } => Filter::range_string(bin, *index_type, min, max),
        }
    }
}

fn bin_name(bin: &Value) -> Result<String, ConstructError> {
    bin.as_non_empty_text()
        .map(ToString::to_string)
        .ok_or(ConstructError::Bin)
}

const fn integer_like(value: &Value) -> Option<i64> {
    match value {
        Value::Int(v) => Some(*v),
        Value::Bool(false) => Some(0),
        Value::Bool(true) => Some(1),
        _ => None,
    }
}

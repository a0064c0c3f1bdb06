//! Module: convert
//! Responsibility: per-value conversion between host `Value` and `NativeValue`.
//! Does not own: list construction for UDF arguments (see `query::marshal`).


use crate::{
    config::Serializer,
    native::{BytesKind, NativeBytes, NativeRecord, NativeValue},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// ConversionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConversionError {
    #[error("unsupported value type '{kind}': no serializer configured")]
    Unsupported { kind: &'static str },

    #[error("failed to serialize value: {0}")]
    Serialize(String),

    #[error("failed to deserialize value: {0}")]
    Deserialize(String),
}

///
/// ValueConverter
///
/// Conversion seam used by the argument marshaler and the callback bridge.
/// Implementations are shared across execution-layer threads.
///

pub trait ValueConverter: Sync {
    fn value_to_native(&self, value: &Value) -> Result<NativeValue, ConversionError>;

    fn native_to_value(&self, value: &NativeValue) -> Result<Value, ConversionError>;

    fn record_to_value(&self, record: &NativeRecord) -> Result<Value, ConversionError>;
}

///
/// DefaultConverter
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConverter {
    serializer: Serializer,
}

impl DefaultConverter {
    #[must_use]
    pub const fn new(serializer: Serializer) -> Self {
        Self { serializer }
    }

    #[must_use]
    pub const fn serializer(&self) -> Serializer {
        self.serializer
    }

    fn serialize(&self, value: &Value) -> Result<NativeValue, ConversionError> {
        match self.serializer {
            Serializer::None => Err(ConversionError::Unsupported { kind: value.kind() }),
            Serializer::Json => serde_json::to_vec(value)
                .map(|data| NativeValue::Bytes(NativeBytes::new(BytesKind::Json, data)))
                .map_err(|err| ConversionError::Serialize(err.to_string())),
        }
    }
}

impl ValueConverter for DefaultConverter {
    fn value_to_native(&self, value: &Value) -> Result<NativeValue, ConversionError> {
        Ok(match value {
            Value::Null => NativeValue::Nil,
            Value::Bool(_) => return self.serialize(value),
            Value::Int(v) => NativeValue::Integer(*v),
            Value::Float(v) => NativeValue::Double(*v),
            Value::Text(s) => NativeValue::Str(s.clone()),
            Value::Blob(bytes) => {
                NativeValue::Bytes(NativeBytes::new(BytesKind::Blob, bytes.clone()))
            }
            Value::List(items) => NativeValue::List(
                items
                    .iter()
                    .map(|item| self.value_to_native(item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(entries) => NativeValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((self.value_to_native(k)?, self.value_to_native(v)?)))
                    .collect::<Result<_, ConversionError>>()?,
            ),
        })
    }

    fn native_to_value(&self, value: &NativeValue) -> Result<Value, ConversionError> {
        Ok(match value {
            NativeValue::Nil => Value::Null,
            NativeValue::Integer(v) => Value::Int(*v),
            NativeValue::Double(v) => Value::Float(*v),
            NativeValue::Str(s) => Value::Text(s.clone()),
            NativeValue::Bytes(bytes) => match bytes.kind {
                BytesKind::Blob => Value::Blob(bytes.data.clone()),
                BytesKind::Json => serde_json::from_slice::<serde_json::Value>(&bytes.data)
                    .map(Value::from)
                    .map_err(|err| ConversionError::Deserialize(err.to_string()))?,
            },
            NativeValue::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.native_to_value(item))
                    .collect::<Result<_, _>>()?,
            ),
            NativeValue::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((self.native_to_value(k)?, self.native_to_value(v)?)))
                    .collect::<Result<_, ConversionError>>()?,
            ),
            NativeValue::Record(record) => self.record_to_value(record)?,
        })
    }

    fn record_to_value(&self, record: &NativeRecord) -> Result<Value, ConversionError> {
        let key = match record.key.key.as_deref() {
            Some(key) => self.native_to_value(key)?,
            None => Value::Null,
        };

        let bins = record
            .bins
            .iter()
            .map(|(name, value)| Ok((Value::Text(name.clone()), self.native_to_value(value)?)))
            .collect::<Result<Vec<_>, ConversionError>>()?;

        Ok(Value::map([
            (
                "key",
                Value::map([
                    ("ns", Value::from(record.key.namespace.as_str())),
                    ("set", Value::from(record.key.set.clone())),
                    ("key", key),
                ]),
            ),
            (
                "metadata",
                Value::map([
                    ("ttl", Value::from(record.ttl)),
                    ("generation", Value::from(u32::from(record.generation))),
                ]),
            ),
            ("bins", Value::Map(bins)),
        ]))
    }
}

use derive_more::Display;
use serde::{Deserialize, Serialize};
use stratascan_core::{
    config::ConfigError,
    convert::ConversionError,
    executor::NativeError,
    native::Status,
    query::BuildError,
};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Status code reported to callers for this error.
    #[must_use]
    pub fn status(&self) -> Status {
        match self.kind {
            ErrorKind::Param | ErrorKind::Predicate | ErrorKind::UdfApply | ErrorKind::Config => {
                Status::ErrParam
            }
            ErrorKind::Conversion => Status::ErrClient,
            ErrorKind::Native { code } => Status::from_code(code).unwrap_or(Status::ErrServer),
        }
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        let message = err.to_string();

        match err {
            BuildError::Param(_) => Self::new(ErrorKind::Param, ErrorOrigin::Builder, message),
            BuildError::Predicate(_) | BuildError::Attach(_) => {
                Self::new(ErrorKind::Predicate, ErrorOrigin::Predicate, message)
            }
            BuildError::Conversion(_) => {
                Self::new(ErrorKind::Conversion, ErrorOrigin::Builder, message)
            }
            BuildError::UdfApplyFailed(_) => {
                Self::new(ErrorKind::UdfApply, ErrorOrigin::Builder, message)
            }
        }
    }
}

/// Conversion errors raised while results are being delivered.
impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        Self::new(ErrorKind::Conversion, ErrorOrigin::Bridge, err.to_string())
    }
}

impl From<NativeError> for Error {
    fn from(err: NativeError) -> Self {
        Self::new(
            ErrorKind::Native {
                code: err.status.code(),
            },
            ErrorOrigin::Executor,
            err.message,
        )
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// A request field is missing, has the wrong type, or is an empty string.
    Param,

    /// The predicate descriptor failed validation or could not be attached.
    Predicate,

    /// The execution layer refused the UDF reference.
    UdfApply,

    /// A value has no native representation, or failed to (de)serialize.
    Conversion,

    /// The execution layer reported a failure.
    Native { code: i32 },

    Config,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Bridge,
    Builder,
    Config,
    Executor,
    Predicate,
}

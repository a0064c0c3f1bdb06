use derive_more::Display;

///
/// Status
///
/// Status codes reported by the execution layer and surfaced upward.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Status {
    #[display("AEROSPIKE_OK")]
    Ok,
    #[display("AEROSPIKE_ERR_SERVER")]
    ErrServer,
    #[display("AEROSPIKE_ERR_PARAM")]
    ErrParam,
    #[display("AEROSPIKE_ERR_NAMESPACE_NOT_FOUND")]
    ErrNamespaceNotFound,
    #[display("AEROSPIKE_ERR_UDF")]
    ErrUdf,
    #[display("AEROSPIKE_ERR_INDEX_NOT_FOUND")]
    ErrIndexNotFound,
    #[display("AEROSPIKE_ERR_CLIENT")]
    ErrClient,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::ErrServer => 1,
            Self::ErrParam => 4,
            Self::ErrNamespaceNotFound => 20,
            Self::ErrUdf => 100,
            Self::ErrIndexNotFound => 201,
            Self::ErrClient => -1,
        }
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::ErrServer),
            4 => Some(Self::ErrParam),
            20 => Some(Self::ErrNamespaceNotFound),
            100 => Some(Self::ErrUdf),
            201 => Some(Self::ErrIndexNotFound),
            -1 => Some(Self::ErrClient),
            _ => None,
        }
    }
}

//! Module: native
//! Responsibility: the request, filter and value shapes the execution layer consumes.
//! Does not own: validation of loosely-typed input (see `query`).
//! Boundary: everything here is already well-formed.

mod filter;
mod request;
mod status;
mod value;


pub use filter::{Filter, FilterKind, IndexType};
pub use request::{
    QueryRequest, ScanRequest, UDF_FUNCTION_MAX_LEN, UDF_MODULE_MAX_LEN, UdfCall,
};
pub use status::Status;
pub use value::{BytesKind, NativeBytes, NativeKey, NativeRecord, NativeValue};

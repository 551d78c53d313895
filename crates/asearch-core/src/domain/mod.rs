//! Domain model (ids, handles, requests, responses, wire encoding, errors).

pub mod errors;
pub mod handle;
pub mod ids;
pub mod request;
pub mod response;
pub mod snapshot;
pub mod state;
pub mod time_value;
pub mod wire;

pub use self::errors::{AsyncSearchError, ErrorKind, RegistryError};
pub use self::handle::{AsyncSearchHandle, HandleError};
pub use self::ids::{InvalidNodeId, NodeId, SearchId};
pub use self::request::{
    DEFAULT_WAIT_FOR_COMPLETION_TIMEOUT, DecodeError, DeleteAsyncSearchRequest,
    GetAsyncSearchRequest, SubmitAsyncSearchRequest, ValidationErrors,
};
pub use self::response::AsyncSearchResponse;
pub use self::snapshot::SearchSnapshot;
pub use self::state::{SearchFailure, SearchStatus};
pub use self::time_value::{TimeUnit, TimeValue, TimeValueError};

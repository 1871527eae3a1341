pub(crate) mod handler;
pub(crate) mod operation;
pub(crate) mod request;
pub(crate) mod response;
pub(crate) mod statistics;

// re-export to the public API
pub use handler::*;
pub use operation::*;
pub use statistics::*;

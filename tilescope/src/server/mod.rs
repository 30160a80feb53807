//! The HTTP API.

mod api_server;
mod cors;
mod error;
mod handlers;
mod routes;

pub use api_server::ApiServer;
pub use error::{ApiError, format_error_chain};
pub use handlers::{AppState, BBoxRequest, GeometriesRequest};
pub use routes::{api_router, status_router};

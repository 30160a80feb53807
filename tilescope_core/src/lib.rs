//! Core types and helpers shared by all tilescope crates.
//!
//! - [`types`]: bounding boxes, tile coordinates, quadkeys, projections and request limits.
//! - [`utils`]: retry with exponential backoff, bounded concurrent fan-out and an HTTP fetcher.
//! - [`error`]: the client-facing [`RequestError`].

pub mod error;
pub mod types;
pub mod utils;

pub use error::RequestError;
pub use types::*;

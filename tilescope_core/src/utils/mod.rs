//! Async helpers: retries with backoff, bounded fan-out and a shared HTTP client.

mod concurrency;
pub use concurrency::*;

mod http;
pub use http::*;

mod retry;
pub use retry::*;

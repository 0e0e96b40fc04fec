// svckit/src/lib.rs
//
// Shared plumbing for metrics-dash: HTTP client with cooperative
// cancellation, API configuration and error taxonomy.
//

pub mod cancel;
pub mod config;
pub mod errors;
pub mod http;
pub mod types;

pub use cancel::{create_cancellation_token, CancellationHandle};
pub use errors::ApiError;
pub use http::ApiClient;
pub use types::FetchOutcome;

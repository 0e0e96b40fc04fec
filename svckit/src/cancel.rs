// svckit/src/cancel.rs
//
// Cooperative cancellation handles for in-flight requests
//

use tokio_util::sync::CancellationToken;

/// A `{token, cancel}` pair created fresh for each request.
///
/// Clones share the same token, so the owner can keep one copy to cancel
/// while the request holds another. Cancelling after the request finished
/// is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    token: CancellationToken,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once `cancel()` has been called on any clone.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

pub fn create_cancellation_token() -> CancellationHandle {
    CancellationHandle::new()
}

//! Authentication hook for Identify.
//!
//! The feed never checks API keys itself. The server hands each client's
//! [`Identify`] to an [`Authenticator`] and only opens a session if it
//! returns `Ok`.

use std::future::Future;

use auctionfeed_protocol::Identify;

use crate::FeedError;

/// Decides whether an identified client may open a session.
///
/// # Example
///
/// ```rust
/// use auctionfeed::{Authenticator, FeedError};
/// use auctionfeed_protocol::Identify;
///
/// struct KeyList(Vec<String>);
///
/// impl Authenticator for KeyList {
///     async fn authenticate(&self, identify: &Identify) -> Result<(), FeedError> {
///         if self.0.contains(&identify.api_key) {
///             Ok(())
///         } else {
///             Err(FeedError::AuthFailed("unknown api key".into()))
///         }
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Returns `Err(FeedError::AuthFailed)` to refuse the client.
    fn authenticate(
        &self,
        identify: &Identify,
    ) -> impl Future<Output = Result<(), FeedError>> + Send;
}

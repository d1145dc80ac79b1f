//! Runs synchronous store calls off the async workers.

use std::sync::Arc;

use crate::MirageError;

/// Runs `f` against `store` on tokio's blocking pool.
///
/// The store traits are synchronous and may block on disk or a lock, so
/// connection tasks never call them directly.
pub(crate) async fn run_blocking<S, R, F>(store: &Arc<S>, f: F) -> Result<R, MirageError>
where
    S: ?Sized + Send + Sync + 'static,
    F: FnOnce(&S) -> R + Send + 'static,
    R: Send + 'static,
{
    let store = Arc::clone(store);
    Ok(tokio::task::spawn_blocking(move || f(&store)).await?)
}

//! Coalesced access-token refresh.
//!
//! At most one refresh exchange is in flight per client. It runs as its own
//! task, so it finishes even when every caller waiting on it goes away.
//! Callers arriving while one is running attach to the same shared future and
//! observe the same outcome. The task empties the slot when it settles.

use crate::domain::{RefreshRequest, RefreshResponse};
use crate::protocol::network::RefreshError;
use crate::store::TokenStore;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

type SharedRefresh = Shared<BoxFuture<'static, Result<String, RefreshError>>>;
type Slot = Arc<Mutex<Option<(u64, SharedRefresh)>>>;

#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    in_flight: Slot,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    /// Joins the running refresh, or spawns one from `start`.
    pub(crate) async fn refresh<F>(&self, start: F) -> Result<String, RefreshError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<String, RefreshError>>,
    {
        let future = {
            let mut slot = lock(&self.in_flight);
            match slot.as_ref() {
                Some((generation, future)) => {
                    debug!("Joining in-flight refresh {}", generation);
                    future.clone()
                }
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    debug!("Starting refresh {}", generation);
                    let task = start();
                    let in_flight = Arc::clone(&self.in_flight);
                    let handle = tokio::spawn(async move {
                        let result = task.await;
                        release(&in_flight, generation);
                        debug!("Refresh {} finished", generation);
                        result
                    });
                    let future = async move {
                        handle
                            .await
                            .unwrap_or_else(|e| Err(RefreshError::Aborted(e.to_string())))
                    }
                    .boxed()
                    .shared();
                    *slot = Some((generation, future.clone()));
                    future
                }
            }
        };

        future.await
    }

    /// Forgets the in-flight refresh so later callers start a new one.
    ///
    /// The old task keeps running; its session check keeps it from touching
    /// the store.
    pub(crate) fn reset(&self) {
        if let Some((generation, _)) = lock(&self.in_flight).take() {
            debug!("Detached refresh {}", generation);
        }
    }
}

fn lock(slot: &Slot) -> MutexGuard<'_, Option<(u64, SharedRefresh)>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn release(slot: &Slot, generation: u64) {
    let mut slot = lock(slot);
    if matches!(slot.as_ref(), Some((current, _)) if *current == generation) {
        *slot = None;
    }
}

/// Exchanges the stored refresh token for a new access token.
///
/// The result is only stored if the session it started in is still current.
/// Any failure after the request is issued clears that session.
pub(crate) async fn exchange_refresh_token(
    http: Client,
    tokens: TokenStore,
    url: Url,
    timeout: Duration,
) -> Result<String, RefreshError> {
    let session = tokens.session();
    let Some(refresh_token) = tokens.refresh_token() else {
        debug!("No refresh token, skipping refresh");
        return Err(RefreshError::NoRefreshToken);
    };

    let exchange = async {
        let response = http
            .post(url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected(status.as_u16()));
        }

        response
            .json::<RefreshResponse>()
            .await
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))
    };

    let outcome = tokio::time::timeout(timeout, exchange)
        .await
        .unwrap_or(Err(RefreshError::Timeout));

    match outcome {
        Ok(body) => {
            let stored = tokens.set_tokens_in_session(
                session,
                &body.access_token,
                body.refresh_token.as_deref(),
            );
            if !stored {
                warn!("Session {} ended during refresh, discarding new tokens", session);
                return Err(RefreshError::Superseded);
            }
            debug!("Refresh succeeded");
            Ok(body.access_token)
        }
        Err(e) => {
            if tokens.clear_in_session(session) {
                warn!("Refresh failed, clearing tokens: {}", e);
            } else {
                warn!("Refresh failed after session {} ended: {}", session, e);
            }
            Err(e)
        }
    }
}

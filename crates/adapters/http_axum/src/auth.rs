//! API-key gate for the protected routes.
//!
//! Clients send a plain key in the `x-api-key` header; the configuration only
//! stores bcrypt digests. Keys that verified once are remembered so the
//! (deliberately slow) bcrypt comparison runs once per key per process.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use garagedoor_app::ports::DoorAdapter;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Set of accepted API keys, stored as bcrypt digests.
#[derive(Debug, Default)]
pub struct ApiKeys {
    digests: Vec<String>,
    verified: RwLock<HashSet<String>>,
}

impl ApiKeys {
    /// Build the set from bcrypt digests.
    pub fn new<I, S>(digests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            digests: digests.into_iter().map(Into::into).collect(),
            verified: RwLock::default(),
        }
    }

    /// Number of configured digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Whether no digest is configured, in which case every key is refused.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Check `key` against the cache, then against every digest.
    ///
    /// The bcrypt comparison runs on the blocking pool.
    pub async fn check(self: &Arc<Self>, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        if self.is_cached(key) {
            return true;
        }

        let keys = Arc::clone(self);
        let key = key.to_owned();
        match tokio::task::spawn_blocking(move || keys.verify(key)).await {
            Ok(valid) => valid,
            Err(err) => {
                tracing::error!(error = %err, "API key verification task failed");
                false
            }
        }
    }

    fn is_cached(&self, key: &str) -> bool {
        self.verified
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    fn verify(&self, key: String) -> bool {
        let matched = self.digests.iter().any(|digest| {
            bcrypt::verify(&key, digest).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "unusable API key digest");
                false
            })
        });
        if matched {
            self.verified
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key);
        }
        matched
    }
}

/// Middleware refusing requests without a valid `x-api-key` header.
pub async fn require_api_key<A>(
    State(state): State<AppState<A>>,
    request: Request,
    next: Next,
) -> Response
where
    A: DoorAdapter + 'static,
{
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_default();

    if state.api_keys.check(&key).await {
        return next.run(request).await;
    }

    let forwarded_for = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");
    tracing::warn!(uri = %request.uri(), forwarded_for, "unauthorized request");
    ApiError::Unauthorized.into_response()
}

//! Cookie-keyed session store
//!
//! Each browser session owns one [`UploadSlotManager`] behind its own mutex, so
//! uploads and exports of one session serialize while other sessions proceed.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::slots::UploadSlotManager;
use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "cue_session";

/// Slot manager shared between the requests of one session
pub type SharedManager = Arc<Mutex<UploadSlotManager>>;

struct SessionEntry {
    manager: SharedManager,
    last_seen: Instant,
}

/// Session attached to a request by [`session_middleware`]
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub manager: SharedManager,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Look up a session, creating a fresh one when the id is absent or unknown
    ///
    /// Returns the handle and whether a new id was issued. Idle sessions are
    /// evicted on the way.
    pub async fn acquire(&self, requested: Option<Uuid>) -> (SessionHandle, bool) {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, "Evicted idle sessions");
        }

        if let Some(id) = requested {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (
                    SessionHandle {
                        id,
                        manager: entry.manager.clone(),
                    },
                    false,
                );
            }
        }

        let id = Uuid::new_v4();
        let manager = Arc::new(Mutex::new(UploadSlotManager::new()));
        sessions.insert(
            id,
            SessionEntry {
                manager: manager.clone(),
                last_seen: now,
            },
        );
        tracing::debug!(session_id = %id, "New upload session");

        (SessionHandle { id, manager }, true)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Session id from the `Cookie` header, if present and well-formed
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// Attach the caller's session to the request, issuing a cookie when needed
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let requested = session_id_from_headers(request.headers());
    let (handle, issued) = state.sessions.acquire(requested).await;
    let id = handle.id;
    request.extensions_mut().insert(handle);

    let mut response = next.run(request).await;

    if issued {
        match HeaderValue::from_str(&session_cookie(id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(session_id = %id, "Could not build session cookie: {}", e),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_id_gets_fresh_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let stale = Uuid::new_v4();

        let (handle, issued) = store.acquire(Some(stale)).await;

        assert!(issued);
        assert_ne!(handle.id, stale);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_known_id_reuses_manager() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (first, _) = store.acquire(None).await;

        let (second, issued) = store.acquire(Some(first.id)).await;

        assert!(!issued);
        assert!(Arc::ptr_eq(&first.manager, &second.manager));
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = SessionStore::new(Duration::from_millis(10));
        let (old, _) = store.acquire(None).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        let (fresh, issued) = store.acquire(Some(old.id)).await;

        assert!(issued);
        assert_ne!(fresh.id, old.id);
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );

        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_malformed_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("cue_session=not-a-uuid"));

        assert_eq!(session_id_from_headers(&headers), None);
    }
}

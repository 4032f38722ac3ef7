//! Identity management — durable visitor identity and the renewable
//! inactivity-bounded session.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::engagement::EngagementState;
use crate::runtime::RuntimeEnv;

/// Durable storage key holding the visitor id.
pub const VISITOR_ID_KEY: &str = "efh_visitor_id";
/// Tab-scoped storage key holding the session blob.
pub const SESSION_KEY: &str = "efh_session";
/// Inactivity gap after which a session expires.
pub const SESSION_TIMEOUT_MINUTES: i64 = 30;

/// The session blob persisted in tab-scoped storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: String,
    pub last_activity: DateTime<Utc>,
}

/// Read the durable visitor id, minting and persisting one on first use.
///
/// Returns an empty placeholder when no durable storage exists; callers
/// tolerate the empty id rather than failing.
pub fn visitor_id(env: &dyn RuntimeEnv) -> String {
    let Some(storage) = env.durable_storage() else {
        return String::new();
    };
    if let Some(id) = storage.get(VISITOR_ID_KEY) {
        return id;
    }
    let id = Uuid::new_v4().to_string();
    storage.set(VISITOR_ID_KEY, &id);
    debug!(visitor_id = %id, "visitor id minted");
    id
}

/// Read the current session id, renewing or replacing the stored session.
///
/// Within the inactivity threshold the stored id is kept and its
/// `last_activity` refreshed. Otherwise a new session is minted and the
/// in-memory engagement state is reset — the sole reset point, so bounce
/// accounting stays correct across session boundaries.
pub fn session_id(
    env: &dyn RuntimeEnv,
    timeout: Duration,
    engagement: &mut EngagementState,
) -> String {
    let Some(storage) = env.tab_storage() else {
        return String::new();
    };
    let now = env.now();

    if let Some(raw) = storage.get(SESSION_KEY) {
        if let Ok(mut stored) = serde_json::from_str::<StoredSession>(&raw) {
            if now - stored.last_activity < timeout {
                stored.last_activity = now;
                persist(storage, &stored);
                return stored.id;
            }
        }
    }

    // Expired, absent, or unparseable: mint a new session
    let stored = StoredSession {
        id: Uuid::new_v4().to_string(),
        last_activity: now,
    };
    engagement.reset(now);
    persist(storage, &stored);
    debug!(session_id = %stored.id, "session minted");
    stored.id
}

fn persist(storage: &dyn crate::runtime::StorageArea, stored: &StoredSession) {
    if let Ok(json) = serde_json::to_string(stored) {
        storage.set(SESSION_KEY, &json);
    }
}

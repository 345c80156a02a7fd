use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{info, warn};
use tokio::time::Instant;
use uuid::Uuid;

// Session configuration
pub const SESSION_TIMEOUT_SECS: u64 = 1800; // 30 minutes idle
pub const MAX_SESSIONS: usize = 1000;

/// The dashboard's user table. In-memory by design: a collaborator, not a
/// user store.
fn default_users() -> HashMap<String, String> {
    HashMap::from([
        ("turki".to_string(), "123456".to_string()),
        ("admin".to_string(), "admin123".to_string()),
    ])
}

#[derive(Debug, Clone)]
struct SessionInfo {
    username: String,
    last_seen: Instant,
}

impl SessionInfo {
    fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            last_seen: Instant::now(),
        }
    }

    fn is_stale(&self, timeout: Duration) -> bool {
        Instant::now().duration_since(self.last_seen) > timeout
    }
}

/// Cookie-session manager: login issues an opaque UUID token, validation
/// refreshes the idle clock, a periodic task reaps stale entries.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<HashMap<String, String>>,
    active_sessions: Arc<Mutex<HashMap<String, SessionInfo>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_users(default_users())
    }

    pub fn with_users(users: HashMap<String, String>) -> Self {
        Self {
            users: Arc::new(users),
            active_sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<String, String> {
        match self.users.get(username) {
            Some(expected) if expected == password => {
                let mut sessions = self
                    .active_sessions
                    .lock()
                    .map_err(|_| "Session lock poisoned".to_string())?;

                if sessions.len() >= MAX_SESSIONS {
                    return Err("Maximum sessions reached".to_string());
                }

                let token = Uuid::new_v4().to_string();
                sessions.insert(token.clone(), SessionInfo::new(username));
                info!("User {} logged in", username);
                Ok(token)
            }
            _ => {
                warn!("Failed login attempt for user {}", username);
                Err("خطأ في البيانات".to_string())
            }
        }
    }

    /// Username behind a token, refreshing its idle clock. None for
    /// unknown or expired tokens.
    pub fn validate(&self, token: &str) -> Option<String> {
        let mut sessions = self.active_sessions.lock().ok()?;
        let info = sessions.get_mut(token)?;
        info.last_seen = Instant::now();
        Some(info.username.clone())
    }

    pub fn logout(&self, token: &str) {
        if let Ok(mut sessions) = self.active_sessions.lock() {
            if let Some(info) = sessions.remove(token) {
                info!("User {} logged out", info.username);
            }
        }
    }

    pub fn cleanup_stale_sessions(&self) -> usize {
        let mut sessions = match self.active_sessions.lock() {
            Ok(sessions) => sessions,
            Err(_) => return 0,
        };

        let timeout = Duration::from_secs(SESSION_TIMEOUT_SECS);
        let initial_count = sessions.len();
        sessions.retain(|_, info| !info.is_stale(timeout));

        let cleaned_count = initial_count - sessions.len();
        if cleaned_count > 0 {
            warn!("Cleaned up {} stale sessions", cleaned_count);
        }
        cleaned_count
    }

    pub fn session_count(&self) -> usize {
        self.active_sessions
            .lock()
            .map(|sessions| sessions.len())
            .unwrap_or(0)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

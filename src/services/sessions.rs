use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, NaiveDateTime};

use crate::models::Session;

const MAX_MESSAGES_PER_SESSION: usize = 50;

/// In-memory session store. One active conversation owns its session; there
/// are no concurrent writers and nothing survives the process.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout_minutes: i64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout: Duration::minutes(timeout_minutes),
        }
    }

    /// Clone the session out for processing; callers mutate the copy and hand
    /// it back via `save`. Expired sessions are replaced with a fresh one.
    pub fn get_or_create(&self, id: &str, now: NaiveDateTime) -> Session {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(id) {
            Some(existing) if now - existing.last_activity <= self.timeout => existing.clone(),
            _ => {
                let session = Session::new(id, now);
                sessions.insert(id.to_string(), session.clone());
                session
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(id).cloned()
    }

    pub fn save(&self, mut session: Session, now: NaiveDateTime) {
        session.last_activity = now;
        if session.messages.len() > MAX_MESSAGES_PER_SESSION {
            let excess = session.messages.len() - MAX_MESSAGES_PER_SESSION;
            session.messages.drain(..excess);
        }
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    pub fn cleanup_expired(&self, now: NaiveDateTime) {
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, s| now - s.last_activity <= self.timeout);
    }

    pub fn count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

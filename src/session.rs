use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "admin_session";
pub const SESSION_DAYS: i64 = 7;

/// Admin sessions kept in memory. A restart logs everybody out.
pub struct Sessions {
    password: Option<String>,
    tokens: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl Sessions {
    /// Without a password every login fails.
    pub fn new(password: Option<String>) -> Sessions {
        Sessions {
            password,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.password.is_some()
    }

    /// New 64 hex character token when `password` matches.
    pub fn login(&self, password: &str) -> Option<String> {
        let expected = self.password.as_deref()?;
        if !constant_time_eq(expected.as_bytes(), password.as_bytes()) {
            return None;
        }

        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let expires = Utc::now() + Duration::days(SESSION_DAYS);

        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();
        tokens.retain(|_, exp| *exp > now);
        tokens.insert(token.clone(), expires);
        Some(token)
    }

    pub fn logout(&self, token: &str) {
        self.tokens.write().unwrap_or_else(|e| e.into_inner()).remove(token);
    }

    pub fn is_valid(&self, token: &str) -> bool {
        if token.len() != 64 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        matches!(tokens.get(token), Some(exp) if *exp > Utc::now())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

//! Registration, login and the persisted session marker.

use uuid::Uuid;

use crate::core::storage::{read_json, write_json, KeyValueStore};
use crate::core::user::{hash_password, User};
use crate::{AgroError, Result};

/// The identity a store operation runs on behalf of.
///
/// Record and history operations take a `Session` explicitly instead of
/// reading global state. An anonymous session sees no records and cannot
/// write any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn for_user(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Stores every registered [`User`] and tracks which one is signed in.
pub struct AuthStore {
    session_key: String,
    users_key: String,
}

impl AuthStore {
    /// Creates a store using `{key_prefix}_auth` and `{key_prefix}_users`.
    pub fn new(key_prefix: &str) -> Self {
        Self {
            session_key: format!("{key_prefix}_auth"),
            users_key: format!("{key_prefix}_users"),
        }
    }

    /// Returns every registered user; absent or corrupt data reads as none.
    pub fn users(&self, kv: &dyn KeyValueStore) -> Result<Vec<User>> {
        Ok(read_json(kv, &self.users_key)?.unwrap_or_default())
    }

    /// Inserts `user`, or replaces the stored user with the same id.
    pub fn save_user(&self, kv: &dyn KeyValueStore, user: &User) -> Result<()> {
        let mut users = self.users(kv)?;
        match users.iter().position(|u| u.id == user.id) {
            Some(index) => users[index] = user.clone(),
            None => users.push(user.clone()),
        }
        write_json(kv, &self.users_key, &users)
    }

    /// Creates an account and signs it in.
    ///
    /// Emails are compared case-insensitively after trimming; the address is
    /// stored as typed, minus surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`AgroError::EmailAlreadyRegistered`] if any user already has
    /// this email. The users collection is left untouched in that case.
    pub fn register(
        &self,
        kv: &dyn KeyValueStore,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        if self.users(kv)?.iter().any(|u| u.has_email(email)) {
            log::info!("registration refused: email already registered");
            return Err(AgroError::EmailAlreadyRegistered);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.trim().to_string(),
            password_hash: hash_password(password),
        };
        self.save_user(kv, &user)?;
        self.set_current_user(kv, &user)?;

        log::info!("registered user {}", user.id);
        Ok(user)
    }

    /// Signs in the user whose email and password both match.
    ///
    /// # Errors
    ///
    /// Returns [`AgroError::InvalidCredentials`] on any mismatch; the current
    /// session is left as it was.
    pub fn login(&self, kv: &dyn KeyValueStore, email: &str, password: &str) -> Result<User> {
        let user = self
            .users(kv)?
            .into_iter()
            .find(|u| u.has_email(email) && u.password_matches(password))
            .ok_or(AgroError::InvalidCredentials)?;

        self.set_current_user(kv, &user)?;
        log::info!("user {} signed in", user.id);
        Ok(user)
    }

    /// Clears the session marker. Calling it while signed out is harmless.
    pub fn logout(&self, kv: &dyn KeyValueStore) -> Result<()> {
        kv.remove(&self.session_key)
    }

    /// Returns the signed-in user, or `None` if there is none or the marker is unreadable.
    pub fn current_user(&self, kv: &dyn KeyValueStore) -> Result<Option<User>> {
        read_json(kv, &self.session_key)
    }

    pub fn is_authenticated(&self, kv: &dyn KeyValueStore) -> Result<bool> {
        Ok(self.current_user(kv)?.is_some())
    }

    /// Builds a [`Session`] from the persisted marker.
    pub fn current_session(&self, kv: &dyn KeyValueStore) -> Result<Session> {
        Ok(self
            .current_user(kv)?
            .map_or_else(Session::anonymous, Session::for_user))
    }

    fn set_current_user(&self, kv: &dyn KeyValueStore, user: &User) -> Result<()> {
        write_json(kv, &self.session_key, user)
    }
}

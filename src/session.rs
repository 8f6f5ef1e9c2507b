use secrecy::{ExposeSecret, Secret};

/// Environment variable the vault client reads the session token from.
pub const SESSION_ENV_VAR: &str = "BW_SESSION";

/// In-memory holder for the single active session token.
///
/// The token is wrapped so accidental `Debug` formatting never reveals it.
/// One slot only: a second `set` replaces the previous token (last write
/// wins), matching the single-session-per-process model.
#[derive(Default)]
pub struct SessionStore {
    token: Option<Secret<String>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session token, replacing any previous one.
    pub fn set(&mut self, token: String) {
        self.token = Some(Secret::new(token));
    }

    /// Drops the stored token.
    pub fn clear(&mut self) {
        self.token = None;
    }

    /// Returns `true` when a token is held.
    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }

    /// Exposes the token to a closure without handing out ownership.
    pub fn expose<F, R>(&self, function: F) -> Option<R>
    where
        F: FnOnce(&str) -> R,
    {
        self.token
            .as_ref()
            .map(|token| function(token.expose_secret()))
    }

    /// Builds the environment overlay for session-scoped commands.
    ///
    /// Empty when no session is held, so unauthenticated calls inherit a
    /// clean environment.
    pub fn overlay(&self) -> Vec<(String, String)> {
        match &self.token {
            Some(token) => vec![(SESSION_ENV_VAR.to_owned(), token.expose_secret().clone())],
            None => Vec::new(),
        }
    }
}

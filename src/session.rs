//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owned by `RecipeClient`. The in-memory token is authoritative; the store
//! is a mirror written on every transition so a later run can restore it.
//! Storage failures are logged and otherwise ignored.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::storage::TokenStore;

/// Number of token characters shown in the token display.
pub const TOKEN_DISPLAY_CHARS: usize = 30;

/// User-triggerable actions, gated by the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Register,
    Logout,
    CreateRecipe,
    ListRecipes,
    UpdateRecipe,
    WhoAmI,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Login,
        Action::Register,
        Action::Logout,
        Action::CreateRecipe,
        Action::ListRecipes,
        Action::UpdateRecipe,
        Action::WhoAmI,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::Register => "register",
            Action::Logout => "logout",
            Action::CreateRecipe => "create",
            Action::ListRecipes => "list",
            Action::UpdateRecipe => "update",
            Action::WhoAmI => "whoami",
        }
    }

    /// Whether the action needs an active token.
    #[must_use]
    pub fn requires_session(self) -> bool {
        !matches!(self, Action::Login | Action::Register)
    }
}

/// What a front end shows for the session: the token line and which actions are enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub logged_in: bool,
    pub token_display: String,
}

impl SessionView {
    #[must_use]
    pub fn is_enabled(&self, action: Action) -> bool {
        self.logged_in || !action.requires_session()
    }

    #[must_use]
    pub fn enabled_actions(&self) -> Vec<Action> {
        Action::ALL.into_iter().filter(|a| self.is_enabled(*a)).collect()
    }
}

/// The active bearer token, mirrored into a [`TokenStore`].
#[derive(Debug)]
pub struct Session<S> {
    token: Option<String>,
    store: S,
}

impl<S: TokenStore> Session<S> {
    /// A logged-out session over `store`. Nothing is read until [`Session::restore`].
    pub fn new(store: S) -> Self {
        Self { token: None, store }
    }

    /// Adopt the persisted token if there is one, otherwise clear.
    ///
    /// Returns `true` when a stored token was restored.
    pub fn restore(&mut self) -> bool {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored token");
                None
            }
        };
        if let Some(token) = stored {
            self.set(&token);
            true
        } else {
            self.clear();
            false
        }
    }

    /// Adopt `token` as the active credential and persist it.
    pub fn set(&mut self, token: &str) {
        self.token = Some(token.to_owned());
        if let Err(e) = self.store.save(token) {
            tracing::warn!(error = %e, "failed to persist token");
        }
    }

    /// Drop the active token and remove it from storage.
    pub fn clear(&mut self) {
        self.token = None;
        if let Err(e) = self.store.remove() {
            tracing::warn!(error = %e, "failed to remove stored token");
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            logged_in: self.is_active(),
            token_display: token_display(self.token()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// `JWT Token: <first 30 chars>...` or `JWT Token: (Not logged in)`.
#[must_use]
pub fn token_display(token: Option<&str>) -> String {
    match token {
        Some(token) => {
            let prefix: String = token.chars().take(TOKEN_DISPLAY_CHARS).collect();
            format!("JWT Token: {prefix}...")
        }
        None => "JWT Token: (Not logged in)".to_owned(),
    }
}

//! Session & recipe client.
//!
//! DESIGN
//! ======
//! `RecipeClient` owns the [`Session`] and a [`RecipeBackend`]. Every
//! operation takes `&mut self`, so a single client has at most one request in
//! flight and the token has exactly one writer. Each operation makes at most
//! one backend call and never retries.
//!
//! ERROR HANDLING
//! ==============
//! Failures are returned as [`ClientError`], whose `Display` is the status
//! line a front end shows. A 401 from any authenticated call clears the
//! session before the error is returned; a failed login always clears it.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use crate::net::api::RecipeBackend;
use crate::net::types::{ApiError, CreatedRecipe, NewRecipe, Recipe, RecipeUpdate, ResourceId, Service};
use crate::session::{Session, SessionView};
use crate::storage::TokenStore;

/// Fixed status lines shown by front ends.
pub mod status {
    pub const RESTORED: &str = "Logged in with stored token.";
    pub const LOGGING_IN: &str = "Logging in...";
    pub const LOGIN_SUCCESS: &str = "Login successful!";
    pub const LOGGED_OUT: &str = "Logged out.";
    pub const REGISTERING: &str = "Registering...";
    pub const REGISTER_SUCCESS: &str = "Registration successful!";
    pub const CREATING_RECIPE: &str = "Creating recipe...";
    pub const FETCHING: &str = "Fetching...";
    pub const NO_RECIPES: &str = "No recipes found.";
    pub const UPDATING_RECIPE: &str = "Updating recipe...";
    pub const UPDATE_SUCCESS: &str = "Recipe updated.";
}

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any request was made.
    Validation,
    /// The service answered with a non-success status or an unusable body.
    Server,
    /// The request never completed.
    Connectivity,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Error: Please log in first.")]
    NotLoggedIn,

    #[error("Error: {0} is required.")]
    MissingInput(&'static str),

    #[error("Error: Could not reach {0}.")]
    Unreachable(Service),

    #[error("Error: Unexpected response from {0}.")]
    UnexpectedResponse(Service),

    #[error("Error: Unauthorized (Token Expired or Invalid). Please log in again.")]
    Unauthorized,

    #[error("Login failed: {}", .0.as_deref().unwrap_or("Check credentials"))]
    LoginRejected(Option<String>),

    #[error("Registration failed: {}", .0.as_deref().unwrap_or("Try a different username"))]
    RegisterRejected(Option<String>),

    #[error("Error creating recipe: {}", .0.as_deref().unwrap_or("Check server logs"))]
    CreateRejected(Option<String>),

    #[error("Error: {}", .0.as_deref().unwrap_or("Failed to fetch recipes."))]
    ListRejected(Option<String>),

    #[error("Error updating recipe: {}", .0.as_deref().unwrap_or("Check server logs"))]
    UpdateRejected(Option<String>),

    #[error("Error verifying token: {}", .0.as_deref().unwrap_or("Token rejected"))]
    VerifyRejected(Option<String>),

    #[error("Error: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotLoggedIn | Self::MissingInput(_) | Self::InvalidRequest(_) => {
                ErrorKind::Validation
            }
            Self::Unreachable(_) => ErrorKind::Connectivity,
            Self::UnexpectedResponse(_)
            | Self::Unauthorized
            | Self::LoginRejected(_)
            | Self::RegisterRejected(_)
            | Self::CreateRejected(_)
            | Self::ListRejected(_)
            | Self::UpdateRejected(_)
            | Self::VerifyRejected(_) => ErrorKind::Server,
        }
    }

    /// Map a backend failure, using `rejected` for non-2xx responses.
    fn from_api(err: ApiError, rejected: fn(Option<String>) -> ClientError) -> Self {
        match err {
            ApiError::Status { status: 401, .. } => Self::Unauthorized,
            ApiError::Status { message, .. } => rejected(message),
            ApiError::Unreachable { service, .. } => Self::Unreachable(service),
            ApiError::Decode { service, .. } => Self::UnexpectedResponse(service),
            ApiError::InvalidRequest(detail) | ApiError::HttpClientBuild(detail) => {
                Self::InvalidRequest(detail)
            }
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct RecipeClient<B, S> {
    backend: B,
    session: Session<S>,
}

impl<B: RecipeBackend, S: TokenStore> RecipeClient<B, S> {
    /// A logged-out client. Call [`RecipeClient::initialize`] to restore a stored token.
    pub fn new(backend: B, store: S) -> Self {
        Self { backend, session: Session::new(store) }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    /// Restore the persisted token, if any. Makes no network call.
    ///
    /// Returns `true` when a stored token was adopted; the front end then
    /// shows [`status::RESTORED`].
    pub fn initialize(&mut self) -> bool {
        let restored = self.session.restore();
        tracing::info!(restored, "session initialized");
        restored
    }

    /// Drop the active token locally.
    pub fn logout(&mut self) {
        self.session.clear();
        tracing::info!("logged out");
    }

    /// Log in and adopt the returned token.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank credentials (session untouched).
    /// Any other failure clears the session.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        if username.is_empty() {
            return Err(ClientError::MissingInput("Username"));
        }
        if password.is_empty() {
            return Err(ClientError::MissingInput("Password"));
        }

        let result = match self.backend.login(username, password).await {
            Ok(body) if !body.token.trim().is_empty() => Ok(body.token),
            Ok(_) => Err(ClientError::UnexpectedResponse(Service::User)),
            Err(ApiError::Status { message, .. }) => Err(ClientError::LoginRejected(message)),
            Err(e) => Err(ClientError::from_api(e, ClientError::LoginRejected)),
        };

        match result {
            Ok(token) => {
                self.session.set(&token);
                tracing::info!(username, "login succeeded");
                Ok(())
            }
            Err(e) => {
                self.session.clear();
                tracing::warn!(username, error = %e, "login failed");
                Err(e)
            }
        }
    }

    /// Create an account. The session is never touched.
    ///
    /// Returns the service's confirmation message, if it sent one.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank credentials, otherwise the
    /// rejection or connectivity failure.
    pub async fn register(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, ClientError> {
        if username.is_empty() {
            return Err(ClientError::MissingInput("Username"));
        }
        if password.is_empty() {
            return Err(ClientError::MissingInput("Password"));
        }

        match self.backend.register(username, password).await {
            Ok(body) => {
                tracing::info!(username, "registration succeeded");
                Ok(body.message)
            }
            Err(ApiError::Status { message, .. }) => {
                let err = ClientError::RegisterRejected(message);
                tracing::warn!(username, error = %err, "registration rejected");
                Err(err)
            }
            Err(e) => Err(ClientError::from_api(e, ClientError::RegisterRejected)),
        }
    }

    /// Ask the user service which user the active token belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotLoggedIn`] without a session; a 401 clears it.
    pub async fn whoami(&mut self) -> Result<ResourceId, ClientError> {
        let token = self.require_token()?;
        let result = self.backend.verify(&token).await;
        let body = self.authenticated(result, ClientError::VerifyRejected)?;
        Ok(body.user_id)
    }

    /// Upload a recipe with an optional image.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotLoggedIn`] without a session and a
    /// validation error for a blank title, both without a network call.
    /// A 401 clears the session.
    pub async fn create_recipe(&mut self, recipe: NewRecipe) -> Result<CreatedRecipe, ClientError> {
        let token = self.require_token()?;
        if recipe.title.trim().is_empty() {
            return Err(ClientError::MissingInput("Title"));
        }

        let result = self.backend.create_recipe(&token, &recipe).await;
        let created = self.authenticated(result, ClientError::CreateRejected)?;
        tracing::info!(id = %created.id, "recipe created");
        Ok(created)
    }

    /// Fetch all recipes in service order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotLoggedIn`] without a session; a 401 clears it.
    pub async fn list_recipes(&mut self) -> Result<Vec<Recipe>, ClientError> {
        let token = self.require_token()?;
        let result = self.backend.list_recipes(&token).await;
        let recipes = self.authenticated(result, ClientError::ListRejected)?;
        tracing::info!(count = recipes.len(), "recipes fetched");
        Ok(recipes)
    }

    /// Set the given fields on an existing recipe.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotLoggedIn`] without a session and a
    /// validation error for a blank id or an empty update. A 401 clears the
    /// session.
    pub async fn update_recipe(
        &mut self,
        recipe_id: &str,
        update: &RecipeUpdate,
    ) -> Result<(), ClientError> {
        let token = self.require_token()?;
        if recipe_id.trim().is_empty() {
            return Err(ClientError::MissingInput("Recipe ID"));
        }
        if update.is_empty() {
            return Err(ClientError::MissingInput("At least one field"));
        }

        let result = self.backend.update_recipe(&token, recipe_id, update).await;
        self.authenticated(result, ClientError::UpdateRejected)?;
        tracing::info!(recipe_id, "recipe updated");
        Ok(())
    }

    fn require_token(&self) -> Result<String, ClientError> {
        self.session
            .token()
            .map(ToOwned::to_owned)
            .ok_or(ClientError::NotLoggedIn)
    }

    /// Finish an authenticated call: a 401 ends the session.
    fn authenticated<T>(
        &mut self,
        result: Result<T, ApiError>,
        rejected: fn(Option<String>) -> ClientError,
    ) -> Result<T, ClientError> {
        result.map_err(|e| {
            if e.is_unauthorized() {
                self.session.clear();
            }
            let err = ClientError::from_api(e, rejected);
            tracing::warn!(error = %err, "authenticated request failed");
            err
        })
    }
}

// =============================================================================
// RENDERING
// =============================================================================

/// `Recipe created! ID: <id>. Image saved to: <image_url | None>`.
#[must_use]
pub fn created_status(created: &CreatedRecipe) -> String {
    format!(
        "Recipe created! ID: {}. Image saved to: {}",
        created.id,
        created.image_url.as_deref().unwrap_or("None")
    )
}

/// `<title> (Image URL: <image_url | None>)`.
#[must_use]
pub fn recipe_line(recipe: &Recipe) -> String {
    format!(
        "{} (Image URL: {})",
        recipe.title,
        recipe.image_url.as_deref().unwrap_or("None")
    )
}

/// Lines for the recipe list area: one per recipe in order, a single
/// "no recipes" line for an empty list, or a single inline error line.
#[must_use]
pub fn recipe_lines(result: &Result<Vec<Recipe>, ClientError>) -> Vec<String> {
    match result {
        Ok(recipes) if recipes.is_empty() => vec![status::NO_RECIPES.to_owned()],
        Ok(recipes) => recipes.iter().map(recipe_line).collect(),
        Err(e) => vec![e.to_string()],
    }
}

/// `Token valid for user <user_id>.`
#[must_use]
pub fn whoami_status(user_id: &ResourceId) -> String {
    format!("Token valid for user {user_id}.")
}

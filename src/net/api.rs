//! REST API access to the user and catalog services.
//!
//! DESIGN
//! ======
//! `RecipeBackend` is the seam between the session client and the network.
//! `HttpBackend` implements it with `reqwest`; tests substitute an in-memory
//! backend. Every method makes exactly one request and never retries.
//!
//! ERROR HANDLING
//! ==============
//! Send failures become [`ApiError::Unreachable`], non-2xx responses become
//! [`ApiError::Status`] carrying the body's `message` when there is one, and
//! 2xx bodies of the wrong shape become [`ApiError::Decode`]. Deciding what a
//! status means for the session is left to the caller.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::de::DeserializeOwned;

use super::types::{
    ApiError, CreatedRecipe, Credentials, MessageBody, NewRecipe, Recipe, RecipeUpdate, Service,
    TokenResponse, VerifyResponse, error_message,
};
use crate::config::ClientConfig;

// =============================================================================
// BACKEND SEAM
// =============================================================================

/// One method per remote endpoint the client uses.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait RecipeBackend {
    /// `POST /users/login`.
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError>;

    /// `POST /users/register`.
    async fn register(&self, username: &str, password: &str) -> Result<MessageBody, ApiError>;

    /// `GET /users/verify` with the bearer token.
    async fn verify(&self, token: &str) -> Result<VerifyResponse, ApiError>;

    /// Multipart `POST /recipes` with the bearer token.
    async fn create_recipe(&self, token: &str, recipe: &NewRecipe) -> Result<CreatedRecipe, ApiError>;

    /// `GET /recipes` with the bearer token.
    async fn list_recipes(&self, token: &str) -> Result<Vec<Recipe>, ApiError>;

    /// `PUT /recipes/{id}` with the bearer token.
    async fn update_recipe(
        &self,
        token: &str,
        recipe_id: &str,
        update: &RecipeUpdate,
    ) -> Result<(), ApiError>;
}

// =============================================================================
// ENDPOINTS
// =============================================================================

fn login_endpoint(user_base: &str) -> String {
    format!("{user_base}/users/login")
}

fn register_endpoint(user_base: &str) -> String {
    format!("{user_base}/users/register")
}

fn verify_endpoint(user_base: &str) -> String {
    format!("{user_base}/users/verify")
}

fn recipes_endpoint(catalog_base: &str) -> String {
    format!("{catalog_base}/recipes")
}

/// `recipe_id` is percent-encoded as a single path segment.
fn recipe_endpoint(catalog_base: &str, recipe_id: &str) -> Result<reqwest::Url, ApiError> {
    let invalid = || ApiError::InvalidRequest(format!("invalid catalog URL: {catalog_base}"));
    let mut url = reqwest::Url::parse(catalog_base).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|()| invalid())?
        .pop_if_empty()
        .extend(["recipes", recipe_id]);
    Ok(url)
}

// =============================================================================
// HTTP BACKEND
// =============================================================================

/// `reqwest`-backed implementation talking to the real services.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    user_base: String,
    catalog_base: String,
}

impl HttpBackend {
    /// Build a backend for the configured services.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        #[allow(unused_mut)]
        let mut builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(timeout) = config.request_timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(timeout) = config.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            user_base: config.user_service_url.clone(),
            catalog_base: config.catalog_service_url.clone(),
        })
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl RecipeBackend for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let url = login_endpoint(&self.user_base);
        tracing::debug!(%url, "login request");
        let request = self.http.post(url).json(&Credentials { username, password });
        send_json(Service::User, request).await
    }

    async fn register(&self, username: &str, password: &str) -> Result<MessageBody, ApiError> {
        let url = register_endpoint(&self.user_base);
        tracing::debug!(%url, "register request");
        let request = self.http.post(url).json(&Credentials { username, password });
        let response = send(Service::User, request).await?;
        Ok(response.json::<MessageBody>().await.unwrap_or_default())
    }

    async fn verify(&self, token: &str) -> Result<VerifyResponse, ApiError> {
        let url = verify_endpoint(&self.user_base);
        tracing::debug!(%url, "verify request");
        let request = self.http.get(url).bearer_auth(token);
        send_json(Service::User, request).await
    }

    async fn create_recipe(&self, token: &str, recipe: &NewRecipe) -> Result<CreatedRecipe, ApiError> {
        let url = recipes_endpoint(&self.catalog_base);
        tracing::debug!(%url, has_image = recipe.image.is_some(), "create recipe request");
        let form = recipe_form(recipe)?;
        let request = self.http.post(url).bearer_auth(token).multipart(form);
        send_json(Service::Catalog, request).await
    }

    async fn list_recipes(&self, token: &str) -> Result<Vec<Recipe>, ApiError> {
        let url = recipes_endpoint(&self.catalog_base);
        tracing::debug!(%url, "list recipes request");
        let request = self.http.get(url).bearer_auth(token);
        send_json(Service::Catalog, request).await
    }

    async fn update_recipe(
        &self,
        token: &str,
        recipe_id: &str,
        update: &RecipeUpdate,
    ) -> Result<(), ApiError> {
        let url = recipe_endpoint(&self.catalog_base, recipe_id)?;
        tracing::debug!(%url, "update recipe request");
        let request = self.http.put(url).bearer_auth(token).json(update);
        send(Service::Catalog, request).await?;
        Ok(())
    }
}

async fn send(
    service: Service,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Unreachable { service, detail: e.to_string() })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { service, status: status.as_u16(), message: error_message(&body) })
}

async fn send_json<T: DeserializeOwned>(
    service: Service,
    request: reqwest::RequestBuilder,
) -> Result<T, ApiError> {
    send(service, request)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode { service, detail: e.to_string() })
}

/// Build the multipart body: `title`, `instructions`, and `image` when attached.
fn recipe_form(recipe: &NewRecipe) -> Result<reqwest::multipart::Form, ApiError> {
    let mut form = reqwest::multipart::Form::new()
        .text("title", recipe.title.clone())
        .text("instructions", recipe.instructions.clone());
    if let Some(image) = &recipe.image {
        let mut part =
            reqwest::multipart::Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        if let Some(mime) = &image.mime {
            part = part
                .mime_str(mime)
                .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        }
        form = form.part("image", part);
    }
    Ok(form)
}

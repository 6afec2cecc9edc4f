//! Wire DTOs for the user and catalog services.
//!
//! DESIGN
//! ======
//! Response types are lenient where the services are: optional fields
//! default to `None`, and identifiers are accepted as either JSON strings
//! or numbers so display code never has to care which one a service sent.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// SERVICES & ERRORS
// =============================================================================

/// The two external services the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    User,
    Catalog,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("User Service"),
            Self::Catalog => f.write_str("Catalog Service"),
        }
    }
}

/// Transport-level failure from a backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request could not be completed (connection refused, DNS, timeout).
    #[error("could not reach {service}: {detail}")]
    Unreachable { service: Service, detail: String },

    /// The service answered with a non-success status.
    #[error("{service} responded with status {status}")]
    Status { service: Service, status: u16, message: Option<String> },

    /// A success response whose body did not match the expected shape.
    #[error("unexpected response from {service}: {detail}")]
    Decode { service: Service, detail: String },

    /// The request itself could not be built (bad header value, bad MIME type).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status for [`ApiError::Status`], `None` for everything else.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// JSON body for `POST /users/login` and `POST /users/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Binary attachment sent as the `image` part of a recipe upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// MIME type for the part; the HTTP client default is used when absent.
    pub mime: Option<String>,
}

/// Fields of a recipe to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub instructions: String,
    pub image: Option<ImageUpload>,
}

/// JSON body for `PUT /recipes/{id}`. Only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl RecipeUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.instructions.is_none()
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Identifier rendered verbatim, whether the service sent a string or a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId(pub String);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(Self(s)),
            serde_json::Value::Number(n) => Ok(Self(n.to_string())),
            _ => Err(D::Error::custom("expected string or number id")),
        }
    }
}

/// Success body of `POST /users/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Success body of `GET /users/verify`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub user_id: ResourceId,
}

/// Error (and some success) bodies: `{"message": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Success body of `POST /recipes`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedRecipe {
    pub id: ResourceId,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A recipe as listed by `GET /recipes`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Pull the `message` field out of an error body, if the body is JSON and has one.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

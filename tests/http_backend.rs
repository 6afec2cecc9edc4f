//! Wire-format checks for `HttpBackend` against in-process fake services.

use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use recipebox::client::{self, ClientError};
use recipebox::net::types::{ImageUpload, NewRecipe, RecipeUpdate};
use recipebox::{ClientConfig, HttpBackend, MemoryTokenStore, RecipeClient};
use serde_json::{Value, json};

const GOOD_TOKEN: &str = "tok-ana";

#[derive(Debug, Clone)]
struct SeenPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct Seen {
    login_bodies: Vec<Value>,
    recipe_parts: Vec<SeenPart>,
    update_bodies: Vec<(String, Value)>,
}

type Shared = Arc<Mutex<Seen>>;
type Reply = (StatusCode, Json<Value>);

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn unauthorized() -> Reply {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Token is invalid or expired!" })))
}

// =============================================================================
// FAKE USER SERVICE
// =============================================================================

async fn login(State(seen): State<Shared>, Json(body): Json<Value>) -> Reply {
    seen.lock().unwrap().login_bodies.push(body.clone());
    if body["username"] == "ana" && body["password"] == "pw" {
        (StatusCode::OK, Json(json!({ "token": GOOD_TOKEN })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" })))
    }
}

async fn register(Json(body): Json<Value>) -> Reply {
    if body["username"] == "taken" {
        return (StatusCode::CONFLICT, Json(json!({ "message": "User already exists" })));
    }
    (StatusCode::CREATED, Json(json!({ "message": "User registered successfully" })))
}

async fn verify(headers: HeaderMap) -> Reply {
    if bearer(&headers) != Some(GOOD_TOKEN) {
        return unauthorized();
    }
    (StatusCode::OK, Json(json!({ "user_id": 1 })))
}

// =============================================================================
// FAKE CATALOG SERVICE
// =============================================================================

async fn create_recipe(
    State(seen): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Reply {
    if bearer(&headers) != Some(GOOD_TOKEN) {
        return unauthorized();
    }
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        parts.push(SeenPart {
            name: field.name().unwrap_or_default().to_owned(),
            file_name: field.file_name().map(ToOwned::to_owned),
            content_type: field.content_type().map(ToOwned::to_owned),
            bytes: field.bytes().await.unwrap().to_vec(),
        });
    }
    let image_url = parts
        .iter()
        .find(|p| p.name == "image")
        .and_then(|p| p.file_name.clone())
        .map(|name| format!("app/images/{name}"));
    seen.lock().unwrap().recipe_parts = parts;
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Recipe created", "id": "65f0c2aa", "image_url": image_url })),
    )
}

async fn list_recipes(headers: HeaderMap) -> Reply {
    if bearer(&headers) != Some(GOOD_TOKEN) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!([
            { "title": "Soup", "instructions": "Boil.", "image_url": null, "user_id": 1 },
            { "title": "Stew", "instructions": "Simmer.", "image_url": "/x.png", "user_id": 1 },
        ])),
    )
}

async fn update_recipe(
    State(seen): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if bearer(&headers) != Some(GOOD_TOKEN) {
        return unauthorized();
    }
    if id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Recipe not found or unauthorized" })));
    }
    seen.lock().unwrap().update_bodies.push((id, body));
    (StatusCode::OK, Json(json!({ "message": "Recipe updated" })))
}

async fn bad_gateway() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "<html>502 Bad Gateway</html>")
}

// =============================================================================
// HARNESS
// =============================================================================

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Harness {
    seen: Shared,
    user_url: String,
    catalog_url: String,
}

impl Harness {
    async fn start() -> Self {
        let seen = Shared::default();
        let users = Router::new()
            .route("/users/login", post(login))
            .route("/users/register", post(register))
            .route("/users/verify", get(verify))
            .with_state(seen.clone());
        let catalog = Router::new()
            .route("/recipes", post(create_recipe).get(list_recipes))
            .route("/recipes/{id}", put(update_recipe))
            .with_state(seen.clone());
        Self { user_url: serve(users).await, catalog_url: serve(catalog).await, seen }
    }

    fn client(&self, stored: Option<&str>) -> RecipeClient<HttpBackend, MemoryTokenStore> {
        let config = ClientConfig::new(&self.user_url, &self.catalog_url);
        let store = stored.map_or_else(MemoryTokenStore::new, MemoryTokenStore::with_token);
        let mut client = RecipeClient::new(HttpBackend::new(&config).unwrap(), store);
        client.initialize();
        client
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[tokio::test]
async fn login_posts_json_credentials_and_stores_token() {
    let harness = Harness::start().await;
    let mut client = harness.client(None);

    client.login("ana", "pw").await.unwrap();
    assert_eq!(client.session().token(), Some(GOOD_TOKEN));
    assert_eq!(client.session().store().get(), Some(GOOD_TOKEN));

    let seen = harness.seen.lock().unwrap();
    assert_eq!(seen.login_bodies, vec![json!({ "username": "ana", "password": "pw" })]);
}

#[tokio::test]
async fn login_rejection_surfaces_server_message() {
    let harness = Harness::start().await;
    let mut client = harness.client(Some("old-token"));

    let err = client.login("ana", "nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed: Invalid credentials");
    assert_eq!(client.session().store().get(), None);
}

#[tokio::test]
async fn register_conflict_surfaces_server_message() {
    let harness = Harness::start().await;
    let mut client = harness.client(None);

    assert!(client.register("new-user", "pw").await.is_ok());
    let err = client.register("taken", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), "Registration failed: User already exists");
}

#[tokio::test]
async fn whoami_sends_bearer_token() {
    let harness = Harness::start().await;
    let mut client = harness.client(Some(GOOD_TOKEN));

    let user_id = client.whoami().await.unwrap();
    assert_eq!(client::whoami_status(&user_id), "Token valid for user 1.");
}

#[tokio::test]
async fn create_sends_multipart_fields_and_image() {
    let harness = Harness::start().await;
    let mut client = harness.client(Some(GOOD_TOKEN));

    let created = client
        .create_recipe(NewRecipe {
            title: "Soup".to_owned(),
            instructions: "Boil water.".to_owned(),
            image: Some(ImageUpload {
                file_name: "soup.png".to_owned(),
                bytes: vec![0x89, b'P', b'N', b'G'],
                mime: Some("image/png".to_owned()),
            }),
        })
        .await
        .unwrap();
    assert_eq!(
        client::created_status(&created),
        "Recipe created! ID: 65f0c2aa. Image saved to: app/images/soup.png"
    );

    let seen = harness.seen.lock().unwrap();
    let names = seen.recipe_parts.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["title", "instructions", "image"]);
    assert_eq!(seen.recipe_parts[0].bytes, b"Soup");
    assert_eq!(seen.recipe_parts[1].bytes, b"Boil water.");
    let image = &seen.recipe_parts[2];
    assert_eq!(image.file_name.as_deref(), Some("soup.png"));
    assert_eq!(image.content_type.as_deref(), Some("image/png"));
    assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn create_without_image_sends_text_parts_only() {
    let harness = Harness::start().await;
    let mut client = harness.client(Some(GOOD_TOKEN));

    let created = client
        .create_recipe(NewRecipe { title: "Soup".to_owned(), instructions: String::new(), image: None })
        .await
        .unwrap();
    assert_eq!(created.image_url, None);
    assert_eq!(harness.seen.lock().unwrap().recipe_parts.len(), 2);
}

#[tokio::test]
async fn create_with_rejected_token_clears_session() {
    let harness = Harness::start().await;
    let mut client = harness.client(Some("expired-token"));

    let err = client
        .create_recipe(NewRecipe { title: "Soup".to_owned(), instructions: String::new(), image: None })
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::Unauthorized);
    assert_eq!(client.session().token(), None);
    assert_eq!(client.session().store().get(), None);
}

#[tokio::test]
async fn list_renders_recipes_in_service_order() {
    let harness = Harness::start().await;
    let mut client = harness.client(Some(GOOD_TOKEN));

    let lines = client::recipe_lines(&client.list_recipes().await);
    assert_eq!(
        lines,
        vec!["Soup (Image URL: None)".to_owned(), "Stew (Image URL: /x.png)".to_owned()]
    );
}

#[tokio::test]
async fn list_non_json_error_uses_fallback_line() {
    let harness = Harness::start().await;
    let broken = serve(Router::new().route("/recipes", get(bad_gateway))).await;
    let config = ClientConfig::new(&harness.user_url, &broken);
    let mut client = RecipeClient::new(
        HttpBackend::new(&config).unwrap(),
        MemoryTokenStore::with_token(GOOD_TOKEN),
    );
    client.initialize();

    let lines = client::recipe_lines(&client.list_recipes().await);
    assert_eq!(lines, vec!["Error: Failed to fetch recipes.".to_owned()]);
    assert!(client.session().is_active());
}

#[tokio::test]
async fn update_sends_only_present_fields() {
    let harness = Harness::start().await;
    let mut client = harness.client(Some(GOOD_TOKEN));

    let update = RecipeUpdate { title: Some("Pho".to_owned()), instructions: None };
    client.update_recipe("65f0c2aa", &update).await.unwrap();
    let err = client.update_recipe("missing", &update).await.unwrap_err();
    assert_eq!(err.to_string(), "Error updating recipe: Recipe not found or unauthorized");

    let seen = harness.seen.lock().unwrap();
    assert_eq!(seen.update_bodies, vec![("65f0c2aa".to_owned(), json!({ "title": "Pho" }))]);
}

#[tokio::test]
async fn update_keeps_reserved_characters_inside_the_recipe_id() {
    let harness = Harness::start().await;
    let mut client = harness.client(Some(GOOD_TOKEN));

    let update = RecipeUpdate { title: Some("Pho".to_owned()), instructions: None };
    client.update_recipe("abc?owner=someone#x", &update).await.unwrap();
    client.update_recipe("a/b", &update).await.unwrap();

    let seen = harness.seen.lock().unwrap();
    let ids = seen.update_bodies.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["abc?owner=someone#x", "a/b"]);
}

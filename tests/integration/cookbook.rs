// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::future_not_send
)]

//! End-to-end tests for the cookbook API.
//!
//! Covers registration and login, the JWT guard, owner/admin rules on recipe
//! mutation, and image upload followed by download from `/images`.

use std::sync::Arc;

use agora_api::config::AdminSeed;
use agora_api::cookbook::{self, CookbookState, auth::JwtKeys};
use agora_api::server;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde_json::{Value, json};

const ADMIN_EMAIL: &str = "root@email.com";
const ADMIN_PASSWORD: &str = "admin1";

struct TestServer {
    base: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
    uploads: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let state = CookbookState::new(JwtKeys::new("integration-secret", 1), uploads.path());
        state
            .seed_admin(&AdminSeed {
                name: "admin".into(),
                email: ADMIN_EMAIL.into(),
                password: ADMIN_PASSWORD.into(),
            })
            .await
            .unwrap();

        let app = cookbook::router(Arc::new(state));
        let (addr, handle) = server::start_server("127.0.0.1:0", app).await.unwrap();
        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
            uploads,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let resp = req.send().await.unwrap();
        let status = resp.status();
        let text = resp.text().await.unwrap();
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap()
        };
        (status, body)
    }

    async fn register(&self, name: &str, email: &str) -> Value {
        let (status, body) = self
            .send(self.client.post(self.url("/users")).json(&json!({
                "name": name,
                "email": email,
                "password": "12345678"
            })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["user"].clone()
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                self.client
                    .post(self.url("/login"))
                    .json(&json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn user_token(&self, email: &str) -> String {
        self.register("someone", email).await;
        self.login(email, "12345678").await
    }

    async fn upload(&self, token: &str, id: &str, bytes: Vec<u8>) -> (StatusCode, Value) {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("ratinho.jpg")
            .mime_str("image/jpeg")
            .unwrap();
        let form = reqwest::multipart::Form::new().part("image", part);
        self.send(
            self.client
                .put(self.url(&format!("/recipes/{id}/image")))
                .header(AUTHORIZATION, token)
                .multipart(form),
        )
        .await
    }

    async fn recipe(&self, token: &str, name: &str) -> Value {
        let (status, body) = self
            .send(
                self.client
                    .post(self.url("/recipes"))
                    .header(AUTHORIZATION, token)
                    .json(&json!({
                        "name": name,
                        "ingredients": "Frango, sal",
                        "preparation": "10 minutos no forno"
                    })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["recipe"].clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn registration_and_login() {
    let server = TestServer::start().await;

    let user = server.register("Erick Jacquin", "erickjacquin@gmail.com").await;
    assert_eq!(user["role"], "user");
    assert!(user.get("password").is_none());

    let (status, body) = server
        .send(server.client.post(server.url("/users")).json(&json!({
            "name": "Erick Jacquin",
            "email": "erickjacquin@gmail.com",
            "password": "12345678"
        })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already registered");

    let (status, body) = server
        .send(
            server
                .client
                .post(server.url("/users"))
                .json(&json!({ "name": "Erick", "email": "erick" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid entries. Try again.");

    let token = server.login("erickjacquin@gmail.com", "12345678").await;
    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn login_failures() {
    let server = TestServer::start().await;
    server.register("Erick", "erick@email.com").await;

    let (status, body) = server
        .send(
            server
                .client
                .post(server.url("/login"))
                .json(&json!({ "email": "erick@email.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "All fields must be filled");

    let (status, body) = server
        .send(
            server
                .client
                .post(server.url("/login"))
                .json(&json!({ "email": "erick@email.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Incorrect username or password");
}

#[tokio::test]
async fn token_guard() {
    let server = TestServer::start().await;
    let recipe = json!({ "name": "a", "ingredients": "b", "preparation": "c" });

    let (status, body) = server
        .send(server.client.post(server.url("/recipes")).json(&recipe))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "missing auth token");

    let (status, body) = server
        .send(
            server
                .client
                .post(server.url("/recipes"))
                .header(AUTHORIZATION, "not-a-jwt")
                .json(&recipe),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "jwt malformed");

    let token = server.user_token("erick@email.com").await;
    let (status, _) = server
        .send(
            server
                .client
                .post(server.url("/recipes"))
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .json(&recipe),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn recipe_reads() {
    let server = TestServer::start().await;
    let token = server.user_token("erick@email.com").await;
    let recipe = server.recipe(&token, "Frango do Jacquin").await;
    let id = recipe["_id"].as_str().unwrap();

    let (status, list) = server.send(server.client.get(server.url("/recipes"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, one) = server
        .send(server.client.get(server.url(&format!("/recipes/{id}"))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one, recipe);

    for bad in ["999", "604cb554311d68f491ba5781"] {
        let (status, body) = server
            .send(server.client.get(server.url(&format!("/recipes/{bad}"))))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "recipe not found");
    }
}

#[tokio::test]
async fn only_owner_or_admin_mutates() {
    let server = TestServer::start().await;
    let owner = server.user_token("owner@email.com").await;
    let stranger = server.user_token("stranger@email.com").await;
    let admin = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let recipe = server.recipe(&owner, "Frango do Jacquin").await;
    let path = format!("/recipes/{}", recipe["_id"].as_str().unwrap());
    let edit = json!({ "name": "Frango editado", "ingredients": "Frango", "preparation": "Assar" });

    let (status, body) = server
        .send(
            server
                .client
                .put(server.url(&path))
                .header(AUTHORIZATION, &stranger)
                .json(&edit),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "you are not allowed to change this recipe");

    let (status, body) = server
        .send(
            server
                .client
                .put(server.url(&path))
                .header(AUTHORIZATION, &owner)
                .json(&edit),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Frango editado");

    let (status, _) = server
        .send(
            server
                .client
                .delete(server.url(&path))
                .header(AUTHORIZATION, &stranger),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .send(
            server
                .client
                .delete(server.url(&path))
                .header(AUTHORIZATION, &admin),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = server.send(server.client.get(server.url(&path))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_registration_requires_admin() {
    let server = TestServer::start().await;
    let user = server.user_token("user@email.com").await;
    let admin = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let body = json!({ "name": "Novo admin", "email": "novo@email.com", "password": "12345678" });

    let (status, resp) = server
        .send(
            server
                .client
                .post(server.url("/users/admin"))
                .header(AUTHORIZATION, &user)
                .json(&body),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["message"], "Only admins can register new admins");

    let (status, resp) = server
        .send(
            server
                .client
                .post(server.url("/users/admin"))
                .header(AUTHORIZATION, &admin)
                .json(&body),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["user"]["role"], "admin");
}

#[tokio::test]
async fn image_upload_and_download() {
    let server = TestServer::start().await;
    let owner = server.user_token("owner@email.com").await;
    let recipe = server.recipe(&owner, "Frango do Jacquin").await;
    let id = recipe["_id"].as_str().unwrap();
    let bytes = b"\xff\xd8\xff\xe0fake-jpeg".to_vec();

    let (status, body) = server.upload(&owner, id, bytes.clone()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let image = body["image"].as_str().unwrap();
    assert!(image.ends_with(&format!("/src/uploads/{id}.jpeg")), "{image}");

    let resp = server
        .client
        .get(server.url(&format!("/images/{id}.jpeg")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.bytes().await.unwrap().to_vec(), bytes);
}

#[tokio::test]
async fn image_upload_needs_owner_or_admin() {
    let server = TestServer::start().await;
    let owner = server.user_token("owner@email.com").await;
    let stranger = server.user_token("stranger@email.com").await;
    let admin = server.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let recipe = server.recipe(&owner, "Frango do Jacquin").await;
    let id = recipe["_id"].as_str().unwrap();
    let stored = server.uploads.path().join(format!("{id}.jpeg"));

    let (status, body) = server.upload(&stranger, id, b"stranger".to_vec()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "you are not allowed to change this recipe");
    assert!(!stored.exists());

    let (status, body) = server
        .send(server.client.get(server.url(&format!("/recipes/{id}"))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("image").is_none());

    let (status, body) = server.upload(&admin, id, b"admin".to_vec()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["image"].as_str().is_some());
    assert_eq!(std::fs::read(&stored).unwrap(), b"admin");
}

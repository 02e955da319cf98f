// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::future_not_send
)]

//! End-to-end tests for the inventory API.
//!
//! Each test starts its own server on an ephemeral port and drives it over
//! HTTP, checking status codes, the `{ err: { code, message } }` envelope,
//! and stock levels after sales are recorded and deleted.

use std::sync::Arc;

use agora_api::inventory::{self, InventoryState};
use agora_api::server;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let app = inventory::router(Arc::new(InventoryState::new()));
        let (addr, handle) = server::start_server("127.0.0.1:0", app).await.unwrap();
        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
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

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.send(self.client.delete(self.url(path))).await
    }

    async fn product(&self, name: &str, quantity: u64) -> String {
        let (status, body) = self
            .post("/products", &json!({ "name": name, "quantity": quantity }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["_id"].as_str().unwrap().to_string()
    }

    async fn stock(&self, id: &str) -> u64 {
        let (_, body) = self.get(&format!("/products/{id}")).await;
        body["quantity"].as_u64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn assert_err(body: &Value, code: &str, message: &str) {
    assert_eq!(body["err"]["code"], code, "{body}");
    assert_eq!(body["err"]["message"], message, "{body}");
}

#[tokio::test]
async fn root_answers_empty() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn product_crud() {
    let server = TestServer::start().await;

    let (status, created) = server
        .post("/products", &json!({ "name": "Produto do Batista", "quantity": 100 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Produto do Batista");
    assert_eq!(created["quantity"], 100);
    let id = created["_id"].as_str().unwrap();

    let (status, list) = server.get("/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["products"].as_array().unwrap().len(), 1);

    let (status, updated) = server
        .put(
            &format!("/products/{id}"),
            &json!({ "name": "Produto do Batista", "quantity": 7 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["quantity"], 7);

    let (status, removed) = server.delete(&format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["_id"], id);

    let (status, body) = server.get(&format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_err(&body, "not_found", "Product not found");
}

#[tokio::test]
async fn product_validation() {
    let server = TestServer::start().await;

    let (status, body) = server
        .post("/products", &json!({ "name": "Prod", "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err(
        &body,
        "invalid_data",
        r#""name" length must be at least 5 characters long"#,
    );

    let (_, body) = server
        .post("/products", &json!({ "name": "Produto", "quantity": "string" }))
        .await;
    assert_err(&body, "invalid_data", r#""quantity" must be a number"#);

    server.product("Produto", 1).await;
    let (status, body) = server
        .post("/products", &json!({ "name": "Produto", "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err(&body, "invalid_data", "Product already exists");

    let (status, body) = server.get("/products/9999").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err(&body, "invalid_data", "Wrong id format");
}

#[tokio::test]
async fn sale_lifecycle_moves_stock() {
    let server = TestServer::start().await;
    let p = server.product("Martelo de Thor", 10).await;

    let (status, sale) = server
        .post("/sales", &json!([{ "productId": p, "quantity": 5 }]))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sale["itensSold"][0]["productId"], p.as_str());
    assert_eq!(sale["itensSold"][0]["quantity"], 5);
    assert_eq!(server.stock(&p).await, 5);

    let sale_id = sale["_id"].as_str().unwrap();
    let (status, fetched) = server.get(&format!("/sales/{sale_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, sale);

    let (_, list) = server.get("/sales").await;
    assert_eq!(list["sales"].as_array().unwrap().len(), 1);

    let (status, updated) = server
        .put(
            &format!("/sales/{sale_id}"),
            &json!([{ "productId": p, "quantity": 2 }]),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["itensSold"][0]["quantity"], 2);
    assert_eq!(server.stock(&p).await, 5);

    let (status, removed) = server.delete(&format!("/sales/{sale_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["_id"], sale_id);
    assert_eq!(server.stock(&p).await, 7);
}

#[tokio::test]
async fn oversell_is_refused_without_side_effects() {
    let server = TestServer::start().await;
    let a = server.product("Martelo de Thor", 10).await;
    let b = server.product("Escudo do Capitão", 1).await;

    let (status, body) = server
        .post(
            "/sales",
            &json!([
                { "productId": a, "quantity": 3 },
                { "productId": b, "quantity": 2 }
            ]),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_err(&body, "stock_problem", "Such amount is not permitted to sell");

    assert_eq!(server.stock(&a).await, 10);
    assert_eq!(server.stock(&b).await, 1);
    let (_, list) = server.get("/sales").await;
    assert!(list["sales"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn sale_validation_and_lookup_errors() {
    let server = TestServer::start().await;

    let (status, body) = server
        .post("/sales", &json!([{ "productId": "123", "quantity": 1 }]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err(&body, "invalid_data", "Wrong product ID or invalid quantity");

    let unknown = "604cb554311d68f491ba5781";
    let (status, body) = server
        .post("/sales", &json!([{ "productId": unknown, "quantity": 1 }]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_err(&body, "product_not_found", "Product not found");

    let (status, body) = server.get("/sales/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_err(&body, "not_found", "Sale not found");

    let (status, body) = server.get(&format!("/sales/{unknown}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_err(&body, "not_found", "Sale not found");

    let (status, body) = server.delete("/sales/nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err(&body, "invalid_data", "Wrong sale ID format");
}

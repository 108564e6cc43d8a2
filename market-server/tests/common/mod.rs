//! Shared harness for HTTP-level tests
//!
//! Builds the full application (all middleware, in-memory store) and drives
//! it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{HeaderMap, Method, Request, StatusCode, header};
use market_server::{Config, ServerState, build_app};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

pub struct TestApp {
    pub state: ServerState,
    router: Router,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn code(&self) -> u64 {
        self.body["code"].as_u64().unwrap_or_default()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub fn new() -> Self {
        let state = ServerState::in_memory(Config::for_tests(SECRET));
        let router = build_app(&state).with_state(state.clone());
        Self { state, router }
    }

    pub async fn request(&self, req: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.request(req).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Reply {
        self.call(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Reply {
        self.call(Method::POST, path, token, Some(body)).await
    }

    /// GET a page with the token in the session cookie
    pub async fn page(&self, path: &str, token: Option<&str>) -> Reply {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={token}"));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Sign up and return the session token
    pub async fn signup(&self, email: &str, role: &str) -> String {
        let reply = self
            .post(
                "/api/auth/signup",
                None,
                json!({
                    "email": email,
                    "password": "correct-horse-battery",
                    "name": email.split('@').next().unwrap_or("user"),
                    "role": role,
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "signup {email}: {}", reply.body);
        reply.data()["token"].as_str().unwrap().to_string()
    }

    pub async fn create_product(&self, seller: &str, name: &str, price: &str) -> String {
        let reply = self
            .post(
                "/api/seller/products",
                Some(seller),
                json!({ "name": name, "description": "", "price": price }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.data()["id"].as_str().unwrap().to_string()
    }

    /// Add one product to the buyer's cart and check out; returns the order id
    pub async fn place_order(&self, buyer: &str, product_id: &str, quantity: u32) -> String {
        let reply = self
            .post(
                "/api/cart/items",
                Some(buyer),
                json!({ "productId": product_id, "quantity": quantity }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);

        let reply = self
            .post("/api/checkout", Some(buyer), checkout_body())
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.data()["id"].as_str().unwrap().to_string()
    }

    pub async fn set_status(&self, token: &str, order_id: &str, status: &str) -> Reply {
        self.post(
            &format!("/api/orders/{order_id}/status"),
            Some(token),
            json!({ "status": status }),
        )
        .await
    }

    /// Drive an order through to DELIVERED as its seller
    pub async fn deliver(&self, seller: &str, order_id: &str) {
        for status in ["PROCESSING", "SHIPPED", "DELIVERED"] {
            let reply = self.set_status(seller, order_id, status).await;
            assert_eq!(reply.status, StatusCode::OK, "{status}: {}", reply.body);
        }
    }
}

pub fn checkout_body() -> Value {
    json!({
        "currency": "usd",
        "shippingAddress": {
            "fullName": "Ada Buyer",
            "address": "1 Market Street",
            "state": "CA",
            "country": "US",
            "zipCode": "94105"
        }
    })
}

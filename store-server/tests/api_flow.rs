//! 端到端 API 流程测试
//!
//! 内存数据库 + oneshot 请求：注册 → 加购 → 结账 → 订单管理。

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use store_server::db::models::ProductCreate;
use store_server::db::repository::ProductRepository;
use store_server::{Config, ServerState};

async fn setup() -> (Router, ServerState) {
    let mut config = Config::with_overrides("/tmp/store-api-flow-test", 0);
    config.admin_token = Some("test-admin".into());
    let state = ServerState::initialize_in_memory(config).await.unwrap();
    let app = store_server::api::build_router().with_state(state.clone());
    (app, state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn register(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "name": "Budi Santoso",
                "address": "Jl. Merdeka 1",
                "birth_date": "1990-05-17",
                "phone": "0812345678",
                "username": username,
                "password": "rahasia123",
                "email": format!("{}@example.com", username),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("register must set a session cookie")
        .to_str()
        .unwrap();
    // Only the token part goes back in the Cookie header
    cookie.split(';').next().unwrap().to_string()
}

async fn seed_product(state: &ServerState, name: &str, stock: i64, price: f64) -> String {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .create(ProductCreate {
            name: name.into(),
            description: String::new(),
            image: None,
            stock,
            price,
            category_id: None,
        })
        .await
        .unwrap();
    product.key()
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let (app, _state) = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn cart_requires_login() {
    let (app, _state) = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/cart")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E3001");
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let (app, _state) = setup().await;
    register(&app, "budi").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "name": "Impostor",
                "address": "Jl. Lain 9",
                "birth_date": "1992-01-01",
                "phone": "0899999999",
                "username": "budi",
                "password": "rahasia123",
                "email": null,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (app, _state) = setup().await;
    register(&app, "budi").await;

    // Fresh username, but budi's email
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "name": "Siti Rahayu",
                "address": "Jl. Lain 9",
                "birth_date": "1992-01-01",
                "phone": "0899999999",
                "username": "siti",
                "password": "rahasia123",
                "email": "budi@example.com",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E0004");

    // Updating your own account to an email someone else holds is also a conflict
    let cookie = register(&app, "siti2").await;
    let mut request = json_request(
        "PUT",
        "/api/auth/me",
        json!({"email": "budi@example.com"}),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Re-submitting your own current email is fine
    let mut request = json_request(
        "PUT",
        "/api/auth/me",
        json!({"email": "siti2@example.com"}),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn full_checkout_flow() {
    let (app, state) = setup().await;
    let cookie = register(&app, "budi").await;
    let product_key = seed_product(&state, "Semen 50kg", 20, 85_000.0).await;

    // Add the product twice
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/cart/items/{}", product_key))
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Cart shows 1 item with quantity 2
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/cart")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let cart = body_json(response).await;
    assert_eq!(cart["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["data"]["items"][0]["quantity"], 2);
    assert_eq!(cart["data"]["total"], 170_000.0);

    // Checkout
    let mut request = json_request(
        "POST",
        "/api/orders/checkout",
        json!({"shipping_address": "Jl. Melati 2, Surabaya"}),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["code"], "E0000");
    assert_eq!(body["data"]["status"], "PROCESSING");
    assert_eq!(body["data"]["total"], 170_000.0);
    assert_eq!(body["data"]["lines"].as_array().unwrap().len(), 1);
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    // Stock was deducted at checkout
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.find_by_id(&product_key).await.unwrap().unwrap();
    assert_eq!(product.stock, 18);

    // Cart is cleared
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/cart")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let cart = body_json(response).await;
    assert!(cart["data"]["items"].as_array().unwrap().is_empty());

    // Own order list contains the new order
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/orders")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let orders = body_json(response).await;
    assert_eq!(orders["data"].as_array().unwrap().len(), 1);

    // Admin moves the order to PAID
    let mut request = json_request(
        "PUT",
        &format!("/api/orders/{}/status", order_id),
        json!({"status": "PAID"}),
    );
    request
        .headers_mut()
        .insert("x-admin-token", "test-admin".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "PAID");
}

#[tokio::test]
async fn checkout_with_empty_cart_is_rejected() {
    let (app, _state) = setup().await;
    let cookie = register(&app, "siti").await;

    let mut request = json_request(
        "POST",
        "/api/orders/checkout",
        json!({"shipping_address": "Jl. Melati 2"}),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E0005");
}

#[tokio::test]
async fn admin_routes_reject_wrong_token() {
    let (app, state) = setup().await;
    let product_key = seed_product(&state, "Pasir 1m3", 3, 250_000.0).await;

    let mut request = json_request(
        "PUT",
        &format!("/api/products/{}", product_key),
        json!({"stock": 50}),
    );
    request
        .headers_mut()
        .insert("x-admin-token", "wrong".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Correct token works
    let mut request = json_request(
        "PUT",
        &format!("/api/products/{}", product_key),
        json!({"stock": 50}),
    );
    request
        .headers_mut()
        .insert("x-admin-token", "test-admin".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["stock"], 50);
}

#[tokio::test]
async fn order_detail_is_owner_only() {
    let (app, state) = setup().await;
    let owner_cookie = register(&app, "budi").await;
    let other_cookie = register(&app, "siti").await;
    let product_key = seed_product(&state, "Besi Beton", 10, 120_000.0).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/cart/items/{}", product_key))
                .header(header::COOKIE, &owner_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut request = json_request(
        "POST",
        "/api/orders/checkout",
        json!({"shipping_address": "Jl. Melati 2"}),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, owner_cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    // Another customer cannot read it
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/orders/{}", order_id))
                .header(header::COOKIE, &other_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner can
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/orders/{}", order_id))
                .header(header::COOKIE, &owner_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

use actix_web::{test, web, App};
use serde_json::json;
use std::sync::Arc;

use rolo::api::{self, AppState};
use rolo::auth::AuthService;
use rolo::codes::CodeGenerator;
use rolo::lifecycle::DefaultListManager;
use rolo::sharing::ShareService;
use rolo::store::Store;

fn create_app_state(store: Arc<Store>) -> web::Data<AppState> {
    let auth_service = Arc::new(AuthService::new("test_secret".to_string()));
    let sharing = Arc::new(ShareService::new(
        store.clone(),
        Arc::new(CodeGenerator::new()),
    ));
    let lifecycle = Arc::new(DefaultListManager::new(store.clone()));
    web::Data::new(AppState {
        store,
        auth_service,
        sharing,
        lifecycle,
    })
}

/// Helper macro to register a user and get their token
macro_rules! register_and_get_token {
    ($app:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "email": $email,
                "password": "password123"
            }))
            .to_request();

        let resp: serde_json::Value = test::call_and_read_body_json(&$app, req).await;
        resp["data"]["token"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_search_tags_requires_auth() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/tags?q=bu").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_search_tags_by_prefix() {
    let store = Arc::new(Store::in_memory().unwrap());
    store.upsert_tag("real_estate", "buyer").unwrap();
    store.upsert_tag("real_estate", "seller").unwrap();
    store.upsert_tag("finance", "budget").unwrap();

    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let token = register_and_get_token!(app, "a@example.com");

    let req = test::TestRequest::get()
        .uri("/api/tags?q=bu")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let tags = resp["data"].as_array().unwrap();
    assert_eq!(tags.len(), 2);
    // ordered by name
    assert_eq!(tags[0]["name"], "budget");
    assert_eq!(tags[1]["name"], "buyer");
}

#[actix_web::test]
async fn test_search_tags_scoped_to_category() {
    let store = Arc::new(Store::in_memory().unwrap());
    store.upsert_tag("real_estate", "buyer").unwrap();
    store.upsert_tag("finance", "budget").unwrap();

    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let token = register_and_get_token!(app, "a@example.com");

    let req = test::TestRequest::get()
        .uri("/api/tags?q=bu&category=finance")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let tags = resp["data"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["category"], "finance");
}

#[actix_web::test]
async fn test_upsert_tag_returns_existing() {
    let store = Arc::new(Store::in_memory().unwrap());
    let first = store.upsert_tag("sales", "lead").unwrap();
    let second = store.upsert_tag("sales", "lead").unwrap();
    assert_eq!(first.id, second.id);
}

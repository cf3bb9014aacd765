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

macro_rules! create_list {
    ($app:expr, $token:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/lists")
            .insert_header(("Authorization", format!("Bearer {}", $token)))
            .set_json($body)
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&$app, req).await;
        resp["data"].clone()
    }};
}

#[actix_web::test]
async fn test_create_list_never_default() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let token = register_and_get_token!(app, "owner@example.com");
    let list = create_list!(
        app,
        token,
        json!({ "name": "Bookings", "type": "booking", "color": "#9c27b0" })
    );

    assert_eq!(list["type"], "booking");
    // default lists only come from the contact lifecycle
    assert_eq!(list["is_default"], false);
    assert!(list["contact_owner"].is_null());
}

#[actix_web::test]
async fn test_add_item_derives_alarm_from_lead_time() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let token = register_and_get_token!(app, "owner@example.com");
    let list = create_list!(
        app,
        token,
        json!({ "name": "Follow-ups", "type": "task", "alarm_lead_minutes": 30 })
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/lists/{}/items", list["id"].as_str().unwrap()))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "title": "Send papers",
            "due_at": "2026-09-01T12:00:00Z",
            "alarms": [{
                "trigger_at": "2026-09-01T10:00:00Z",
                "channel": "email",
                "message": "two hours out"
            }]
        }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let alarms = resp["data"]["alarms"].as_array().unwrap();

    // the supplied alarm is kept and one reminder is derived at due - lead
    assert_eq!(alarms.len(), 2);
    assert_eq!(alarms[0]["channel"], "email");
    assert_eq!(alarms[1]["channel"], "notification");
    assert_eq!(alarms[1]["message"], "Reminder: Send papers");
    assert_eq!(alarms[1]["trigger_at"], "2026-09-01T11:30:00Z");
}

#[actix_web::test]
async fn test_add_item_without_due_date_keeps_supplied_alarms() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let token = register_and_get_token!(app, "owner@example.com");
    let list = create_list!(
        app,
        token,
        json!({ "name": "Follow-ups", "type": "task", "alarm_lead_minutes": 30 })
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/lists/{}/items", list["id"].as_str().unwrap()))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "title": "No due date" }))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(resp["data"]["alarms"].as_array().map_or(true, |a| a.is_empty()));
}

#[actix_web::test]
async fn test_item_completion_stamped_once() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let token = register_and_get_token!(app, "owner@example.com");
    let list = create_list!(app, token, json!({ "name": "Errands" }));

    let req = test::TestRequest::post()
        .uri(&format!("/api/lists/{}/items", list["id"].as_str().unwrap()))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "title": "Buy stamps" }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let item_id = created["data"]["id"].as_str().unwrap().to_string();
    assert!(created["data"]["completed_at"].is_null());

    let complete = |status: &'static str| {
        test::TestRequest::put()
            .uri(&format!("/api/items/{}", item_id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "status": status }))
            .to_request()
    };

    let first: serde_json::Value = test::call_and_read_body_json(&app, complete("completed")).await;
    let stamped = first["data"]["completed_at"].as_str().unwrap().to_string();

    // bounce out of completed and back in; the first stamp stands
    let _: serde_json::Value = test::call_and_read_body_json(&app, complete("in_progress")).await;
    let second: serde_json::Value = test::call_and_read_body_json(&app, complete("completed")).await;
    assert_eq!(second["data"]["completed_at"].as_str().unwrap(), stamped);
}

#[actix_web::test]
async fn test_trigger_alarm_is_monotonic() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let token = register_and_get_token!(app, "owner@example.com");
    let list = create_list!(app, token, json!({ "name": "Errands" }));

    let req = test::TestRequest::post()
        .uri(&format!("/api/lists/{}/items", list["id"].as_str().unwrap()))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "title": "Dentist",
            "alarms": [{ "trigger_at": "2026-09-01T09:00:00Z", "message": "go now" }]
        }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let item_id = created["data"]["id"].as_str().unwrap().to_string();
    let alarm_id = created["data"]["alarms"][0]["id"].as_str().unwrap().to_string();

    let trigger = || {
        test::TestRequest::post()
            .uri(&format!("/api/items/{}/alarms/{}/trigger", item_id, alarm_id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request()
    };

    let first: serde_json::Value = test::call_and_read_body_json(&app, trigger()).await;
    assert_eq!(first["data"]["triggered"], true);
    let triggered_at = first["data"]["triggered_at"].as_str().unwrap().to_string();

    let second: serde_json::Value = test::call_and_read_body_json(&app, trigger()).await;
    assert_eq!(second["data"]["triggered"], true);
    assert_eq!(second["data"]["triggered_at"].as_str().unwrap(), triggered_at);
}

#[actix_web::test]
async fn test_list_grant_idempotent() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let token = register_and_get_token!(app, "owner@example.com");

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "friend@example.com", "password": "password123" }))
        .to_request();
    let friend: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let friend_id = friend["data"]["user"]["id"].as_str().unwrap();

    let list = create_list!(app, token, json!({ "name": "Shared plans" }));
    let list_id = list["id"].as_str().unwrap();

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/lists/{}/grants", list_id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "user_id": friend_id, "level": "view" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/lists/{}", list_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["data"]["shared_with"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_item_ownership_flows_through_list() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(create_app_state(store))
            .configure(api::configure_routes),
    )
    .await;

    let owner_token = register_and_get_token!(app, "owner@example.com");
    let other_token = register_and_get_token!(app, "other@example.com");
    let list = create_list!(app, owner_token, json!({ "name": "Errands" }));

    let req = test::TestRequest::post()
        .uri(&format!("/api/lists/{}/items", list["id"].as_str().unwrap()))
        .insert_header(("Authorization", format!("Bearer {}", owner_token)))
        .set_json(json!({ "title": "Private" }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let item_id = created["data"]["id"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/items/{}", item_id))
        .insert_header(("Authorization", format!("Bearer {}", other_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

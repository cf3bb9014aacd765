use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{AuthService, AuthUser};
use crate::lifecycle::{DefaultListManager, LifecycleError};
use crate::models::*;
use crate::sharing::{ShareService, SharingError};
use crate::store::{Store, StoreError};

pub struct AppState {
    pub store: Arc<Store>,
    pub auth_service: Arc<AuthService>,
    pub sharing: Arc<ShareService>,
    pub lifecycle: Arc<DefaultListManager>,
}

fn sharing_error_response(e: SharingError) -> HttpResponse {
    match e {
        SharingError::CodeNotFound(code) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(format!("Unknown share code {}", code)))
        }
        SharingError::CodeSpaceExhausted(attempts) => HttpResponse::ServiceUnavailable().json(
            ApiResponse::<()>::error(format!("No free share code after {} attempts", attempts)),
        ),
        SharingError::Store(e) => {
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(format!("Store error: {}", e)))
        }
    }
}

fn lifecycle_error_response(e: LifecycleError) -> HttpResponse {
    match e {
        LifecycleError::DefaultListMissing { .. } => {
            HttpResponse::Conflict().json(ApiResponse::<()>::error(e.to_string()))
        }
        LifecycleError::Store(StoreError::NotFound(msg)) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(msg))
        }
        LifecycleError::Store(e) => {
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(format!("Store error: {}", e)))
        }
    }
}

// ==================== Health Check ====================

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

// ==================== Auth Endpoints ====================

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> impl Responder {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("Email and password are required"));
    }

    let password_hash = match state.auth_service.hash_password(&body.password) {
        Ok(hash) => hash,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to hash password"))
        }
    };

    let mut user = User {
        id: String::new(),
        email: email.clone(),
        phone: body.phone.clone().filter(|p| !p.is_empty()),
        password_hash,
        display_name: body.display_name.clone().unwrap_or_else(|| email.clone()),
        profession: body.profession,
        profession_info: body.profession_info.clone(),
        share_code: None,
        shared_with: Vec::new(),
        access_via: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    match state.store.create_user(&mut user) {
        Ok(_) => {}
        Err(StoreError::Conflict(_)) => {
            return HttpResponse::Conflict()
                .json(ApiResponse::<()>::error("Email or phone already registered"))
        }
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("Failed to create user: {}", e)))
        }
    }

    let token = match state.auth_service.generate_token(&user.id) {
        Ok(t) => t,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to generate token"))
        }
    };

    HttpResponse::Created().json(ApiResponse::success(LoginResponse { token, user }))
}

pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let email = body.email.trim().to_lowercase();
    let user = match state.store.get_user_by_email(&email) {
        Ok(u) => u,
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Invalid credentials"));
        }
        Err(_) => {
            return HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error"));
        }
    };

    let valid = state
        .auth_service
        .verify_password(&body.password, &user.password_hash)
        .unwrap_or(false);

    if !valid {
        return HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Invalid credentials"));
    }

    let token = match state.auth_service.generate_token(&user.id) {
        Ok(t) => t,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to generate token"))
        }
    };

    HttpResponse::Ok().json(ApiResponse::success(LoginResponse { token, user }))
}

pub async fn get_current_user(state: web::Data<AppState>, auth_user: AuthUser) -> impl Responder {
    match state.store.get_user(&auth_user.user_id) {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::success(user)),
        Err(_) => HttpResponse::NotFound().json(ApiResponse::<()>::error("User not found")),
    }
}

// ==================== Contact Endpoints ====================

#[derive(Deserialize)]
pub struct ListContactsQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

pub async fn list_contacts(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    query: web::Query<ListContactsQuery>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(50).min(100);
    let offset = query.offset.unwrap_or(0);

    match state.store.list_contacts(&auth_user.user_id, limit, offset) {
        Ok(contacts) => HttpResponse::Ok().json(ApiResponse::success(contacts)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to list contacts: {}", e))),
    }
}

pub async fn create_contact(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    body: web::Json<CreateContactRequest>,
) -> impl Responder {
    if body.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Name is required"));
    }

    // a referrer must be one of the caller's own contacts
    if let Some(ref referrer_id) = body.referred_by {
        match state.store.get_contact(referrer_id) {
            Ok(referrer) if referrer.user_id == auth_user.user_id => {}
            Ok(_) | Err(StoreError::NotFound(_)) => {
                return HttpResponse::BadRequest()
                    .json(ApiResponse::<()>::error("Unknown referring contact"));
            }
            Err(e) => {
                return HttpResponse::InternalServerError()
                    .json(ApiResponse::<()>::error(format!("Failed to load referrer: {}", e)))
            }
        }
    }

    let mut contact = Contact {
        id: String::new(),
        user_id: auth_user.user_id.clone(),
        name: body.name.trim().to_string(),
        linked_user_id: body.linked_user_id.clone(),
        referred_by: body.referred_by.clone(),
        referrals: Vec::new(),
        task_list_id: None,
        meeting_list_id: None,
        transaction_list_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    if let Err(e) = state.store.create_contact(&mut contact) {
        return HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to create contact: {}", e)));
    }

    if let Some(ref referrer_id) = contact.referred_by {
        if let Err(e) = state.store.append_referral(referrer_id, &contact.id) {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("Failed to record referral: {}", e)));
        }
    }

    // provision the three default lists before the contact is observable
    match state.lifecycle.ensure_default_lists(&contact.id) {
        Ok(provisioned) => HttpResponse::Created().json(ApiResponse::success(provisioned)),
        Err(e) => lifecycle_error_response(e),
    }
}

pub async fn get_contact(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    let id = path.into_inner();
    match state.store.get_contact(&id) {
        Ok(contact) => {
            if contact.user_id != auth_user.user_id {
                return HttpResponse::NotFound().json(ApiResponse::<()>::error("Contact not found"));
            }
            HttpResponse::Ok().json(ApiResponse::success(contact))
        }
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Contact not found"))
        }
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to get contact: {}", e))),
    }
}

pub async fn update_contact(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateContactRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let mut contact = match state.store.get_contact(&id) {
        Ok(c) => c,
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::NotFound().json(ApiResponse::<()>::error("Contact not found"));
        }
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("Failed to get contact: {}", e)))
        }
    };

    if contact.user_id != auth_user.user_id {
        return HttpResponse::NotFound().json(ApiResponse::<()>::error("Contact not found"));
    }

    if let Some(ref name) = body.name {
        contact.name = name.clone();
    }
    if let Some(ref linked) = body.linked_user_id {
        contact.linked_user_id = Some(linked.clone());
    }

    match state.store.update_contact(&mut contact) {
        Ok(_) => HttpResponse::Ok().json(ApiResponse::success(contact)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to update contact: {}", e))),
    }
}

pub async fn delete_contact(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    let id = path.into_inner();

    match state.store.get_contact(&id) {
        Ok(contact) => {
            if contact.user_id != auth_user.user_id {
                return HttpResponse::NotFound().json(ApiResponse::<()>::error("Contact not found"));
            }
        }
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::NotFound().json(ApiResponse::<()>::error("Contact not found"));
        }
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("Failed to get contact: {}", e)))
        }
    }

    match state.store.delete_contact(&id) {
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to delete contact: {}", e))),
    }
}

// ==================== Contact Convenience Endpoints ====================

async fn add_to_contact_default(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    contact_id: String,
    category: ListCategory,
    body: CreateItemRequest,
) -> HttpResponse {
    match state.store.get_contact(&contact_id) {
        Ok(contact) if contact.user_id == auth_user.user_id => {}
        Ok(_) | Err(StoreError::NotFound(_)) => {
            return HttpResponse::NotFound().json(ApiResponse::<()>::error("Contact not found"));
        }
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("Failed to get contact: {}", e)))
        }
    }

    let result = match category {
        ListCategory::Task => state.lifecycle.add_task(&contact_id, body),
        ListCategory::Meeting => state.lifecycle.add_meeting(&contact_id, body),
        ListCategory::Transaction => state.lifecycle.add_transaction(&contact_id, body),
        _ => {
            return HttpResponse::BadRequest()
                .json(ApiResponse::<()>::error("No default list for this category"))
        }
    };

    match result {
        Ok(item) => HttpResponse::Created().json(ApiResponse::success(item)),
        Err(e) => lifecycle_error_response(e),
    }
}

pub async fn add_contact_task(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<CreateItemRequest>,
) -> impl Responder {
    add_to_contact_default(state, auth_user, path.into_inner(), ListCategory::Task, body.into_inner()).await
}

pub async fn add_contact_meeting(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<CreateItemRequest>,
) -> impl Responder {
    add_to_contact_default(state, auth_user, path.into_inner(), ListCategory::Meeting, body.into_inner()).await
}

pub async fn add_contact_transaction(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<CreateItemRequest>,
) -> impl Responder {
    add_to_contact_default(state, auth_user, path.into_inner(), ListCategory::Transaction, body.into_inner()).await
}

// ==================== List Endpoints ====================

pub async fn list_lists(state: web::Data<AppState>, auth_user: AuthUser) -> impl Responder {
    match state.store.list_lists(&auth_user.user_id) {
        Ok(lists) => HttpResponse::Ok().json(ApiResponse::success(lists)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to list lists: {}", e))),
    }
}

pub async fn create_list(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    body: web::Json<CreateListRequest>,
) -> impl Responder {
    if body.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Name is required"));
    }

    // default lists only come from the contact lifecycle
    let mut list = List {
        id: String::new(),
        user_id: auth_user.user_id.clone(),
        name: body.name.trim().to_string(),
        list_type: body.list_type,
        is_default: false,
        contact_owner: None,
        color: body.color.clone().unwrap_or_default(),
        icon: body.icon.clone().unwrap_or_default(),
        members: body.members.clone(),
        shared_with: Vec::new(),
        alarm_lead_minutes: body.alarm_lead_minutes,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    match state.store.create_list(&mut list) {
        Ok(_) => HttpResponse::Created().json(ApiResponse::success(list)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to create list: {}", e))),
    }
}

fn owned_list(state: &AppState, auth_user: &AuthUser, id: &str) -> Result<List, HttpResponse> {
    match state.store.get_list(id) {
        Ok(list) => {
            if list.user_id != auth_user.user_id {
                return Err(HttpResponse::NotFound().json(ApiResponse::<()>::error("List not found")));
            }
            Ok(list)
        }
        Err(StoreError::NotFound(_)) => {
            Err(HttpResponse::NotFound().json(ApiResponse::<()>::error("List not found")))
        }
        Err(e) => Err(HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to get list: {}", e)))),
    }
}

pub async fn get_list(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match owned_list(&state, &auth_user, &path.into_inner()) {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(resp) => resp,
    }
}

pub async fn update_list(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateListRequest>,
) -> impl Responder {
    let mut list = match owned_list(&state, &auth_user, &path.into_inner()) {
        Ok(list) => list,
        Err(resp) => return resp,
    };

    if let Some(ref name) = body.name {
        list.name = name.clone();
    }
    if let Some(ref color) = body.color {
        list.color = color.clone();
    }
    if let Some(ref icon) = body.icon {
        list.icon = icon.clone();
    }
    if let Some(ref members) = body.members {
        list.members = members.clone();
    }
    if let Some(lead) = body.alarm_lead_minutes {
        list.alarm_lead_minutes = Some(lead);
    }

    match state.store.update_list(&mut list) {
        Ok(_) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to update list: {}", e))),
    }
}

pub async fn add_list_grant(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<ListGrantRequest>,
) -> impl Responder {
    let list = match owned_list(&state, &auth_user, &path.into_inner()) {
        Ok(list) => list,
        Err(resp) => return resp,
    };

    match state.store.append_list_grant(&list.id, &body.user_id, body.level) {
        Ok(_) => match state.store.get_list(&list.id) {
            Ok(updated) => HttpResponse::Ok().json(ApiResponse::success(updated)),
            Err(e) => HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("Failed to get list: {}", e))),
        },
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to share list: {}", e))),
    }
}

// ==================== Item Endpoints ====================

pub async fn add_item(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<CreateItemRequest>,
) -> impl Responder {
    let list = match owned_list(&state, &auth_user, &path.into_inner()) {
        Ok(list) => list,
        Err(resp) => return resp,
    };

    match state.lifecycle.add_item(&list, body.into_inner()) {
        Ok(item) => HttpResponse::Created().json(ApiResponse::success(item)),
        Err(e) => lifecycle_error_response(e),
    }
}

pub async fn list_items(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    let list = match owned_list(&state, &auth_user, &path.into_inner()) {
        Ok(list) => list,
        Err(resp) => return resp,
    };

    match state.store.list_items(&list.id) {
        Ok(items) => HttpResponse::Ok().json(ApiResponse::success(items)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to list items: {}", e))),
    }
}

fn owned_item(state: &AppState, auth_user: &AuthUser, id: &str) -> Result<Item, HttpResponse> {
    let item = match state.store.get_item(id) {
        Ok(item) => item,
        Err(StoreError::NotFound(_)) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::<()>::error("Item not found")))
        }
        Err(e) => {
            return Err(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("Failed to get item: {}", e))))
        }
    };
    // ownership flows through the parent list
    owned_list(state, auth_user, &item.list_id)?;
    Ok(item)
}

pub async fn get_item(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    match owned_item(&state, &auth_user, &path.into_inner()) {
        Ok(item) => HttpResponse::Ok().json(ApiResponse::success(item)),
        Err(resp) => resp,
    }
}

pub async fn update_item(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateItemRequest>,
) -> impl Responder {
    let mut item = match owned_item(&state, &auth_user, &path.into_inner()) {
        Ok(item) => item,
        Err(resp) => return resp,
    };

    if let Some(ref title) = body.title {
        item.title = title.clone();
    }
    if let Some(ref description) = body.description {
        item.description = description.clone();
    }
    if let Some(status) = body.status {
        item.status = status;
    }
    if let Some(priority) = body.priority {
        item.priority = priority;
    }
    if let Some(due_at) = body.due_at {
        item.due_at = Some(due_at);
    }
    if let Some(start_at) = body.start_at {
        item.start_at = Some(start_at);
    }
    if let Some(end_at) = body.end_at {
        item.end_at = Some(end_at);
    }
    if let Some(ref payload) = body.payload {
        item.payload = Some(payload.clone());
    }

    match state.store.update_item(&mut item) {
        Ok(_) => HttpResponse::Ok().json(ApiResponse::success(item)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to update item: {}", e))),
    }
}

pub async fn trigger_alarm(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (item_id, alarm_id) = path.into_inner();
    if let Err(resp) = owned_item(&state, &auth_user, &item_id) {
        return resp;
    }

    match state.store.mark_alarm_triggered(&item_id, &alarm_id) {
        Ok(alarm) => HttpResponse::Ok().json(ApiResponse::success(alarm)),
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Alarm not found"))
        }
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to trigger alarm: {}", e))),
    }
}

// ==================== Share Endpoints ====================

pub async fn ensure_share_code(state: web::Data<AppState>, auth_user: AuthUser) -> impl Responder {
    match state.sharing.ensure_share_code(&auth_user.user_id) {
        Ok(code) => HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "code": code }))),
        Err(e) => sharing_error_response(e),
    }
}

pub async fn create_share_grant(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    body: web::Json<GrantRequest>,
) -> impl Responder {
    // the grantee must be a registered account
    match state.store.get_user(&body.user_id) {
        Ok(_) => {}
        Err(StoreError::NotFound(_)) => {
            return HttpResponse::NotFound().json(ApiResponse::<()>::error("User not found"));
        }
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("Failed to load user: {}", e)))
        }
    }

    match state.sharing.grant_access(&auth_user.user_id, &body.user_id, body.level) {
        Ok(code) => HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "code": code }))),
        Err(e) => sharing_error_response(e),
    }
}

pub async fn redeem_share_code(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    body: web::Json<RedeemRequest>,
) -> impl Responder {
    match state.sharing.redeem_code(&auth_user.user_id, &body.code) {
        Ok(owner) => HttpResponse::Ok().json(ApiResponse::success(owner)),
        Err(e) => sharing_error_response(e),
    }
}

pub async fn share_connections(state: web::Data<AppState>, auth_user: AuthUser) -> impl Responder {
    match state.store.get_user(&auth_user.user_id) {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
            "shared_with": user.shared_with,
            "access_via": user.access_via,
        }))),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to load user: {}", e))),
    }
}

// ==================== Tag Endpoints ====================

#[derive(Deserialize)]
pub struct SearchTagsQuery {
    q: Option<String>,
    category: Option<String>,
    limit: Option<i64>,
}

pub async fn search_tags(
    state: web::Data<AppState>,
    _auth_user: AuthUser,
    query: web::Query<SearchTagsQuery>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(25).min(100);
    match state.store.search_tags(
        query.q.as_deref().unwrap_or(""),
        query.category.as_deref(),
        limit,
    ) {
        Ok(tags) => HttpResponse::Ok().json(ApiResponse::success(tags)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(format!("Failed to search tags: {}", e))),
    }
}

// ==================== Route Configuration ====================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health))
        // Auth routes (no auth required)
        .route("/api/auth/register", web::post().to(register))
        .route("/api/auth/login", web::post().to(login))
        .route("/api/auth/me", web::get().to(get_current_user))
        // Contacts
        .route("/api/contacts", web::get().to(list_contacts))
        .route("/api/contacts", web::post().to(create_contact))
        .route("/api/contacts/{id}", web::get().to(get_contact))
        .route("/api/contacts/{id}", web::put().to(update_contact))
        .route("/api/contacts/{id}", web::delete().to(delete_contact))
        .route("/api/contacts/{id}/tasks", web::post().to(add_contact_task))
        .route("/api/contacts/{id}/meetings", web::post().to(add_contact_meeting))
        .route(
            "/api/contacts/{id}/transactions",
            web::post().to(add_contact_transaction),
        )
        // Lists
        .route("/api/lists", web::get().to(list_lists))
        .route("/api/lists", web::post().to(create_list))
        .route("/api/lists/{id}", web::get().to(get_list))
        .route("/api/lists/{id}", web::put().to(update_list))
        .route("/api/lists/{id}/grants", web::post().to(add_list_grant))
        .route("/api/lists/{id}/items", web::get().to(list_items))
        .route("/api/lists/{id}/items", web::post().to(add_item))
        // Items
        .route("/api/items/{id}", web::get().to(get_item))
        .route("/api/items/{id}", web::put().to(update_item))
        .route(
            "/api/items/{id}/alarms/{alarm_id}/trigger",
            web::post().to(trigger_alarm),
        )
        // Sharing
        .route("/api/share/code", web::post().to(ensure_share_code))
        .route("/api/share/grants", web::post().to(create_share_grant))
        .route("/api/share/redeem", web::post().to(redeem_share_code))
        .route("/api/share/connections", web::get().to(share_connections))
        // Tags
        .route("/api/tags", web::get().to(search_tags));
}

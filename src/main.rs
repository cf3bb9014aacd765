mod api;
mod auth;
mod codes;
mod lifecycle;
mod models;
mod sharing;
mod store;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::env;
use std::sync::Arc;

use api::AppState;
use auth::AuthService;
use codes::CodeGenerator;
use lifecycle::DefaultListManager;
use sharing::ShareService;
use store::Store;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load environment variables
    dotenvy::dotenv().ok();

    // Get configuration from environment
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8070".to_string())
        .parse()
        .expect("PORT must be a number");

    let db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "rolo.db".to_string());

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
        log::warn!("JWT_SECRET not set, using default (not secure for production!)");
        "default_jwt_secret_change_me".to_string()
    });

    // Initialize store
    let store = Arc::new(Store::new(&db_path).expect("Failed to initialize database"));

    // Initialize services
    let auth_service = Arc::new(AuthService::new(jwt_secret));
    let sharing = Arc::new(ShareService::new(store.clone(), Arc::new(CodeGenerator::new())));
    let lifecycle = Arc::new(DefaultListManager::new(store.clone()));

    // Seed the tag taxonomy on first boot
    if store.count_tags().unwrap_or(0) == 0 {
        log::info!("Seeding tag taxonomy");
        seed_tag_taxonomy(&store);
    }

    log::info!("Database: {}", db_path);
    log::info!("Starting rolo server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                auth_service: auth_service.clone(),
                sharing: sharing.clone(),
                lifecycle: lifecycle.clone(),
            }))
            .configure(api::configure_routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

/// Seed the built-in tag taxonomy, one batch of labels per profession
/// category. Matches the frontend's profession picker.
fn seed_tag_taxonomy(store: &Arc<Store>) {
    let taxonomy: &[(&str, &[&str])] = &[
        (
            "real_estate",
            &["buyer", "seller", "investor", "landlord", "tenant", "open-house"],
        ),
        (
            "insurance",
            &["policyholder", "prospect", "claim", "renewal"],
        ),
        (
            "finance",
            &["client", "budget", "retirement", "portfolio", "loan"],
        ),
        ("legal", &["client", "litigation", "estate", "contract"]),
        ("sales", &["lead", "prospect", "customer", "churn-risk"]),
    ];

    for (category, names) in taxonomy {
        for name in *names {
            if let Err(e) = store.upsert_tag(category, name) {
                log::error!("Failed to seed tag '{}/{}': {}", category, name, e);
            }
        }
    }
}

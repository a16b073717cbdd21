use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

mod config;
mod disposition;
mod error;
mod handlers;
mod models;
mod notifications;
mod seed;
mod store;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::MaterialFilter;
use crate::notifications::NotificationCenter;
use crate::store::{Catalog, MemStore, PgStore, RecordStore};

/// Shared application state — cheap to clone (all heap behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub records: Arc<dyn RecordStore>,
    pub notifications: Arc<RwLock<NotificationCenter>>,
}

/// One pass of the reorder evaluation: pull every material with alerting
/// enabled and let the notification center raise what is due. Shared by the
/// background interval and the on-demand endpoint.
pub async fn run_reorder_sweep(state: &AppState) -> AppResult<usize> {
    let mut materials = Vec::new();
    let mut page_no = 1;
    loop {
        let filter = MaterialFilter {
            page: Some(page_no),
            limit: Some(500),
            ..Default::default()
        };
        let page = state.catalog.list_materials(&filter).await?;
        let done = page_no >= page.total_pages.max(1);
        materials.extend(page.items);
        if done {
            break;
        }
        page_no += 1;
    }
    state.notifications.write().await.evaluate(&materials)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,warehouse_service=debug".parse().unwrap()),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("Warehouse Service — returns & disposition");

    // One store implementation is picked here; nothing downstream branches
    // on which one it got.
    let (catalog, records): (Arc<dyn Catalog>, Arc<dyn RecordStore>) =
        match &config.database_url {
            Some(url) => {
                info!("Connecting to PostgreSQL...");
                let pool = PgPoolOptions::new()
                    .max_connections(20)
                    .connect(url)
                    .await?;
                info!("Database connection pool established.");

                info!("Running migrations...");
                sqlx::migrate!("./migrations").run(&pool).await?;
                info!("Migrations complete.");

                let pg = Arc::new(PgStore::new(pool));
                (pg.clone() as Arc<dyn Catalog>, pg as Arc<dyn RecordStore>)
            }
            None => {
                info!("DATABASE_URL not set — using the in-memory store with demo data");
                let mem = Arc::new(MemStore::new());
                let seeded =
                    seed::seed_demo_data(mem.as_ref(), mem.as_ref()).await?;
                info!(materials = seeded, "In-memory store seeded");
                (mem.clone() as Arc<dyn Catalog>, mem as Arc<dyn RecordStore>)
            }
        };

    let notifications = NotificationCenter::load(config.notifications_path.clone())?;

    let state = AppState {
        catalog,
        records,
        notifications: Arc::new(RwLock::new(notifications)),
    };

    // Background reorder sweep
    let sweep_state = state.clone();
    let sweep_interval = config.reorder_check_secs;
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(sweep_interval));
        loop {
            ticker.tick().await;
            match run_reorder_sweep(&sweep_state).await {
                Ok(0) => {}
                Ok(raised) => info!(raised, "Reorder sweep raised notifications"),
                Err(err) => error!(error = %err, "Reorder sweep failed"),
            }
        }
    });

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health", get(handlers::health))

        // ── Materials ───────────────────────────────────────────────────────
        .route(
            "/api/v1/materials",
            get(handlers::materials::list_materials)
                .post(handlers::materials::create_material),
        )
        .route(
            "/api/v1/materials/export",
            get(handlers::materials::export_materials),
        )
        .route(
            "/api/v1/materials/:id",
            get(handlers::materials::get_material)
                .put(handlers::materials::update_material)
                .delete(handlers::materials::delete_material),
        )
        .route(
            "/api/v1/materials/:id/activate",
            patch(handlers::materials::activate_material),
        )
        .route(
            "/api/v1/materials/:id/deactivate",
            patch(handlers::materials::deactivate_material),
        )
        .route(
            "/api/v1/materials/:id/reorder-config",
            put(handlers::materials::set_reorder_config),
        )

        // ── Categories & units ──────────────────────────────────────────────
        .route(
            "/api/v1/categories",
            get(handlers::categories::list_categories)
                .post(handlers::categories::create_category),
        )
        .route(
            "/api/v1/categories/:id",
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route(
            "/api/v1/units",
            get(handlers::units::list_units).post(handlers::units::create_unit),
        )
        .route(
            "/api/v1/units/:id",
            put(handlers::units::update_unit).delete(handlers::units::delete_unit),
        )

        // ── Returns ─────────────────────────────────────────────────────────
        .route(
            "/api/v1/returns",
            get(handlers::returns::list_returns).post(handlers::returns::register_return),
        )
        .route(
            "/api/v1/returns/in-repair",
            get(handlers::returns::list_in_repair),
        )
        .route("/api/v1/returns/logs", get(handlers::returns::list_log))
        .route("/api/v1/returns/:id", get(handlers::returns::get_return))
        .route(
            "/api/v1/returns/:id/inspection",
            post(handlers::returns::inspect_return),
        )
        .route(
            "/api/v1/returns/:id/decision",
            post(handlers::returns::decide_repair),
        )

        // ── Notifications ───────────────────────────────────────────────────
        .route(
            "/api/v1/notifications",
            get(handlers::notifications::list_notifications)
                .delete(handlers::notifications::dismiss_all),
        )
        .route(
            "/api/v1/notifications/check",
            post(handlers::notifications::check_now),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(handlers::notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(handlers::notifications::mark_read),
        )
        .route(
            "/api/v1/notifications/:id",
            delete(handlers::notifications::dismiss),
        )

        // ── Seed ────────────────────────────────────────────────────────────
        .route("/api/seed", post(handlers::seed_demo))

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

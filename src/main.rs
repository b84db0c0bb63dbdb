use std::sync::Arc;

use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::web::Data;
use actix_web::{App, HttpServer};

use dayflow::config::{Config, StoreBackend};
use dayflow::db::init_db;
use dayflow::docs::ApiDoc;
use dayflow::routes;
use dayflow::state::AppState;
use dayflow::store::{MemoryStore, MySqlStore};

use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = %config.store_backend, "Server starting...");

    let state = match config.store_backend {
        StoreBackend::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = init_db(url, config.run_migrations).await?;
            AppState::from_store(
                Arc::new(MySqlStore::new(pool)),
                config.standard_work_minutes,
            )
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            AppState::from_store(Arc::new(MemoryStore::new()), config.standard_work_minutes)
        }
    };

    let warmup_state = state.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warmup_state
            .emails
            .warmup(warmup_state.users.as_ref(), 100)
            .await
        {
            error!(error = %e, "Failed to warmup email registry");
        }
    });

    let server_addr = config.server_addr.clone();
    let state = Data::new(state);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            // trim would bounce /swagger-ui/ back and forth with its redirect
            .wrap(NormalizePath::new(TrailingSlash::MergeOnly))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(config_data.clone())
            // auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}

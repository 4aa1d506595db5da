use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Result;

use guardsched::database::init_database;
use guardsched::middleware::RequestIdMiddleware;
use guardsched::services::{ChannelPublisher, LogNotifier, TemplateImportConsumer};
use guardsched::{AppState, Config, Stores, jobs, routes};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    log::info!(
        "Starting guardsched (environment: {})",
        config.environment
    );

    let pool = init_database(&config).await?;
    log::info!("Database initialized");

    let stores = Stores::postgres(pool);
    let bus = Arc::new(ChannelPublisher::new(config.event_channel_capacity));

    // Subscribe before anything can publish so no activation is missed.
    let receiver = bus.subscribe();

    let outbox = stores.outbox.clone();
    let state = AppState::new(&config, stores, bus.clone(), Arc::new(LogNotifier))?;

    jobs::spawn_template_import(TemplateImportConsumer::new(
        state.template_reconciler.clone(),
        outbox,
        receiver,
    ));
    jobs::spawn_relay_loop(
        state.outbox_relay.clone(),
        Duration::from_secs(config.outbox_relay_interval_secs),
    );
    jobs::spawn_sweep_loop(
        state.expiration_sweeper.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let app_state = web::Data::new(state);
    let server_address = config.server_address();
    let allowed_origin = config.client_base_url.clone();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&allowed_origin)
                    .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type", "Accept", "X-Correlation-ID"])
                    .max_age(3600),
            )
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b %T correlation_id=%{x-correlation-id}o"#,
            ))
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

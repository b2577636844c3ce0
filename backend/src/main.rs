//! Backend entry-point: loads settings, prepares storage and serves the
//! field operations API, alert stream and health probes.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use guardpost_backend::inbound::http::health::HealthState;
use guardpost_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use guardpost_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{GuardpostSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let settings = GuardpostSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load GUARDPOST settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;

    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        settings.bind_addr()?,
    )
    .with_field_ops(
        settings.attendance_policy()?,
        settings.breach_alert_mode()?,
        settings.alert_hub_capacity(),
    );

    match settings.database_url.as_deref() {
        Some(url) => {
            run_pending_migrations(url)
                .await
                .wrap_err("failed to migrate database")?;
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .wrap_err("failed to build database pool")?;
            config = config.with_db_pool(pool);
        }
        None => warn!("GUARDPOST_DATABASE_URL unset; serving fixture ports"),
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!("guardpost backend listening");
    server.await?;
    health_state.mark_draining();
    Ok(())
}

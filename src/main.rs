#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod config;
mod cors;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use auth::{PasswordHasher, TokenService};
use config::{AppConfig, ConfigError};
use cors::Cors;
use error::AppError;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use telemetry::{init_tracing, shutdown_telemetry, TelemetryFairing};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Environment file error: {0}")]
    Env(#[from] dotenvy::Error),
    #[error("Telemetry error: {0}")]
    Telemetry(anyhow::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
    #[error("Server error: {0}")]
    Launch(Box<rocket::Error>),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Telemetry(value)
    }
}

impl From<rocket::Error> for Error {
    fn from(value: rocket::Error) -> Self {
        Error::Launch(Box::new(value))
    }
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let env_report = env::load_environment()?;
    let config = AppConfig::from_env()?;
    init_tracing(&config.telemetry)?;

    for path in &env_report.loaded {
        info!("Loaded environment from: {}", path);
    }
    for path in &env_report.missing {
        warn!("Environment file {} not found, skipping", path);
    }

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    if db::seed_default_role(&pool).await? {
        info!("Seeded default role");
    }

    let _rocket = init_rocket(pool, &config).launch().await?;
    Ok(())
}

pub fn init_rocket(pool: SqlitePool, config: &AppConfig) -> Rocket<Build> {
    info!("Starting course tracker");

    rocket::build()
        .manage(pool)
        .manage(TokenService::new(&config.auth))
        .manage(PasswordHasher::new(config.auth.password_hash_cost))
        .mount("/", api::routes())
        .mount("/", routes![cors::preflight])
        .register("/", catchers![api::default_catcher])
        .attach(TelemetryFairing)
        .attach(Cors::new(config.cors_allowed_origins.clone()))
        .attach(AdHoc::on_shutdown("Telemetry shutdown", |_| {
            Box::pin(async move { shutdown_telemetry() })
        }))
}

// src/config.rs

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{
        InMemoryReservoirStore, InMemoryUserStore, ReservoirRepository, ReservoirStore,
        UserRepository, UserStore,
    },
    services::{
        auth::AuthService,
        reservoir_service::ReservoirService,
        seed::seed_sample_data,
        token::{TokenConfig, TokenService},
    },
};

/// Process configuration, read once from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    /// Postgres URL. When absent the in-memory stores are used.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub token: TokenConfig,
    pub bcrypt_cost: u32,
    pub seed_sample_data: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr = env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("LISTEN_ADDR is not a valid socket address")?;

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let token_ttl = token_ttl(parse_env("JWT_TTL_SECS", 86_400))?;
        let seed_sample_data = seed_sample_data_enabled(
            env::var("SEED_SAMPLE_DATA").ok().as_deref(),
            database_url.is_some(),
        );

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5),
            token: TokenConfig::new(jwt_secret, token_ttl),
            bcrypt_cost: parse_env("BCRYPT_COST", bcrypt::DEFAULT_COST),
            seed_sample_data,
        })
    }
}

fn token_ttl(secs: i64) -> anyhow::Result<chrono::Duration> {
    if secs <= 0 {
        anyhow::bail!("JWT_TTL_SECS must be positive, got {secs}");
    }
    chrono::Duration::try_seconds(secs)
        .with_context(|| format!("JWT_TTL_SECS is out of range: {secs}"))
}

// Missing or unparsable values fall back to the default.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

// The sample accounts have well-known passwords: against Postgres seeding is opt-in.
fn seed_sample_data_enabled(raw: Option<&str>, has_database: bool) -> bool {
    parse_bool(raw, !has_database)
}

// The shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub reservoir_service: Arc<ReservoirService>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wires services on top of the given stores.
    pub fn from_stores(
        reservoir_store: Arc<dyn ReservoirStore>,
        user_store: Arc<dyn UserStore>,
        token: &TokenConfig,
        bcrypt_cost: u32,
    ) -> Self {
        let tokens = TokenService::new(token);
        Self {
            reservoir_service: Arc::new(ReservoirService::new(reservoir_store)),
            auth_service: Arc::new(AuthService::new(user_store, tokens, bcrypt_cost)),
        }
    }

    /// Connects the stores, optionally seeds them, and builds the state.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let (reservoir_store, user_store): (Arc<dyn ReservoirStore>, Arc<dyn UserStore>) =
            match &config.database_url {
                Some(url) => {
                    let db_pool = PgPoolOptions::new()
                        .max_connections(config.database_max_connections)
                        .acquire_timeout(Duration::from_secs(3))
                        .connect(url)
                        .await?;
                    tracing::info!("database connection established");
                    (
                        Arc::new(ReservoirRepository::new(db_pool.clone())),
                        Arc::new(UserRepository::new(db_pool)),
                    )
                }
                None => {
                    tracing::warn!("DATABASE_URL not set, using in-memory stores");
                    (
                        Arc::new(InMemoryReservoirStore::new()),
                        Arc::new(InMemoryUserStore::new()),
                    )
                }
            };

        let state = Self::from_stores(
            reservoir_store.clone(),
            user_store.clone(),
            &config.token,
            config.bcrypt_cost,
        );

        if config.seed_sample_data {
            seed_sample_data(
                reservoir_store.as_ref(),
                user_store.as_ref(),
                &state.auth_service,
                chrono::Utc::now(),
            )
            .await?;
        }

        Ok(state)
    }
}

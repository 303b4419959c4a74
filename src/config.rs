// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{InMemoryInventoryStore, InventoryRepository, InventoryStore},
    services::{InventoryService, MovementLedger},
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub allow_negative_stock: bool,
    pub sku_case_sensitive: bool,
    pub recent_movements_limit: usize,
    pub history_page_size: usize,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            database_max_connections: 5,
            allow_negative_stock: false,
            sku_case_sensitive: true,
            recent_movements_limit: 20,
            history_page_size: 100,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de busca (facilita os testes).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: var("DATABASE_URL"),
            database_max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
            allow_negative_stock: parse_bool_or(&var, "ALLOW_NEGATIVE_STOCK", defaults.allow_negative_stock)?,
            sku_case_sensitive: parse_bool_or(&var, "SKU_CASE_SENSITIVE", defaults.sku_case_sensitive)?,
            recent_movements_limit: parse_or(&var, "RECENT_MOVEMENTS_LIMIT", defaults.recent_movements_limit)?,
            history_page_size: parse_or(&var, "HISTORY_PAGE_SIZE", defaults.history_page_size)?,
            request_timeout: Duration::from_secs(parse_or(
                &var,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: '{raw}'")),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(var: &F, key: &str, default: bool) -> anyhow::Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("invalid value for {key}: '{v}' (expected true/false)"),
        },
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub inventory_service: InventoryService,
    pub ledger: MovementLedger,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Conecta no banco (se configurado), roda as migrações e monta os serviços.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn InventoryStore> = match &settings.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(settings.database_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("failed to connect to the database")?;

                tracing::info!("database connection established");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("failed to run database migrations")?;

                tracing::info!("database migrations applied");
                Arc::new(InventoryRepository::new(db_pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using the in-memory store (data is lost on restart)");
                Arc::new(InMemoryInventoryStore::new())
            }
        };

        Ok(Self::with_store(store, settings))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(store: Arc<dyn InventoryStore>, settings: Settings) -> Self {
        let inventory_service = InventoryService::new(
            Arc::clone(&store),
            settings.sku_case_sensitive,
            settings.recent_movements_limit,
        );
        let ledger = MovementLedger::new(store, settings.allow_negative_stock, settings.history_page_size);

        Self {
            inventory_service,
            ledger,
            settings: Arc::new(settings),
        }
    }

    pub fn in_memory(settings: Settings) -> Self {
        Self::with_store(Arc::new(InMemoryInventoryStore::new()), settings)
    }
}

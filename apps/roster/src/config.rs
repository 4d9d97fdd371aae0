use std::env;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Runtime settings read from the environment (and `.env` via dotenv)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// PostgreSQL URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// Pool size for the PostgreSQL context
    pub max_connections: u32,
}

impl AppConfig {
    /// Reads `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        "Invalid DATABASE_MAX_CONNECTIONS, using default of {}",
                        DEFAULT_MAX_CONNECTIONS
                    );
                    DEFAULT_MAX_CONNECTIONS
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Self {
            database_url,
            max_connections,
        }
    }
}

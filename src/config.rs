use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Paddle webhook secret (`pdl_ntfset_...`). When unset, signature
    /// verification is skipped - only acceptable in development.
    pub webhook_secret: Option<String>,
    /// How many pre-migration backups to keep (-1 = all, 0 = disable backups).
    pub migration_backup_count: i32,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("BILLHOOK_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "billhook.db".to_string()),
            webhook_secret: env::var("PADDLE_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            migration_backup_count: env::var("MIGRATION_BACKUP_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

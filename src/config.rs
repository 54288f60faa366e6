use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub shopping_list_filename: String,
    pub log_filter: String,
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/foodgram.db".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            shopping_list_filename: "shopping_list.txt".to_string(),
            log_filter: "foodgram=debug,tower_http=info".to_string(),
            json_logs: false,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment, falling back to
    /// defaults for anything unset. Call `dotenvy::dotenv()` first to pick up
    /// a local `.env` file.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v
                .parse::<u16>()
                .map_err(|e| format!("APP_PORT must be a port number: {e}"))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: std::env::var("APP_HOST").unwrap_or(defaults.host),
            port,
            shopping_list_filename: std::env::var("SHOPPING_LIST_FILENAME")
                .unwrap_or(defaults.shopping_list_filename),
            log_filter: std::env::var("RUST_LOG").unwrap_or(defaults.log_filter),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v == "json")
                .unwrap_or(false),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("invalid bind address {}:{}: {e}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind_addr_parses() {
        let addr = AppConfig::default().bind_addr().unwrap();
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn bad_host_is_reported() {
        let config = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };
        assert!(config.bind_addr().unwrap_err().contains("invalid bind address"));
    }
}

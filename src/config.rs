use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    Missing(&'static str),
}

/// Everything the process reads from the environment, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub storage_url: String,
    pub storage_key: String,
    pub twitter_client_id: String,
    pub twitter_client_secret: String,
    pub redirect_url: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            bind_addr: dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            storage_url: dotenv::var("STORAGE_URL")
                .unwrap_or_else(|_| "http://localhost:54321/storage/v1".to_owned()),
            storage_key: dotenv::var("STORAGE_KEY").unwrap_or_default(),
            twitter_client_id: require("TWITTER_CLIENT_ID")?,
            twitter_client_secret: require("TWITTER_CLIENT_SECRET")?,
            redirect_url: dotenv::var("REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:8080/lockin".to_owned()),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    dotenv::var(name).map_err(|_| ConfigError::Missing(name))
}

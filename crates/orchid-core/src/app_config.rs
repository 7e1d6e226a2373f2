use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub provider_request_timeout_secs: u64,
    pub provider_user_agent: String,
    pub fallback_on_provider_error: bool,
    pub payment_intent_url: Option<String>,
    pub payment_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "provider_request_timeout_secs",
                &self.provider_request_timeout_secs,
            )
            .field("provider_user_agent", &self.provider_user_agent)
            .field(
                "fallback_on_provider_error",
                &self.fallback_on_provider_error,
            )
            .field("payment_intent_url", &self.payment_intent_url)
            .field(
                "payment_api_key",
                &self.payment_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

use std::sync::Arc;

use tracing::warn;

use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub env_vars: EnvVars,
}

#[derive(Clone, Debug)]
pub struct EnvVars {
    pub environment: Environment,
    pub mongodb_uri: Option<String>,
    pub port: u16,
    pub request_body_size_limit: usize,
    pub request_timeout_in_ms: u64,
    pub sentry_dsn: Option<String>,
}

#[derive(Clone, Debug)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                warn!(
                    "ENVIRONMENT value '{}' is not valid. Defaulting to 'production'.",
                    other
                );
                Environment::Production
            }
        }
    }
}

impl EnvVars {
    pub fn new() -> Self {
        // MONGODB_URI is optional: without it the service runs on the
        // process-lifetime in-memory store.
        let mongodb_uri = match std::env::var("MONGODB_URI") {
            Ok(uri) if !uri.is_empty() => Some(uri),
            _ => {
                warn!("MONGODB_URI not set. Using in-memory storage.");
                None
            }
        };

        let environment = match std::env::var("ENVIRONMENT") {
            Ok(v) => v.into(),
            Err(_e) => {
                warn!("ENVIRONMENT not set. Defaulting to 'production'.");
                Environment::Production
            }
        };

        let sentry_dsn = match std::env::var("SENTRY_DSN") {
            Ok(dsn_string) if !dsn_string.is_empty() => Some(dsn_string),
            _ => {
                warn!("SENTRY_DSN not set.");
                None
            }
        };

        let port = match std::env::var("PORT") {
            Ok(port_string) => port_string.parse().expect("PORT to be parseable as u16"),
            Err(_e) => {
                let default_port = 3000;
                warn!("PORT not set. Defaulting to {default_port}");
                default_port
            }
        };

        let request_timeout_in_ms = match std::env::var("REQUEST_TIMEOUT_IN_MS") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_TIMEOUT_IN_MS to be valid unsigned integer"),
            Err(_e) => {
                let default_request_timeout = 30_000;
                warn!("REQUEST_TIMEOUT_IN_MS not set. Defaulting to {default_request_timeout}");
                default_request_timeout
            }
        };

        let request_body_size_limit = match std::env::var("REQUEST_BODY_SIZE_LIMIT") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_BODY_SIZE_LIMIT to be valid unsigned integer"),
            Err(_e) => {
                let base: usize = 2;
                let exp = 20;
                let default_request_body_size_limit = 2 * base.pow(exp);
                warn!(
                    "REQUEST_BODY_SIZE_LIMIT not set. Defaulting to {default_request_body_size_limit}"
                );
                default_request_body_size_limit
            }
        };

        EnvVars {
            environment,
            mongodb_uri,
            port,
            request_body_size_limit,
            request_timeout_in_ms,
            sentry_dsn,
        }
    }
}

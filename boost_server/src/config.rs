use std::{env, io::Write};

use boost_common::{helpers::parse_boolean_flag, Secret};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_BSG_HOST: &str = "127.0.0.1";
const DEFAULT_BSG_PORT: u16 = 8460;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/boost_store.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
/// HS256 secrets shorter than this are rejected.
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub auth: AuthConfig,
    pub webhook: WebhookConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BSG_HOST.to_string(),
            port: DEFAULT_BSG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BSG_HOST").ok().unwrap_or_else(|| DEFAULT_BSG_HOST.into());
        let port = env::var("BSG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BSG_PORT. {e} Using the default, {DEFAULT_BSG_PORT}, instead."
                    );
                    DEFAULT_BSG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BSG_PORT);
        let database_url = env::var("BSG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BSG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = env::var("BSG_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .or_else(|| {
                        error!(
                            "🪛️ {s} is not a valid value for BSG_DB_MAX_CONNECTIONS. Using the default, \
                             {DEFAULT_MAX_CONNECTIONS}, instead."
                        );
                        None
                    })
            })
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let webhook = WebhookConfig::from_env_or_default();
        Self { host, port, database_url, max_connections, auth, webhook }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared secret used to verify (HS256) access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate in \
             production like this, since every token issued elsewhere will be rejected. 🚨️🚨️🚨️"
        );
        let secret = random_secret();
        match NamedTempFile::new().ok().and_then(|f| f.keep().ok()) {
            Some((mut f, p)) => match writeln!(f, "{secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, you \
                     are doing it wrong! Set the BSG_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => warn!("🪛️ Could not create a temporary file to store the JWT secret."),
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self { jwt_secret: Secret::new(secret.to_string()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("BSG_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [BSG_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "BSG_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(2 * MIN_JWT_SECRET_LENGTH).map(char::from).collect()
}

//-------------------------------------------------  WebhookConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// The key the payment provider signs its callbacks with.
    pub hmac_secret: Secret<String>,
    /// If false, callbacks are accepted without an HMAC check. **DANGER**
    pub hmac_checks: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { hmac_secret: Secret::default(), hmac_checks: true }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let hmac_secret = env::var("BSG_WEBHOOK_HMAC_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ BSG_WEBHOOK_HMAC_SECRET is not set. Please set it to the signing key shared with your payment \
                 provider."
            );
            String::default()
        });
        let hmac_checks = parse_boolean_flag(env::var("BSG_WEBHOOK_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🚨️ Webhook HMAC checks are DISABLED. Anyone can mark orders as paid.");
        }
        Self { hmac_secret: Secret::new(hmac_secret), hmac_checks }
    }
}

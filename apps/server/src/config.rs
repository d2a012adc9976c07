//! Service configuration.
//!
//! Layered: built-in defaults, then an optional config file (`PONS_CONFIG`,
//! default `config/pons.toml` if present), then environment variables with a
//! `PONS__` prefix (`PONS__FHIR__BASE_URL`, `PONS__PAYMENTS__KEY_ID`, ...).
//! A `.env` file is honored for local development.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub fhir: FhirConfig,
    pub payments: PaymentConfig,
    pub blobs: BlobConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means fully open; the ward and mobile
    /// apps are served from changing origins, so open is the deployed
    /// default.
    pub cors_origins: Vec<String>,
    pub max_request_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
            max_request_body_size: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides.
    pub level: String,
    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    pub deployment_environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,pons=debug".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "logs".to_string(),
            file_prefix: "pons-server".to_string(),
            deployment_environment: "development".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FhirConfig {
    /// Base URL of the external FHIR repository, without a trailing slash.
    pub base_url: String,
    /// Identity service tenant used for the client-credentials flow.
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    /// Explicit token endpoint; when unset it is derived from `tenant_id`.
    pub token_url: Option<String>,
    /// Pre-issued bearer token. Skips the identity service entirely; used by
    /// local development and the test suite.
    pub static_token: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for FhirConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            scope: String::new(),
            token_url: None,
            static_token: None,
            request_timeout_seconds: 30,
        }
    }
}

impl FhirConfig {
    pub fn token_url(&self) -> String {
        self.token_url.clone().unwrap_or_else(|| {
            format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
                self.tenant_id
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.razorpay.com".to_string(),
            key_id: String::new(),
            key_secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Storage account endpoint, e.g. `https://acct.blob.core.windows.net`.
    pub account_url: String,
    pub account_name: String,
    /// Shared key, base64 as issued by the storage portal.
    pub account_key: String,
    pub container: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            account_url: String::new(),
            account_name: String::new(),
            account_key: String::new(),
            container: "profile-picture".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub auto_complete_enabled: bool,
    /// Daily wall-clock run time for the medication auto-complete scan.
    pub auto_complete_hour: u32,
    pub auto_complete_minute: u32,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            auto_complete_enabled: true,
            auto_complete_hour: 0,
            auto_complete_minute: 5,
        }
    }
}

impl Config {
    /// Load configuration from defaults, optional file, and environment.
    pub fn load() -> anyhow::Result<Self> {
        // Best-effort .env for local development.
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();

        let config_path =
            std::env::var("PONS_CONFIG").unwrap_or_else(|_| "config/pons.toml".to_string());
        builder = builder.add_source(config::File::with_name(&config_path).required(false));

        builder = builder.add_source(
            config::Environment::with_prefix("PONS")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_origins")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.fhir.base_url.is_empty() {
            return Err("fhir.base_url must be set".to_string());
        }
        if self.fhir.base_url.ends_with('/') {
            return Err("fhir.base_url must not end with a slash".to_string());
        }
        if self.fhir.static_token.is_none()
            && (self.fhir.tenant_id.is_empty()
                || self.fhir.client_id.is_empty()
                || self.fhir.client_secret.is_empty())
        {
            return Err(
                "fhir.tenant_id, fhir.client_id and fhir.client_secret are required \
                 unless fhir.static_token is set"
                    .to_string(),
            );
        }
        if self.jobs.auto_complete_hour > 23 || self.jobs.auto_complete_minute > 59 {
            return Err("jobs.auto_complete_{hour,minute} out of range".to_string());
        }
        self.server
            .host
            .parse::<IpAddr>()
            .map_err(|_| format!("server.host is not an IP address: {}", self.server.host))?;
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self.server.host.parse()?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

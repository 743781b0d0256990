//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, DatabaseOverride, HashPasswordArgs, MigrateArgs, ServeArgs, ServeOverrides,
};

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "taproom";
const ENV_PREFIX: &str = "TAPROOM";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 15;
const DEFAULT_DB_MAX_LIFETIME_SECS: u64 = 3600;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ENVIRONMENT: &str = "development";
const PRODUCTION_ENVIRONMENT: &str = "production";
const MIN_SECRET_KEY_BYTES: usize = 16;
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_CLOUD_FOLDER_PREFIX: &str = "taproom";
const DEFAULT_FORM_RELAY_TIMEOUT_SECS: u64 = 10;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub security: SecuritySettings,
    pub admin: AdminSettings,
    pub uploads: UploadSettings,
    pub cloud_storage: Option<CloudStorageSettings>,
    pub forms: FormRelaySettings,
    pub integrations: IntegrationSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: NonZeroU32,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub secret_key: String,
    pub environment: String,
}

impl SecuritySettings {
    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION_ENVIRONMENT
    }
}

#[derive(Debug, Clone)]
pub struct AdminSettings {
    pub username: String,
    pub password_hash: Option<String>,
    pub dev_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub media_root: PathBuf,
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct CloudStorageSettings {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder_prefix: String,
}

#[derive(Debug, Clone)]
pub struct FormRelaySettings {
    pub musician_endpoint: Option<Url>,
    pub rental_endpoint: Option<Url>,
    pub contact_endpoint: Option<Url>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct IntegrationSettings {
    pub google_maps_api_key: Option<String>,
    pub openweather_api_key: Option<String>,
    pub google_places_api_key: Option<String>,
    pub yelp_api_key: Option<String>,
    pub facebook_access_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        Some(Command::HashPassword(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    security: RawSecuritySettings,
    admin: RawAdminSettings,
    uploads: RawUploadSettings,
    cloud_storage: RawCloudStorageSettings,
    forms: RawFormRelaySettings,
    integrations: RawIntegrationSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_database_override(&overrides.database);

        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(environment) = overrides.environment.as_ref() {
            self.security.environment = Some(environment.clone());
        }
        if let Some(root) = overrides.media_root.as_ref() {
            self.uploads.media_root = Some(root.clone());
        }
        if let Some(limit) = overrides.uploads_max_request_bytes {
            self.uploads.max_request_bytes = Some(limit);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            security,
            admin,
            uploads,
            cloud_storage,
            forms,
            integrations,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            security: build_security_settings(security)?,
            admin: build_admin_settings(admin)?,
            uploads: build_upload_settings(uploads)?,
            cloud_storage: build_cloud_storage_settings(cloud_storage)?,
            forms: build_form_relay_settings(forms)?,
            integrations: build_integration_settings(integrations),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url)
        .ok_or_else(|| LoadError::invalid("database.url", "a database URL is required"))?;

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    let lifetime_secs = database
        .max_lifetime_seconds
        .unwrap_or(DEFAULT_DB_MAX_LIFETIME_SECS);
    if lifetime_secs == 0 {
        return Err(LoadError::invalid(
            "database.max_lifetime_seconds",
            "must be greater than zero",
        ));
    }

    let acquire_secs = database
        .acquire_timeout_seconds
        .unwrap_or(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS);
    if acquire_secs == 0 {
        return Err(LoadError::invalid(
            "database.acquire_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(DatabaseSettings {
        url,
        max_connections,
        max_lifetime: Duration::from_secs(lifetime_secs),
        acquire_timeout: Duration::from_secs(acquire_secs),
    })
}

fn build_security_settings(security: RawSecuritySettings) -> Result<SecuritySettings, LoadError> {
    let secret_key = non_blank(security.secret_key).ok_or_else(|| {
        LoadError::invalid("security.secret_key", "a cookie signing secret is required")
    })?;
    if secret_key.len() < MIN_SECRET_KEY_BYTES {
        return Err(LoadError::invalid(
            "security.secret_key",
            format!("must be at least {MIN_SECRET_KEY_BYTES} bytes"),
        ));
    }

    let environment = non_blank(security.environment)
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

    Ok(SecuritySettings {
        secret_key,
        environment,
    })
}

fn build_admin_settings(admin: RawAdminSettings) -> Result<AdminSettings, LoadError> {
    let username =
        non_blank(admin.username).unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());

    let password_hash = non_blank(admin.password_hash);
    if let Some(hash) = password_hash.as_deref()
        && !hash.starts_with('$')
    {
        return Err(LoadError::invalid(
            "admin.password_hash",
            "expected a PHC string such as `$argon2id$...`",
        ));
    }

    Ok(AdminSettings {
        username,
        password_hash,
        dev_password: non_blank(admin.dev_password),
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let media_root = uploads
        .media_root
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT));
    if media_root.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "uploads.media_root",
            "path must not be empty",
        ));
    }

    let max_request_bytes_value = uploads
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("uploads.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(UploadSettings {
        media_root,
        max_request_bytes,
    })
}

fn build_cloud_storage_settings(
    cloud: RawCloudStorageSettings,
) -> Result<Option<CloudStorageSettings>, LoadError> {
    let folder_prefix = non_blank(cloud.folder_prefix)
        .unwrap_or_else(|| DEFAULT_CLOUD_FOLDER_PREFIX.to_string());

    match (
        non_blank(cloud.cloud_name),
        non_blank(cloud.api_key),
        non_blank(cloud.api_secret),
    ) {
        (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(Some(CloudStorageSettings {
            cloud_name,
            api_key,
            api_secret,
            folder_prefix,
        })),
        (None, None, None) => Ok(None),
        _ => Err(LoadError::invalid(
            "cloud_storage",
            "cloud_name, api_key and api_secret must be configured together",
        )),
    }
}

fn build_form_relay_settings(forms: RawFormRelaySettings) -> Result<FormRelaySettings, LoadError> {
    let timeout_secs = forms
        .timeout_seconds
        .unwrap_or(DEFAULT_FORM_RELAY_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "forms.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(FormRelaySettings {
        musician_endpoint: parse_endpoint(forms.musician_endpoint, "forms.musician_endpoint")?,
        rental_endpoint: parse_endpoint(forms.rental_endpoint, "forms.rental_endpoint")?,
        contact_endpoint: parse_endpoint(forms.contact_endpoint, "forms.contact_endpoint")?,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_integration_settings(integrations: RawIntegrationSettings) -> IntegrationSettings {
    IntegrationSettings {
        google_maps_api_key: non_blank(integrations.google_maps_api_key),
        openweather_api_key: non_blank(integrations.openweather_api_key),
        google_places_api_key: non_blank(integrations.google_places_api_key),
        yelp_api_key: non_blank(integrations.yelp_api_key),
        facebook_access_token: non_blank(integrations.facebook_access_token),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    max_lifetime_seconds: Option<u64>,
    acquire_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSecuritySettings {
    secret_key: Option<String>,
    environment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAdminSettings {
    username: Option<String>,
    password_hash: Option<String>,
    dev_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    media_root: Option<PathBuf>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCloudStorageSettings {
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    folder_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFormRelaySettings {
    musician_endpoint: Option<String>,
    rental_endpoint: Option<String>,
    contact_endpoint: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawIntegrationSettings {
    google_maps_api_key: Option<String>,
    openweather_api_key: Option<String>,
    google_places_api_key: Option<String>,
    yelp_api_key: Option<String>,
    facebook_access_token: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_endpoint(value: Option<String>, key: &'static str) -> Result<Option<Url>, LoadError> {
    non_blank(value)
        .map(|raw| {
            let url = Url::parse(&raw)
                .map_err(|err| LoadError::invalid(key, format!("invalid URL `{raw}`: {err}")))?;
            match url.scheme() {
                "http" | "https" => Ok(url),
                other => Err(LoadError::invalid(
                    key,
                    format!("unsupported scheme `{other}`"),
                )),
            }
        })
        .transpose()
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

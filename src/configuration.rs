use crate::auth::MIN_SECRET_BYTES;
use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub cookie: CookieSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// One day
const MAX_ACCESS_TOKEN_EXPIRY: i64 = 24 * 60 * 60;
/// One year
const MAX_REFRESH_TOKEN_EXPIRY: i64 = 365 * 24 * 60 * 60;

/// Token issuance settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64, // seconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Rotate through compare-and-save instead of last-write-wins
    #[serde(default)]
    pub strict_rotation: bool,
}

impl JwtSettings {
    /// Check values that would make every issued credential unusable
    ///
    /// # Errors
    /// Returns `ConfigError` describing the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.issuer".to_string()));
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.audience".to_string()));
        }
        if !(1..=MAX_ACCESS_TOKEN_EXPIRY).contains(&self.access_token_expiry) {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.access_token_expiry must be between 1 and {} seconds",
                MAX_ACCESS_TOKEN_EXPIRY
            )));
        }
        if !(1..=MAX_REFRESH_TOKEN_EXPIRY).contains(&self.refresh_token_expiry) {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.refresh_token_expiry must be between 1 and {} seconds",
                MAX_REFRESH_TOKEN_EXPIRY
            )));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.store_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cookie transport settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct CookieSettings {
    #[serde(default = "default_access_cookie")]
    pub access_cookie_name: String,
    #[serde(default = "default_refresh_cookie")]
    pub refresh_cookie_name: String,
    /// Only disable for plain-http local development
    #[serde(default = "default_secure")]
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            access_cookie_name: default_access_cookie(),
            refresh_cookie_name: default_refresh_cookie(),
            secure: default_secure(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_token_expiry() -> i64 {
    30 * 60
}

fn default_refresh_token_expiry() -> i64 {
    5 * 60 * 60
}

fn default_store_timeout_ms() -> u64 {
    2_000
}

fn default_access_cookie() -> String {
    "accessToken".to_string()
}

fn default_refresh_cookie() -> String {
    "refreshToken".to_string()
}

fn default_secure() -> bool {
    true
}

/// Load settings from `configuration.yaml` and `APP__`-prefixed environment variables
///
/// `APP__JWT__SECRET=...` overrides `jwt.secret`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(settings.try_deserialize::<Settings>()?)
}

#[cfg(test)]
pub(crate) fn test_jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "test-secret-key-at-least-32-characters-long".to_string(),
        issuer: "test-issuer".to_string(),
        audience: "test-audience".to_string(),
        access_token_expiry: default_access_token_expiry(),
        refresh_token_expiry: default_refresh_token_expiry(),
        store_timeout_ms: default_store_timeout_ms(),
        strict_rotation: false,
    }
}

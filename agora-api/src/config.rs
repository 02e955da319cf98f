//! Configuration system for the Agora HTTP services.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/agora-api/config.toml`)
//! 4. Compiled defaults
//!
//! The service to run is always chosen on the command line.

use std::path::PathBuf;

/// Signing secret used when none is configured. Only fit for development.
pub const DEFAULT_JWT_SECRET: &str = "agora-development-secret";

/// Default JWT lifetime: seven days.
pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 7 * 24;

/// Errors that can occur when loading API configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiConfigFile {
    server: ServerFileConfig,
    auth: AuthFileConfig,
    talker: TalkerFileConfig,
    cookbook: CookbookFileConfig,
}

/// `[server]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

/// `[auth]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AuthFileConfig {
    jwt_secret: Option<String>,
    token_ttl_hours: Option<u64>,
}

/// `[talker]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TalkerFileConfig {
    data_file: Option<PathBuf>,
}

/// `[cookbook]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct CookbookFileConfig {
    uploads_dir: Option<PathBuf>,
    admin: Option<AdminSeed>,
}

/// Administrator account created when the cookbook service starts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct AdminSeed {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Plain-text password, hashed before it is stored.
    pub password: String,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// Which service the binary runs.
#[derive(clap::Subcommand, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Service {
    /// Products and sales with stock bookkeeping.
    #[default]
    Inventory,
    /// Speaker CRUD backed by a JSON file.
    Talker,
    /// Users, recipes and image upload.
    Cookbook,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Inventory => "inventory",
            Self::Talker => "talker",
            Self::Cookbook => "cookbook",
        })
    }
}

/// CLI arguments for the API binary.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Agora HTTP services")]
pub struct ApiCliArgs {
    /// Service to run.
    #[command(subcommand)]
    pub service: Service,

    /// Address to bind the server to.
    #[arg(short, long, global = true, env = "API_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/agora-api/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "API_LOG")]
    pub log_level: Option<String>,

    /// Also write logs to this file.
    #[arg(long, global = true, env = "API_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// HS256 secret for cookbook tokens.
    #[arg(long, global = true, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// JSON file holding the talker list.
    #[arg(long, global = true, env = "TALKER_FILE")]
    pub talker_file: Option<PathBuf>,

    /// Directory recipe images are written to and served from.
    #[arg(long, global = true, env = "UPLOADS_DIR")]
    pub uploads_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Service to run.
    pub service: Service,
    /// Address to bind the server to (e.g., `0.0.0.0:3000`).
    pub bind_addr: String,
    /// Log level filter string.
    pub log_level: String,
    /// Optional log file.
    pub log_file: Option<PathBuf>,
    /// HS256 signing secret.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: u64,
    /// Talker data file.
    pub talker_file: PathBuf,
    /// Recipe image directory.
    pub uploads_dir: PathBuf,
    /// Administrator to create at cookbook startup.
    pub admin_seed: Option<AdminSeed>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service: Service::default(),
            bind_addr: "0.0.0.0:3000".to_string(),
            log_level: "info".to_string(),
            log_file: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            talker_file: PathBuf::from("talker.json"),
            uploads_dir: PathBuf::from("uploads"),
            admin_seed: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and a missing
    /// file is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &ApiCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &ApiCliArgs, file: ApiConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            service: cli.service,
            bind_addr: cli
                .bind
                .clone()
                .or(file.server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            log_level: cli
                .log_level
                .clone()
                .or(file.server.log_level)
                .unwrap_or(defaults.log_level),
            log_file: cli.log_file.clone().or(file.server.log_file),
            jwt_secret: cli
                .jwt_secret
                .clone()
                .or(file.auth.jwt_secret)
                .unwrap_or(defaults.jwt_secret),
            token_ttl_hours: file
                .auth
                .token_ttl_hours
                .unwrap_or(defaults.token_ttl_hours),
            talker_file: cli
                .talker_file
                .clone()
                .or(file.talker.data_file)
                .unwrap_or(defaults.talker_file),
            uploads_dir: cli
                .uploads_dir
                .clone()
                .or(file.cookbook.uploads_dir)
                .unwrap_or(defaults.uploads_dir),
            admin_seed: file.cookbook.admin,
        }
    }

    /// Returns `true` when tokens are signed with [`DEFAULT_JWT_SECRET`].
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ApiConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ApiConfigFile::default());
    };
    let path = config_dir.join("agora-api").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ApiConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}

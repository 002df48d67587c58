use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub handlers: HandlerConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Allowed CORS origins. Defaults to localhost dev ports.
    /// Set FITAI__SERVER__CORS_ALLOWED_ORIGINS in production.
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
}

/// Filesystem roots the front controller resolves requests against.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Public tree: static assets and the SPA shell.
    #[serde(default = "default_public_root")]
    pub public_root: PathBuf,
    /// User uploads, kept outside the public tree.
    #[serde(default = "default_uploads_root")]
    pub uploads_root: PathBuf,
    /// Handler scripts addressed by `/api/...`.
    #[serde(default = "default_api_root")]
    pub api_root: PathBuf,
    /// SPA shell document, relative to `public_root`.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl PathsConfig {
    pub fn index_path(&self) -> PathBuf {
        self.public_root.join(&self.index_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    /// CGI interpreter used to run handler scripts.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Extension appended to handler paths that lack it (no leading dot).
    #[serde(default = "default_extension")]
    pub default_extension: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    /// A missing upload falls through to static/SPA handling. Set to false
    /// to answer it with a plain 404 instead.
    #[serde(default = "default_missing_falls_through")]
    pub missing_falls_through: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_planner_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_planner_port")]
    pub port: u16,
}

fn default_bind() -> String { "0.0.0.0".to_string() }
fn default_server_port() -> u16 { 8080 }
fn default_planner_port() -> u16 { 8001 }
fn default_planner_enabled() -> bool { true }
fn default_public_root() -> PathBuf { PathBuf::from("./public") }
fn default_uploads_root() -> PathBuf { PathBuf::from("./uploads") }
fn default_api_root() -> PathBuf { PathBuf::from("./api") }
fn default_index_file() -> String { "index.html".to_string() }
fn default_interpreter() -> String { "php-cgi".to_string() }
fn default_extension() -> String { "php".to_string() }
fn default_missing_falls_through() -> bool { true }
fn default_timeout_secs() -> u64 { 30 }
fn default_max_body_bytes() -> usize { 10 * 1024 * 1024 }
fn default_cors_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:8080".to_string(),
        "http://127.0.0.1:8080".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_server_port(),
            cors_allowed_origins: default_cors_allowed_origins(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            public_root: default_public_root(),
            uploads_root: default_uploads_root(),
            api_root: default_api_root(),
            index_file: default_index_file(),
        }
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            default_extension: default_extension(),
            timeout_secs: default_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            missing_falls_through: default_missing_falls_through(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enabled: default_planner_enabled(),
            bind: default_bind(),
            port: default_planner_port(),
        }
    }
}

pub fn validate(cfg: &Config) -> Result<()> {
    if !cfg.paths.public_root.is_dir() {
        anyhow::bail!(
            "CONFIG ERROR: public root does not exist: {}",
            cfg.paths.public_root.display()
        );
    }

    let ext = &cfg.handlers.default_extension;
    if ext.is_empty() || ext.contains(['.', '/', '\\']) {
        anyhow::bail!(
            "CONFIG ERROR: handlers.default_extension must be a bare extension such as \"php\" (got {:?})",
            ext
        );
    }

    if cfg.handlers.timeout_secs == 0 {
        anyhow::bail!("CONFIG ERROR: handlers.timeout_secs must be greater than zero");
    }

    if cfg.handlers.interpreter.trim().is_empty() {
        anyhow::bail!("CONFIG ERROR: handlers.interpreter must not be empty");
    }

    // Missing optional roots only degrade to 404s.
    if !cfg.paths.api_root.is_dir() {
        tracing::warn!(
            "API root {} does not exist; every /api/ request will return 404",
            cfg.paths.api_root.display()
        );
    }
    if !cfg.paths.uploads_root.is_dir() {
        tracing::warn!("Uploads root {} does not exist", cfg.paths.uploads_root.display());
    }
    if !cfg.paths.index_path().is_file() {
        tracing::warn!(
            "SPA shell {} is missing; fallback requests will return 404",
            cfg.paths.index_path().display()
        );
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

pub fn load() -> Result<Config> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix("FITAI")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_allowed_origins")
                .try_parsing(true),
        )
        .set_default("server.bind", default_bind())?
        .set_default("server.port", 8080)?
        .set_default("paths.public_root", "./public")?
        .set_default("paths.uploads_root", "./uploads")?
        .set_default("paths.api_root", "./api")?
        .set_default("paths.index_file", default_index_file())?
        .set_default("handlers.interpreter", default_interpreter())?
        .set_default("handlers.default_extension", default_extension())?
        .set_default("handlers.timeout_secs", 30)?
        .set_default("handlers.max_body_bytes", 10 * 1024 * 1024)?
        .set_default("uploads.missing_falls_through", default_missing_falls_through())?
        .set_default("planner.enabled", default_planner_enabled())?
        .set_default("planner.bind", default_bind())?
        .set_default("planner.port", 8001)?
        .build()?
        .try_deserialize()?;

    validate(&cfg)?;

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_public(root: &std::path::Path) -> Config {
        Config {
            paths: PathsConfig {
                public_root: root.to_path_buf(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_match_legacy_layout() {
        let cfg = Config::default();
        assert_eq!(cfg.handlers.default_extension, "php");
        assert_eq!(cfg.handlers.interpreter, "php-cgi");
        assert_eq!(cfg.paths.index_path(), PathBuf::from("./public/index.html"));
        assert!(cfg.uploads.missing_falls_through);
    }

    #[test]
    fn test_validate_accepts_existing_public_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate(&config_with_public(dir.path())).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_public_root() {
        let cfg = config_with_public(std::path::Path::new("/definitely/not/here"));
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_dotted_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_with_public(dir.path());
        cfg.handlers.default_extension = ".php".to_string();
        assert!(validate(&cfg).is_err());

        cfg.handlers.default_extension = String::new();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_with_public(dir.path());
        cfg.handlers.timeout_secs = 0;
        assert!(validate(&cfg).is_err());
    }
}

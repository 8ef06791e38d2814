use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{env, path::PathBuf};

/// Which family of store clients the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// DynamoDB + S3 + PostgreSQL (RDS).
    Aws,
    /// SQLite + local filesystem, for development and tests.
    Local,
}

/// Connection settings for the relational access-log store.
#[derive(Clone)]
pub struct RdsConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for RdsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdsConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub s3_bucket: String,
    /// Present only for the `aws` backend.
    pub rds: Option<RdsConfig>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Product catalogue API")]
pub struct Args {
    /// Host to bind to (overrides PRODUCT_API_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PRODUCT_API_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Store backend (overrides PRODUCT_API_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Data directory for the local backend (overrides PRODUCT_API_DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge parsed args over values found through `lookup`.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_host = lookup("PRODUCT_API_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = parse_var(&lookup, "PRODUCT_API_PORT", 5000)?;
        let env_backend = match lookup("PRODUCT_API_BACKEND") {
            Some(value) => Backend::from_str(&value, true)
                .map_err(|err| anyhow::anyhow!(err))
                .with_context(|| format!("parsing PRODUCT_API_BACKEND value `{}`", value))?,
            None => Backend::Aws,
        };
        let env_data_dir = lookup("PRODUCT_API_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let backend = args.backend.unwrap_or(env_backend);

        let (s3_bucket, rds) = match backend {
            Backend::Aws => {
                let bucket = required(&lookup, "S3_BUCKET")?;
                let rds = RdsConfig {
                    host: required(&lookup, "RDS_HOST")?,
                    port: parse_var(&lookup, "RDS_PORT", 5432)?,
                    database: required(&lookup, "RDS_DB")?,
                    user: required(&lookup, "RDS_USER")?,
                    password: required(&lookup, "RDS_PASSWORD")?,
                };
                (bucket, Some(rds))
            }
            Backend::Local => (
                lookup("S3_BUCKET").unwrap_or_else(|| "local-products".into()),
                None,
            ),
        };

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            backend,
            data_dir: args.data_dir.unwrap_or(env_data_dir),
            s3_bucket,
            rds,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!("{} must be set for the aws backend", name),
    }
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u16) -> Result<u16> {
    match lookup(name) {
        Some(value) => value
            .parse::<u16>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        None => Ok(default),
    }
}

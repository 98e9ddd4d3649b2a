use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub media: MediaConfig,
}

/// Credentials and endpoint for the remote media host.
#[derive(Clone)]
pub struct MediaConfig {
    pub base_url: String,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
}

impl MediaConfig {
    /// All three credentials are present.
    pub fn is_configured(&self) -> bool {
        self.cloud_name.is_some() && self.api_key.is_some() && self.api_secret.is_some()
    }
}

// The secret must never reach the startup log.
impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("base_url", &self.base_url)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("folder", &self.folder)
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Content management API for posts, categories and media")]
pub struct Args {
    /// Host to bind to (overrides CMS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides CMS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides CMS_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Folder on the media host that uploads land in (overrides CLOUDINARY_FOLDER)
    #[arg(long)]
    pub media_folder: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::resolve(args, |key| env::var(key).ok())?;
        Ok((cfg, migrate))
    }

    /// Merge CLI args over values looked up through `lookup`, then defaults.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = lookup("CMS_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match lookup("CMS_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing CMS_PORT value `{}`", value))?,
            None => 3000,
        };
        let env_db = lookup("CMS_DATABASE_URL").unwrap_or_else(|| "sqlite://./data/cms.db".into());
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let media = MediaConfig {
            base_url: non_empty("CLOUDINARY_BASE_URL")
                .unwrap_or_else(|| "https://api.cloudinary.com".into()),
            cloud_name: non_empty("CLOUDINARY_CLOUD_NAME"),
            api_key: non_empty("CLOUDINARY_API_KEY"),
            api_secret: non_empty("CLOUDINARY_API_SECRET"),
            folder: args
                .media_folder
                .or_else(|| non_empty("CLOUDINARY_FOLDER"))
                .unwrap_or_else(|| "uploads".into()),
        };

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            media,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

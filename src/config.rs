use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable origin used when building thumbnail URLs.
    pub public_base_url: String,
    pub assets_root: PathBuf,
    pub database_url: String,
    pub jwt_secret: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    /// Base URL of the CDN distribution fronting the bucket.
    pub distribution_base: String,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Thumbnail and video upload API")]
pub struct Args {
    /// Host to bind to (overrides TUBELY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides TUBELY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Public origin for asset URLs (overrides TUBELY_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Directory where thumbnails are stored (overrides TUBELY_ASSETS_ROOT)
    #[arg(long)]
    pub assets_root: Option<PathBuf>,

    /// Database URL (overrides TUBELY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Bucket receiving processed videos (overrides TUBELY_S3_BUCKET)
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// Bucket region (overrides TUBELY_S3_REGION)
    #[arg(long)]
    pub s3_region: Option<String>,

    /// Custom S3-compatible endpoint (overrides TUBELY_S3_ENDPOINT)
    #[arg(long)]
    pub s3_endpoint: Option<String>,

    /// Distribution base URL for video links (overrides TUBELY_DISTRIBUTION_BASE)
    #[arg(long)]
    pub distribution_base: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::resolve(args, |key| env::var(key))?, migrate))
    }

    /// Merge parsed arguments over values looked up through `lookup`.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |key: &str| -> Result<Option<String>> {
            match lookup(key) {
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", key)),
            }
        };

        let env_port = match var("TUBELY_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing TUBELY_PORT value `{}`", value))?,
            None => 8091,
        };
        let port = args.port.unwrap_or(env_port);

        let jwt_secret = match var("TUBELY_JWT_SECRET")? {
            Some(secret) if !secret.is_empty() => secret,
            _ => bail!("TUBELY_JWT_SECRET must be set"),
        };
        let s3_bucket = match args.s3_bucket.or(var("TUBELY_S3_BUCKET")?) {
            Some(bucket) => bucket,
            None => bail!("TUBELY_S3_BUCKET must be set"),
        };
        let distribution_base = match args
            .distribution_base
            .or(var("TUBELY_DISTRIBUTION_BASE")?)
        {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => bail!("TUBELY_DISTRIBUTION_BASE must be set"),
        };

        let public_base_url = args
            .public_base_url
            .or(var("TUBELY_PUBLIC_BASE_URL")?)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Ok(Self {
            host: args
                .host
                .or(var("TUBELY_HOST")?)
                .unwrap_or_else(|| "0.0.0.0".into()),
            port,
            public_base_url,
            assets_root: args
                .assets_root
                .or(var("TUBELY_ASSETS_ROOT")?.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("./assets")),
            database_url: args
                .database_url
                .or(var("TUBELY_DATABASE_URL")?)
                .unwrap_or_else(|| "sqlite://./data/tubely.db".into()),
            jwt_secret,
            s3_bucket,
            s3_region: args
                .s3_region
                .or(var("TUBELY_S3_REGION")?)
                .unwrap_or_else(|| "us-east-1".into()),
            s3_endpoint: args.s3_endpoint.or(var("TUBELY_S3_ENDPOINT")?),
            distribution_base,
            ffprobe_path: var("TUBELY_FFPROBE_PATH")?.unwrap_or_else(|| "ffprobe".into()),
            ffmpeg_path: var("TUBELY_FFMPEG_PATH")?.unwrap_or_else(|| "ffmpeg".into()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

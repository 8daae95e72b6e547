use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{io::ErrorKind, str::FromStr, sync::Arc};
use tokio::{fs, net::TcpListener};
use tracing_subscriber::EnvFilter;
use tubely::{
    config::AppConfig,
    services::{
        assets::LocalAssets, blob_store::BlobStore, media::Ffmpeg,
        video_repository::{self, VideoRepository},
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;
    tracing::info!(
        addr = %cfg.addr(),
        assets_root = %cfg.assets_root.display(),
        bucket = %cfg.s3_bucket,
        "Starting tubely"
    );

    // --- Ensure assets directory exists ---
    if !cfg.assets_root.exists() {
        fs::create_dir_all(&cfg.assets_root).await?;
        tracing::info!("Created assets directory at {}", cfg.assets_root.display());
    }

    // --- Initialize SQLite connection ---
    let connect_options = SqliteConnectOptions::from_str(&cfg.database_url)
        .with_context(|| format!("parsing database URL `{}`", cfg.database_url))?
        .create_if_missing(true);
    let db_path = connect_options.get_filename().to_path_buf();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }
    tracing::debug!("Interpreted SQLite path => {}", db_path.display());

    let db = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?,
    );

    // --- Handle migration mode ---
    if migrate {
        video_repository::migrate(&db).await?;
        tracing::info!("Database migration complete.");
        return Ok(());
    }

    // --- Initialize services ---
    let blobs = BlobStore::s3(
        &cfg.s3_bucket,
        &cfg.s3_region,
        cfg.s3_endpoint.as_deref(),
        &cfg.distribution_base,
    )?;
    let state = AppState {
        videos: VideoRepository::new(db),
        assets: LocalAssets::new(cfg.assets_root.clone(), cfg.public_base_url.clone()),
        blobs,
        media: Arc::new(Ffmpeg::new(cfg.ffprobe_path.clone(), cfg.ffmpeg_path.clone())),
        config: Arc::new(cfg.clone()),
    };

    // --- Build router ---
    let app = tubely::app(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

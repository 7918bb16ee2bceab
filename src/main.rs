use clap::Parser;
use seedance_gateway::config::{DEFAULT_MODEL, DEFAULT_REPLICATE_BASE_URL, ServerConfig};
use seedance_gateway::{AppState, server};
use std::path::PathBuf;
use tokio::signal;

#[derive(Debug, Parser)]
#[command(name = "seedance-gateway", about = "Text-to-video generation backend")]
struct Cli {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Replicate API token
    #[arg(long, env = "REPLICATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "REPLICATE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "REPLICATE_BASE_URL", default_value = DEFAULT_REPLICATE_BASE_URL)]
    replicate_base_url: String,

    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    /// Bound on fetching the generated video, in seconds
    #[arg(long, default_value_t = 60)]
    download_timeout_secs: u64,

    /// Bound on the provider call, in seconds (unbounded when omitted)
    #[arg(long)]
    inference_timeout_secs: Option<u64>,

    /// Maximum concurrent provider calls
    #[arg(long, default_value_t = 4)]
    inference_workers: usize,

    #[arg(long, default_value_t = 500)]
    max_download_mb: u64,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        ServerConfig {
            host: cli.host,
            port: cli.port,
            api_key: cli.api_key,
            model: cli.model,
            replicate_base_url: cli.replicate_base_url,
            upload_dir: cli.upload_dir,
            static_dir: cli.static_dir,
            download_timeout: cli.download_timeout_secs,
            inference_timeout: cli.inference_timeout_secs,
            inference_workers: cli.inference_workers,
            max_download_mb: cli.max_download_mb,
            log_level: cli.log_level,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from(Cli::parse());
    server::init_logging(&config.log_level);

    let app_state = AppState::new(config.clone())?;
    actix_web::rt::System::new().block_on(async move {
        tokio::select! {
            res = server::startup(config, app_state) => res,
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down");
                Ok(())
            }
        }
    })?;
    Ok(())
}

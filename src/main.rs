use clap::Parser;
use passport_mrz::config::Config;
use passport_mrz::preprocessing::Preset;
use passport_mrz::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "passport-mrz-server")]
#[command(about = "Passport MRZ scanning server")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "MRZ_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "MRZ_PORT", default_value = "9393")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 10MB)
    #[arg(long, env = "MRZ_MAX_FILE_SIZE", default_value = "10485760")]
    pub max_file_size: usize,

    /// Engine used when a request does not name one (default: first available)
    #[arg(long, env = "MRZ_DEFAULT_ENGINE")]
    pub default_engine: Option<String>,

    /// Preprocessing preset: none, minimal, mrz, aggressive
    #[arg(long, env = "MRZ_PRESET", default_value = "mrz")]
    pub preset: Preset,

    /// Path to tessdata directory (downloaded to the user cache if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            default_engine: args.default_engine,
            preset: args.preset,
            tessdata_path: args.tessdata_path,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from(args);

    tracing::info!(
        "Starting passport-mrz-server v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        "Binding to {}:{} (preset: {})",
        config.host,
        config.port,
        config.preset
    );

    server::run(config).await
}

use clap::{Parser, Subcommand};
use lib::handler::{FunctionInput, FunctionOutput};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "newsletter")]
#[command(
    about = "Newsletter automation: copy reacted-to Slack messages into canvas sections",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory with a default config and an editable channel
    /// directory (channels.json).
    Init {
        /// Config file path (default: NEWSLETTER_CONFIG_PATH or ~/.newsletter/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the parse-message function once and print its output JSON.
    Run {
        /// Config file path (default: NEWSLETTER_CONFIG_PATH or ~/.newsletter/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Channel id of the reacted-to message (e.g. C0123ABC).
        #[arg(long, value_name = "ID")]
        channel_id: String,

        /// Channel name used for the directory lookup (e.g. "#kultura").
        #[arg(long, value_name = "NAME")]
        channel_name: String,

        /// Timestamp of the reacted-to message.
        #[arg(long, value_name = "TS")]
        message_ts: String,

        /// Target canvas (default: canvas.defaultCanvasId from config).
        #[arg(long, value_name = "ID")]
        canvas_id: Option<String>,
    },

    /// Serve the function over HTTP (POST /functions/parse_message).
    Serve {
        /// Config file path (default: NEWSLETTER_CONFIG_PATH or ~/.newsletter/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 15152)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Print the Slack app manifest (scopes and function schema) as JSON.
    Manifest {
        /// Config file path; canvas_id is optional in the schema when it sets a default canvas.
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("newsletter {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run {
            config,
            channel_id,
            channel_name,
            message_ts,
            canvas_id,
        }) => {
            let input = FunctionInput {
                channel_id,
                channel_name,
                message_ts,
                canvas_id,
            };
            match run_once(config, input).await {
                Ok(output) => {
                    if output.is_error() {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    log::error!("run failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("server failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Manifest { config }) => {
            if let Err(e) = run_manifest(config) {
                log::error!("manifest failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

fn run_manifest(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let default_canvas = config
        .canvas
        .default_canvas_id
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    let manifest = lib::manifest::manifest(default_canvas);
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

async fn run_once(
    config_path: Option<PathBuf>,
    input: FunctionInput,
) -> anyhow::Result<FunctionOutput> {
    let (config, path) = lib::config::load_config(config_path)?;
    let state = lib::server::ServerState::from_config(&config, &path)?;
    let output = state.handler.handle(state.workspace.as_ref(), &input).await;
    println!("{}", serde_json::to_string(&output)?);
    Ok(output)
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!(
        "starting function server on {}:{}",
        config.server.bind,
        config.server.port
    );
    lib::server::run_server(config, path).await
}

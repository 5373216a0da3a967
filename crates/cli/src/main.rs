use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wa-relay")]
#[command(about = "WhatsApp webhook to completion API relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config.json (existing files are kept).
    Init {
        /// Config file path (default: WA_RELAY_CONFIG_PATH or ~/.wa-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook gateway. Requires the verify token, WhatsApp token and phone-number id, and the completion API key (config or env).
    Gateway {
        /// Config file path (default: WA_RELAY_CONFIG_PATH or ~/.wa-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8080)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send one message through the configured prompt and completion service and print the reply. Nothing is sent to WhatsApp.
    Ask {
        /// Config file path (default: WA_RELAY_CONFIG_PATH or ~/.wa-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Message text, as a WhatsApp user would send it.
        text: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("wa-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask { config, text }) => {
            if let Err(e) = run_ask(config, text).await {
                log::error!("ask failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

async fn run_ask(config_path: Option<std::path::PathBuf>, text: String) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let api_key = lib::config::resolve_completion_api_key(&config).ok_or_else(|| {
        anyhow::anyhow!("completion.apiKey (OPENAI_API_KEY) is not configured")
    })?;
    let client = lib::llm::OpenAiClient::new(
        Some(config.completion.base_url.clone()),
        api_key,
        Some(config.completion.model.clone()),
    );
    let prompt = config.completion.prompt_template().render(&text);
    let reply = client.chat(&prompt).await?;
    println!("{}", reply.trim());
    Ok(())
}

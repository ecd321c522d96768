use clap::{Parser, Subcommand};
use conversation::config::{self, Config};
use conversation::{ConversationClient, MessageRequest, MessageResponse, ReqwestTransport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "converse")]
#[command(about = "Converse CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a template config file to fill in with credentials.
    Init {
        /// Config file path (default: CONVERSE_CONFIG_PATH or ~/.converse/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Send a single message to the workspace and print the reply.
    Message {
        /// Text to send.
        #[arg(long, short)]
        text: String,

        /// Config file path (default: CONVERSE_CONFIG_PATH or ~/.converse/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Print the full response JSON instead of the output text.
        #[arg(long)]
        json: bool,

        /// Ask the service for alternate intents.
        #[arg(long)]
        alternate_intents: bool,
    },

    /// Chat with the workspace (interactive). Context is carried between turns.
    Chat {
        /// Config file path (default: CONVERSE_CONFIG_PATH or ~/.converse/config.json)
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
            println!("converse {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Message {
            text,
            config,
            json,
            alternate_intents,
        }) => {
            if let Err(e) = run_message(config, text, json, alternate_intents).await {
                log::error!("message failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config }) => {
            if let Err(e) = run_chat(config).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    conversation::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", path.display());
    Ok(())
}

fn build_client(config: &Config) -> anyhow::Result<ConversationClient<ReqwestTransport>> {
    let credentials = config::resolve_credentials(config)?;
    let mut client = ConversationClient::new(credentials, ReqwestTransport::new())
        .with_base_url(config.service.base_url.clone());
    if let Some(timeout) = config.service.timeout() {
        client = client.with_timeout(timeout);
    }
    Ok(client)
}

fn print_reply(response: &MessageResponse) {
    for line in &response.output.text {
        println!("< {}", line.trim());
    }
    if let Some(intent) = response.top_intent() {
        log::info!("intent #{} ({:.2})", intent.intent, intent.confidence);
    }
}

async fn run_message(
    config_path: Option<PathBuf>,
    text: String,
    json: bool,
    alternate_intents: bool,
) -> anyhow::Result<()> {
    let (config, path) = config::load_config(config_path)?;
    log::debug!("using config {}", path.display());
    let client = build_client(&config)?;

    let request = MessageRequest::new(text).with_alternate_intents(alternate_intents);
    let response = client.send_message(&request).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_reply(&response);
    }
    Ok(())
}

async fn run_chat(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, _) = config::load_config(config_path)?;
    let client = build_client(&config)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        if input.eq_ignore_ascii_case("/reset") {
            client.reset();
            println!("(new conversation)");
            continue;
        }

        let request = client.continue_with(input);
        match client.send_message(&request).await {
            Ok(response) => print_reply(&response),
            Err(e) => {
                eprintln!("chat error: {}", e);
                if e.is_retryable() {
                    eprintln!("(temporary failure; send the message again to retry)");
                }
            }
        }
    }

    Ok(())
}

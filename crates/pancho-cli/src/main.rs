mod cmd;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pancho",
    about = "Propose, approve and execute agentic actions before they expire",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./pancho.yaml, defaults used when missing)
    #[arg(long, global = true, env = "PANCHO_CONFIG")]
    config: Option<PathBuf>,

    /// Action service base URL (overrides the config file)
    #[arg(long, global = true, env = "PANCHO_BASE_URL")]
    base_url: Option<String>,

    /// Session identifier sent as x-session-id (overrides the config file)
    #[arg(long, global = true, env = "PANCHO_SESSION")]
    session: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the service to plan actions for a goal
    Plan {
        /// What the agent should accomplish
        goal: String,
    },

    /// Propose a single signed note for approval
    Propose {
        /// Note content
        content: String,

        /// Author public key (hex); defaults to the signer's key
        #[arg(long)]
        pubkey: Option<String>,

        /// Event tag as key=value (repeatable)
        #[arg(long = "tag", value_name = "KEY=VALUE")]
        tags: Vec<String>,

        /// Relay URL to publish to (repeatable)
        #[arg(long = "relay", value_name = "URL")]
        relays: Vec<String>,
    },

    /// Approve an action
    Approve {
        action_id: String,

        /// Require a signed approval even if no signer is configured
        #[arg(long)]
        sign: bool,
    },

    /// Execute an approved action
    Execute { action_id: String },

    /// Show an action with its audit trail
    Show { action_id: String },

    /// Print an action's audit entries
    Audit { action_id: String },

    /// Poll actions and report status changes
    Watch {
        /// Actions to watch
        #[arg(required = true)]
        action_ids: Vec<String>,

        /// Poll interval in milliseconds (default: from config)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Stop after this many polls (default: until Ctrl-C)
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Watch { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let overrides = settings::Overrides {
        base_url: cli.base_url,
        session: cli.session,
    };
    let path = settings::config_path(cli.config.as_deref());
    // Loaded per command so `config init` works without a readable file.
    let config = || settings::resolve(&path, &overrides);

    let result = match cli.command {
        Commands::Plan { goal } => config().and_then(|c| cmd::plan::run(&c, &goal, cli.json)),
        Commands::Propose {
            content,
            pubkey,
            tags,
            relays,
        } => config().and_then(|c| cmd::propose::run(&c, &content, pubkey, &tags, relays, cli.json)),
        Commands::Approve { action_id, sign } => {
            config().and_then(|c| cmd::approve::run(&c, &action_id, sign, cli.json))
        }
        Commands::Execute { action_id } => {
            config().and_then(|c| cmd::execute::run(&c, &action_id, cli.json))
        }
        Commands::Show { action_id } => config().and_then(|c| cmd::show::run(&c, &action_id, cli.json)),
        Commands::Audit { action_id } => {
            config().and_then(|c| cmd::audit::run(&c, &action_id, cli.json))
        }
        Commands::Watch {
            action_ids,
            interval_ms,
            ticks,
        } => config().and_then(|c| cmd::watch::run(&c, &action_ids, interval_ms, ticks, cli.json)),
        Commands::Config { subcommand } => cmd::config::run(&path, &overrides, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

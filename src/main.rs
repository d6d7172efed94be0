//! Scout command-line entry point

use clap::{Parser, Subcommand, ValueEnum};
use scout::config::NormalizerProvider;
use scout::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

/// Scout: query understanding for enterprise search
#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable JSON logging format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a single query
    Classify {
        /// The user query
        query: String,
        /// JSON file holding the conversation so far ([{role, content}, ...])
        #[arg(long)]
        history: Option<String>,
        /// Current time as RFC 3339 (defaults to now)
        #[arg(long)]
        now: Option<String>,
    },
    /// Prepare chat-formatted training data
    Prepare {
        /// Raw examples (defaults to dataset.data_file)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (defaults to dataset.output_file)
        #[arg(short, long)]
        output: Option<String>,
        /// Time normalizer (defaults to normalizer.provider)
        #[arg(short, long, value_enum)]
        normalizer: Option<NormalizerArg>,
    },
    /// Print the instruction prompt for the configured user
    Prompt {
        /// Current time as RFC 3339 (defaults to now)
        #[arg(long)]
        now: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum NormalizerArg {
    None,
    Rules,
    Llm,
}

impl From<NormalizerArg> for NormalizerProvider {
    fn from(arg: NormalizerArg) -> Self {
        match arg {
            NormalizerArg::None => NormalizerProvider::None,
            NormalizerArg::Rules => NormalizerProvider::Rules,
            NormalizerArg::Llm => NormalizerProvider::Llm,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Batch preparation reports progress; one-shot commands stay quiet
    let default_level = match args.command {
        Command::Prepare { .. } => "info",
        _ => "warn",
    };
    init_tracing(default_level, args.json_logs);

    let config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    match args.command {
        Command::Classify {
            query,
            history,
            now,
        } => cli::run_classify(&config, &query, history.as_deref(), now.as_deref(), args.json),
        Command::Prepare {
            input,
            output,
            normalizer,
        } => {
            cli::run_prepare(
                config,
                input,
                output,
                normalizer.map(NormalizerProvider::from),
                args.json,
            )
            .await
        }
        Command::Prompt { now } => cli::run_prompt(&config, now.as_deref()),
    }
}

fn init_tracing(default_level: &str, json_logs: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

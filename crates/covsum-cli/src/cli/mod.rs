//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use covsum_core::api::{ExportFormat, PipelineType};
use covsum_core::{Config, interrupt, logging};

mod commands;

#[derive(Parser)]
#[command(name = "covsum")]
#[command(version)]
#[command(about = "Coverage-verified document summaries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend URL (overrides COVSUM_BASE_URL and config)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Log filter when RUST_LOG is unset (e.g. debug, covsum_page=trace)
    #[arg(long, global = true, env = "COVSUM_LOG_LEVEL", value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Summarize a document and write the result page
    Submit(SubmitArgs),

    /// Browse previously generated summaries
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Download an exported file
    Download {
        /// File name as listed in the result page
        #[arg(value_name = "FILENAME")]
        filename: String,

        /// Output path (default: ./<FILENAME>)
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct SubmitArgs {
    /// PDF or TXT file to summarize
    #[arg(value_name = "FILE", required_unless_present = "text", conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Summarize this text instead of a file
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Export formats to request (md, pdf); defaults to config
    #[arg(long, value_delimiter = ',', value_name = "FORMATS")]
    pub export: Vec<ExportFormat>,

    /// Where to write the result page
    #[arg(short, long, value_name = "PATH", default_value = "resumo.html")]
    pub out: PathBuf,

    /// Also write the final summary as Markdown
    #[arg(long, value_name = "PATH")]
    pub final_summary: Option<PathBuf>,

    /// Copy the final summary to the clipboard
    #[arg(long)]
    pub copy: bool,
}

#[derive(clap::Subcommand)]
enum HistoryCommands {
    /// Lists stored summaries
    List {
        /// Only summaries from this pipeline (robust, standard, experimental)
        #[arg(long, value_name = "TYPE")]
        pipeline: Option<PipelineType>,
    },
    /// Renders a stored summary to a page
    Show {
        #[arg(value_name = "SUMMARY_ID")]
        id: String,

        /// Where to write the page
        #[arg(short, long, value_name = "PATH", default_value = "resumo.html")]
        out: PathBuf,
    },
    /// Sends feedback about a stored summary
    Feedback {
        #[arg(value_name = "SUMMARY_ID")]
        id: String,

        /// dúvida, erro, sugestão, elogio (or 1-4); prompted when missing
        #[arg(long = "type", value_name = "TYPE")]
        feedback_type: Option<String>,

        /// Feedback text; prompted when missing
        #[arg(short, long, value_name = "TEXT")]
        message: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let Cli {
        command,
        base_url,
        log_level,
    } = Cli::parse();

    // Config commands must work even when the file is broken.
    let command = match command {
        Commands::Config { command } => {
            return match command {
                ConfigCommands::Path => {
                    commands::config::path();
                    Ok(())
                }
                ConfigCommands::Init => commands::config::init(),
            };
        }
        other => other,
    };

    let config = Config::load().context("load config")?;
    let _log_guard = logging::init(&config.logging, log_level.as_deref())?;
    interrupt::init()?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(command, &config, base_url.as_deref()).await })
}

async fn dispatch(command: Commands, config: &Config, base_url: Option<&str>) -> Result<()> {
    match command {
        Commands::Submit(args) => commands::submit::run(config, base_url, args).await,
        Commands::History { command } => match command {
            HistoryCommands::List { pipeline } => {
                commands::history::list(config, base_url, pipeline).await
            }
            HistoryCommands::Show { id, out } => {
                commands::history::show(config, base_url, &id, &out).await
            }
            HistoryCommands::Feedback {
                id,
                feedback_type,
                message,
            } => commands::history::feedback(config, base_url, id, feedback_type, message).await,
        },
        Commands::Download { filename, out } => {
            commands::download::run(config, base_url, &filename, out).await
        }
        Commands::Config { .. } => anyhow::bail!("config commands run before the runtime starts"),
    }
}

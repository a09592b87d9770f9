use std::path::PathBuf;

use clap::{
    Args, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotetl::{
    cli::{self, JobOptions, SinkKind},
    config, error, logging,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Variable store file (TOML); defaults to SPOTETL_VARIABLES or the data dir
    #[clap(long, global = true)]
    variables: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[clap(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines on stderr
    #[clap(long, global = true)]
    log_json: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Append the configured artist's top tracks to the sink
    TopTracks(JobArgs),

    /// Append the last 24 hours of listening history to the sink
    Recent(JobArgs),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// Destination kind; top-tracks defaults to csv, recent to sqlite
    #[clap(long, value_enum)]
    sink: Option<SinkKind>,

    /// Execution date (YYYY-MM-DD); overrides the date in --context
    #[clap(long)]
    execution_date: Option<String>,

    /// Trigger context as a JSON object, e.g. '{"ds":"2024-05-01"}'
    #[clap(long)]
    context: Option<String>,

    /// Print the run summary as JSON
    #[clap(long)]
    json: bool,

    /// Do not print the track table
    #[clap(long)]
    no_display: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

impl JobArgs {
    fn into_options(self, variables: Option<PathBuf>) -> JobOptions {
        JobOptions {
            variables,
            sink: self.sink,
            execution_date: self.execution_date,
            context: self.context,
            json: self.json,
            no_display: self.no_display,
        }
    }
}

fn main() {
    if let Err(e) = config::load_env() {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(&cli.log_level, cli.log_json) {
        error!("Cannot initialize logging. Err: {}", e);
    }

    match cli.command {
        Command::TopTracks(args) => cli::top_tracks(args.into_options(cli.variables)),
        Command::Recent(args) => cli::recent(args.into_options(cli.variables)),
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

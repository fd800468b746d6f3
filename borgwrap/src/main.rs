//! Configuration-driven BorgBackup wrapper.
//!
//! Reads a YAML or TOML config and runs `create`, `list`, `prune`, a monitoring
//! `check-age`, or a raw `cmd` against the configured repository.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use borgwrap::actions::check_age::run_check_age;
use borgwrap::actions::create::{CreateRequest, run_create};
use borgwrap::actions::list::{run_list, run_list_details};
use borgwrap::actions::passthrough::run_passthrough;
use borgwrap::actions::prune::run_prune;
use borgwrap::core::check_age::{AgeLimits, CheckReport};
use borgwrap::exit_codes;
use borgwrap::io::config::load_config;
use borgwrap::io::engine::{BorgEngine, DEFAULT_BINARY};
use borgwrap::io::hooks::ShellHookRunner;
use borgwrap::logging;
use borgwrap::retry::ThreadSleeper;
use borgwrap::session::Session;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::debug;

type CliSession = Session<BorgEngine, ShellHookRunner, ThreadSleeper>;

#[derive(Parser)]
#[command(name = "borgwrap", version, about = "Configuration-driven borgbackup wrapper")]
struct Cli {
    /// YAML or TOML config file (`.toml` selects TOML).
    #[arg(short, long)]
    config: PathBuf,
    /// Let the engine simulate changes; skip hooks, compact and raw commands.
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// Engine binary.
    #[arg(long, env = "BORGWRAP_BORG", default_value = DEFAULT_BINARY)]
    borg: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run before hooks, create an archive, run after hooks, then prune.
    Create {
        /// Skip the prune that normally follows a successful create.
        #[arg(long)]
        no_prune: bool,
        /// Print archive statistics.
        #[arg(long)]
        stats: bool,
        /// List processed files.
        #[arg(long)]
        list: bool,
    },
    /// List this wrapper's archives.
    List {
        /// Print a table of sizes, file counts and durations.
        #[arg(long)]
        details: bool,
    },
    /// Apply the retention rules.
    Prune {
        #[arg(long)]
        no_stats: bool,
    },
    /// Monitoring check on the most recent archive.
    #[command(alias = "nagios-check-age")]
    CheckAge {
        /// Maximum age in hours.
        #[arg(long)]
        max_age: u64,
        /// Minimum original size in MiB.
        #[arg(long)]
        min_size: Option<u64>,
        /// Seconds to wait for the engine.
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },
    /// Run the engine with raw arguments and `BORG_REPO` set.
    Cmd {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

impl Command {
    fn is_check(&self) -> bool {
        matches!(self, Command::CheckAge { .. })
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) if cli.command.is_check() => {
            let report = CheckReport::unknown("check could not run", format!("{err:#}"));
            println!("{}", report.render());
            report.exit_code()
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_codes::for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
    let session = open_session(cli)?;
    match &cli.command {
        Command::Create {
            no_prune,
            stats,
            list,
        } => {
            let request = CreateRequest {
                stats: *stats,
                list: *list,
                prune: !no_prune,
            };
            run_create(&session, &request)?;
        }
        Command::List { details: true } => run_list_details(&session)?,
        Command::List { details: false } => run_list(&session)?,
        Command::Prune { no_stats } => run_prune(&session, !no_stats)?,
        Command::CheckAge {
            max_age,
            min_size,
            timeout,
        } => {
            let limits = AgeLimits::from_hours(*max_age, *min_size);
            let report = run_check_age(
                &session,
                &limits,
                Duration::from_secs(*timeout),
                Local::now().naive_local(),
            );
            println!("{}", report.render());
            return Ok(report.exit_code());
        }
        Command::Cmd { args } => run_passthrough(&session, args)?,
    }
    Ok(exit_codes::OK)
}

fn open_session(cli: &Cli) -> Result<CliSession> {
    let config = load_config(&cli.config)?;
    let engine = BorgEngine::new(cli.borg.clone(), config.remote.rsh.clone());
    debug!(repository = %config.remote.repository, borg = engine.binary(), "config loaded");
    Ok(Session::new(
        config,
        engine,
        ShellHookRunner,
        ThreadSleeper,
        cli.dry_run,
    ))
}

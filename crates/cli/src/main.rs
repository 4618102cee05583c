//! Privexec CLI - run a command with a deadline and optional privilege drop

mod plan_config;
mod logging;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use privexec_core::application::{quote, strip_unsafe};
use privexec_core::domain::ShellSettings;
use privexec_core::error::ShellError;

#[derive(Parser)]
#[command(name = "privexec")]
#[command(about = "Run commands with deadlines, privilege drop and safe quoting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Plan defaults file (TOML)
    #[arg(long, global = true, env = "PRIVEXEC_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command and print its trimmed stdout
    Run(RunArgs),

    /// Quote each argument for a POSIX shell
    Quote {
        /// Text to quote
        texts: Vec<String>,
    },

    /// Strip invalid UTF-8 and non-printable characters from stdin
    Strip,

    /// Print the effective plan defaults as JSON
    Defaults,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Run through a login-profile-sourcing shell
    #[arg(long)]
    sub_shell: bool,

    /// Allow --timeout above the hard cap
    #[arg(long)]
    no_timeout_cap: bool,

    /// Run as the caller if --user cannot be resolved
    #[arg(long)]
    ignore_user_lookup_error: bool,

    /// Drop privileges to this user
    #[arg(short, long)]
    user: Option<String>,

    /// Working directory for the child
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Deadline in seconds (0 = default)
    #[arg(short, long, default_value_t = 0)]
    timeout: u64,

    /// Extra environment entry, appended after the inherited environment
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    envs: Vec<String>,

    /// Write stdout to this file instead of printing it
    #[arg(long)]
    stdout_file: Option<PathBuf>,

    /// Write stderr to this file instead of capturing it
    #[arg(long)]
    stderr_file: Option<PathBuf>,

    /// Command and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl From<RunArgs> for ShellSettings {
    fn from(args: RunArgs) -> Self {
        let mut words = args.command.into_iter();
        let command = words.next().unwrap_or_default();

        ShellSettings {
            command,
            args: words.collect(),
            use_sub_shell: args.sub_shell,
            disable_timeout_hard_limit: args.no_timeout_cap,
            ignore_username_lookup_error: args.ignore_user_lookup_error,
            username: args.user,
            working_directory: args.cwd,
            execution_timeout_secs: args.timeout,
            envs: args.envs,
            stdout_file_path: args.stdout_file,
            stderr_file_path: args.stderr_file,
        }
    }
}

/// Map a child exit code onto a process exit status (never 0 for a failure)
fn failure_exit_code(code: i32) -> u8 {
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}

async fn run_command(cli_config: Option<PathBuf>, args: RunArgs) -> Result<ExitCode> {
    let defaults = plan_config::load_defaults(cli_config.as_deref(), None)?;
    let shell = privexec_infra_system::system_shell_with(defaults);
    let settings = ShellSettings::from(args);

    match shell.run(&settings).await {
        Ok(stdout) => {
            if !stdout.is_empty() {
                println!("{}", stdout);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(ShellError::Command(failure)) => {
            eprintln!("{}", failure);
            Ok(ExitCode::from(failure_exit_code(failure.exit_code)))
        }
        Err(e) => Err(e).context("Command could not be run"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_command(cli.config, args).await,

        Commands::Quote { texts } => {
            let quoted: Vec<String> = texts.iter().map(|t| quote(t)).collect();
            println!("{}", quoted.join(" "));
            Ok(ExitCode::SUCCESS)
        }

        Commands::Strip => {
            let mut input = Vec::new();
            std::io::stdin()
                .read_to_end(&mut input)
                .context("Failed to read stdin")
                .map(|_| {
                    println!("{}", strip_unsafe(&input));
                    ExitCode::SUCCESS
                })
        }

        Commands::Defaults => plan_config::load_defaults(cli.config.as_deref(), None).and_then(|d| {
            println!("{}", serde_json::to_string_pretty(&d)?);
            Ok(ExitCode::SUCCESS)
        }),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

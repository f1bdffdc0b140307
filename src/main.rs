use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use fremen::{
    config::Config,
    execute_scan,
    output::{print_result, OutputFormat, Report, ReportStyle, Summary},
    ScanConfig, VulnerabilityDatabase,
};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    /// Infected projects, no lockfile found, or a fatal error.
    pub const FAILURE: u8 = 1;
}

#[derive(Parser)]
#[command(name = "fremen")]
#[command(
    author,
    version,
    about = "Fast lockfile scanner for infected npm, Yarn and pnpm packages"
)]
struct Cli {
    /// Files or directories to scan (default: current directory)
    paths: Vec<String>,

    /// Scan directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Include .git directories during recursion
    #[arg(short = 'g', long)]
    include_git: bool,

    /// Include node_modules directories during recursion
    #[arg(short = 'n', long)]
    include_node_modules: bool,

    /// Exclude paths matching this regex
    #[arg(short, long, value_name = "REGEX")]
    exclude: Option<String>,

    /// Display projects that are not infected
    #[arg(short, long)]
    full_report: bool,

    /// Output results in JSON format
    #[arg(short, long)]
    json: bool,

    /// Disable ANSI colors in the CLI report
    #[arg(short = 'C', long)]
    no_color: bool,

    /// Disable emoji icons in the CLI report
    #[arg(short = 'E', long)]
    no_emoji: bool,

    /// Path to database.txt database file
    #[arg(short, long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Log scan progress to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Write the default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Print the config file path and exit
    #[arg(long)]
    config_path: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            ExitCode::from(exit_codes::FAILURE)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.config_path {
        println!("{}", Config::config_path().display());
        return Ok(exit_codes::SUCCESS);
    }

    if cli.init_config {
        handle_init_config()?;
        return Ok(exit_codes::SUCCESS);
    }

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %format!("{:#}", e), "ignoring config file");
        Config::default()
    });

    let format = if cli.json {
        OutputFormat::Json
    } else {
        config.output_format().unwrap_or(OutputFormat::Text)
    };
    let is_interactive = format == OutputFormat::Text;

    configure_color(cli.no_color || !config.color);
    let style = ReportStyle {
        emoji: !cli.no_emoji && config.emoji,
    };

    let exclude = match cli
        .exclude
        .as_deref()
        .or(config.exclude.as_deref())
        .filter(|p| !p.is_empty())
    {
        Some(pattern) => match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                eprintln!("{}", format!("Invalid exclude regex: {}", e).red());
                return Ok(exit_codes::FAILURE);
            }
        },
        None => None,
    };

    let scan_config = ScanConfig::new(cli.paths)
        .database_path(cli.database.or(config.database))
        .recursive(cli.recursive || config.recursive)
        .include_git(cli.include_git || config.include_git)
        .include_node_modules(cli.include_node_modules || config.include_node_modules)
        .exclude(exclude);
    let full_report = cli.full_report || config.full_report;

    let mut db = VulnerabilityDatabase::new();
    if let Err(e) = db.load(scan_config.database_path.as_deref()) {
        tracing::error!(error = %e, "cannot load vulnerability database");
        if is_interactive {
            eprintln!("{}", format!("Error: {}", e).red());
        }
        return Ok(exit_codes::FAILURE);
    }

    if is_interactive {
        let db_name = db
            .loaded_path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{}",
            format!(
                "Loaded {} infected package versions from {}.",
                db.entry_count(),
                db_name
            )
            .blue()
        );
    }

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning lockfiles...");
        Some(pb)
    } else {
        None
    };

    let outcome = execute_scan(&scan_config, Arc::new(db)).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if !outcome.errors.is_empty() {
        if outcome.errors.any_not_found() {
            eprintln!("{}", format!("Scan error: {}", outcome.errors).red());
            return Ok(exit_codes::FAILURE);
        }
        if is_interactive {
            eprintln!("{}", format!("Scan error: {}", outcome.errors).yellow());
        }
    }

    let report = Report::new(&outcome.results, &scan_config, full_report);
    print_result(&report, format, style)?;

    Ok(determine_exit_code(&report.summary))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fremen=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `NO_COLOR` set to anything but `0` disables color, like `--no-color`.
fn configure_color(disabled: bool) {
    let no_color_env = std::env::var("NO_COLOR").is_ok_and(|v| v != "0");
    if disabled || no_color_env {
        colored::control::set_override(false);
    }
}

/// Non-zero when nothing was found or anything is infected.
fn determine_exit_code(summary: &Summary) -> u8 {
    if summary.total_projects == 0 || summary.infected_projects > 0 {
        exit_codes::FAILURE
    } else {
        exit_codes::SUCCESS
    }
}

fn handle_init_config() -> Result<()> {
    let config_path = Config::config_path();

    if config_path.exists() {
        println!("Config file already exists at: {}", config_path.display());
        return Ok(());
    }

    Config::default().save()?;
    println!("Created config file at: {}", config_path.display());
    println!();
    println!("Default configuration:");
    println!("{}", Config::generate_default_config());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "fremen", "-r", "-g", "-n", "-f", "-j", "-C", "-E", "-e", "vendor", "-d", "db.txt", "a",
            "b",
        ]);

        assert!(cli.recursive && cli.include_git && cli.include_node_modules);
        assert!(cli.full_report && cli.json && cli.no_color && cli.no_emoji);
        assert_eq!(cli.exclude.as_deref(), Some("vendor"));
        assert_eq!(cli.database, Some(PathBuf::from("db.txt")));
        assert_eq!(cli.paths, vec!["a", "b"]);
    }

    #[test]
    fn test_determine_exit_code() {
        let none = Summary::default();
        assert_eq!(determine_exit_code(&none), exit_codes::FAILURE);

        let clean = Summary {
            total_projects: 2,
            infected_projects: 0,
            total_infected_packages: 0,
        };
        assert_eq!(determine_exit_code(&clean), exit_codes::SUCCESS);

        let infected = Summary {
            total_projects: 2,
            infected_projects: 1,
            total_infected_packages: 3,
        };
        assert_eq!(determine_exit_code(&infected), exit_codes::FAILURE);
    }
}

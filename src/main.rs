mod archive;
mod cli;
mod config;
mod download;
mod error;
mod pipeline;
mod platform;
mod probe;
mod receipt;
mod shell;
mod source;
mod toolchain;
mod types;
mod verify;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Mode};
use console::style;
use pipeline::{build_client, run_all, Action, Outcome, Pipeline, ToolReport};
use std::path::Path;
use std::process::ExitCode;
use toolchain::Toolchain;
use types::Settings;

const EXIT_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(EXIT_CONFIG);
    }

    let (mode, base_dir, settings, toolchains) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match run(&cli, mode, &base_dir, &settings, &toolchains).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILED),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_FAILED)
        }
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {}", e))
}

/// Everything that has to be valid before any pipeline runs.
fn prepare(
    cli: &Cli,
) -> Result<(Mode, std::path::PathBuf, Settings, Vec<Box<dyn Toolchain>>)> {
    let mode = cli.mode()?;
    let base_dir = config::base_dir()?;
    let settings = config::load_settings(&base_dir)?;

    let names = if cli.tools.is_empty() {
        &settings.tools
    } else {
        &cli.tools
    };
    let toolchains = toolchain::resolve(names, &settings)?;

    Ok((mode, base_dir, settings, toolchains))
}

/// Returns whether every toolchain succeeded.
async fn run(
    cli: &Cli,
    mode: Mode,
    base_dir: &Path,
    settings: &Settings,
    toolchains: &[Box<dyn Toolchain>],
) -> Result<bool> {
    let action = match mode {
        Mode::List => {
            list_installed(base_dir, toolchains)?;
            return Ok(true);
        }
        Mode::Install => Action::Install,
        Mode::Update => Action::Update,
    };

    config::ensure_base_dir(base_dir)?;
    if !cli.skip_profile {
        let setup_path = shell::write_setup_script(base_dir, toolchains)?;
        shell::ensure_profile_sources_setup(&settings.shell_profile, &setup_path)?;
    }

    let client = build_client(settings)?;
    let pipeline = Pipeline::new(client, base_dir, platform::get_system_info())
        .with_progress(!cli.quiet);

    let reports = run_all(&pipeline, toolchains, action).await;
    if !cli.quiet {
        print_summary(&reports);
    }

    Ok(reports.iter().all(|r| r.result.is_ok()))
}

fn list_installed(base_dir: &Path, toolchains: &[Box<dyn Toolchain>]) -> Result<()> {
    let names: Vec<&'static str> = toolchains.iter().map(|tc| tc.name()).collect();
    let installed = receipt::list_installed(base_dir, &names)
        .with_context(|| format!("Could not read installs under {}", base_dir.display()))?;

    println!("--- Installed Toolchains ---");
    for (tool, receipt) in installed {
        match receipt {
            Some(receipt) => {
                println!("  - {} ({})", tool, receipt.version);
                println!("    Artifact:  {}", receipt.artifact);
                println!("    Path:      {}", base_dir.join(tool).display());
                println!("    Installed: {}\n", receipt.installed_at);
            }
            None => println!("  - {} (not installed)\n", tool),
        }
    }
    println!("----------------------------");
    Ok(())
}

fn print_summary(reports: &[ToolReport]) {
    println!("--- tn summary ---");
    for report in reports {
        match &report.result {
            Ok(Outcome::Installed { version }) => {
                println!("  {} {}: installed {}", style("✓").green(), report.tool, version)
            }
            Ok(Outcome::Updated { from, to }) => println!(
                "  {} {}: updated {} -> {}",
                style("✓").green(),
                report.tool,
                from,
                to
            ),
            Ok(Outcome::UpToDate { version }) => {
                println!("  {} {}: up to date ({})", style("=").dim(), report.tool, version)
            }
            Err(e) => println!(
                "  {} {}: {} ({})",
                style("✗").red(),
                report.tool,
                style(e.kind()).red().bold(),
                e
            ),
        }
    }
    println!("------------------");
}

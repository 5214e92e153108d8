//! pvdrv - Xen PV driver installer for Windows guests
//!
//! Installs the PV driver set, removes legacy Citrix tools installations and
//! exposes the install-pending gate. All work is delegated to the ops crate;
//! this binary wires configuration, logging and output.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod setup;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::setup::SystemSetup;
use clap::Parser;
use pvdrv_config::Config;
use pvdrv_events::EventReceiver;
use pvdrv_ops::{OperationResult, OpsContextBuilder, OpsCtx};
use pvdrv_state::FlagStore;
use pvdrv_types::{ColorChoice, CopyPolicy, InstallReport};
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Instant;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    // The config file may move the logs directory, so peek at it before
    // tracing is up. A broken file is reported again by `run`.
    let logs_dir = Config::load_or_default(cli.global.config.as_deref())
        .await
        .map(|mut config| {
            let _ = config.merge_env();
            config.logs_dir()
        })
        .unwrap_or_else(|_| Config::default().logs_dir());
    init_tracing(json_mode, cli.global.debug, &logs_dir);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            error!("Application error: {}", e);
            if !json_mode {
                eprintln!("Error: {e}");
            }
            process::exit(1);
        }
    }
}

/// Main application logic; `Ok(false)` when the operation finished with
/// failures recorded in its report
async fn run(cli: Cli) -> Result<bool, CliError> {
    info!("Starting pvdrv v{}", env!("CARGO_PKG_VERSION"));

    // 1. File config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Environment variables
    config.merge_env()?;

    // 3. CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command);

    let (event_sender, event_receiver) = pvdrv_events::channel();

    let setup = SystemSetup::initialize(&config, event_sender.clone()).await?;
    let (state, platform) = setup.into_parts();

    let color = cli.global.color.unwrap_or(config.general.color);
    let renderer = OutputRenderer::new(cli.global.json, color);

    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.json);

    let ops_ctx = OpsContextBuilder::new()
        .with_platform(platform)
        .with_state(Arc::clone(&state) as Arc<dyn FlagStore>)
        .with_event_sender(event_sender)
        .with_config(config)
        .build()?;

    let operation = cli.command.name();
    let result =
        execute_command_with_events(cli.command, ops_ctx, event_receiver, &mut event_handler)
            .await;

    state.close().await;
    let result = result?;

    renderer.render_result(&result)?;

    let success = result.is_success();
    info!(operation, success, "Command completed");
    Ok(success)
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(&event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(&event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: OpsCtx) -> Result<OperationResult, CliError> {
    let root = ctx.config.driver_root();

    match command {
        Commands::Install { driver: None } => {
            let report = pvdrv_ops::install_all(&ctx, &root).await?;
            Ok(OperationResult::InstallReport(report))
        }

        Commands::Install {
            driver: Some(driver),
        } => Ok(OperationResult::InstallReport(
            install_single(&ctx, &root, &driver).await?,
        )),

        Commands::Stage { .. } => {
            let report = pvdrv_ops::stage_all(&ctx, &root).await?;
            Ok(OperationResult::StageReport(report))
        }

        Commands::InstallHwid { driver, device } => {
            let binding = pvdrv_ops::install_on_hardware_id(&ctx, device, &root, &driver).await?;
            Ok(OperationResult::HardwareIdBinding(binding))
        }

        Commands::Clean { .. } => {
            // --workaround-2k8 was folded into the config already
            let report = pvdrv_ops::system_clean(&ctx, ctx.config.cleanup.workaround_2k8).await?;
            Ok(OperationResult::CleanupReport(report))
        }

        Commands::Wait { timeout } => {
            let timeout = timeout.unwrap_or_else(|| ctx.config.gate_timeout());
            let gate = pvdrv_ops::wait(&ctx, timeout).await?;
            Ok(OperationResult::Gate(gate))
        }

        Commands::Status => {
            let status = pvdrv_ops::status(&ctx).await?;
            Ok(OperationResult::Status(status))
        }
    }
}

async fn install_single(ctx: &OpsCtx, root: &Path, driver: &str) -> Result<InstallReport, CliError> {
    let start = Instant::now();
    let name = driver.to_ascii_lowercase();
    let mut report = InstallReport::default();

    match pvdrv_ops::install_driver(ctx, root, &name).await? {
        Some(outcome) => {
            report.installed.push(name);
            report.reboot_required = outcome.reboot_required;
        }
        None => report.skipped.push(name),
    }

    report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(report)
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool, log_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if json_mode {
        // Keep stdout clean for the JSON result
        if debug_enabled {
            if let Some(file) = create_log_file(log_dir) {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(env_filter("info,pvdrv=debug,pvdrv_ops=debug"))
                    .init();
                return;
            }
        }
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        let log_file = log_dir.join(log_file_name());
        match std::fs::create_dir_all(log_dir).and_then(|()| std::fs::File::create(&log_file)) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(env_filter("info,pvdrv=debug,pvdrv_ops=debug"))
                    .init();

                eprintln!("Debug logging enabled: {}", log_file.display());
            }
            Err(e) => {
                eprintln!("Warning: Failed to create log file: {e}");
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(env_filter("info,pvdrv=info,pvdrv_ops=info"))
                    .init();
            }
        }
    } else {
        tracing_subscriber::fmt()
            .compact()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter("warn,pvdrv=warn,pvdrv_ops=warn"))
            .init();
    }
}

fn env_filter(default: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
}

fn log_file_name() -> String {
    format!("pvdrv-{}.log", chrono::Utc::now().format("%Y%m%d-%H%M%S"))
}

fn create_log_file(log_dir: &Path) -> Option<std::fs::File> {
    std::fs::create_dir_all(log_dir).ok()?;
    std::fs::File::create(log_dir.join(log_file_name())).ok()
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    if let Some(root) = &global.driver_root {
        config.paths.driver_root = Some(root.clone());
    }

    match command {
        Commands::Stage { overwrite: true } => {
            config.install.copy_policy = CopyPolicy::Overwrite;
        }
        Commands::Clean {
            workaround_2k8: Some(mode),
        } => {
            config.cleanup.workaround_2k8 = *mode;
        }
        _ => {}
    }
}

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use padlauncher::controller::{inventory, Controller};
use padlauncher::emulators::{
    build_command, configure_controllers, find_adapter, resolve_controllers, ConfigureOutcome,
    EmulatorAdapter, GameRequest,
};
use padlauncher::launcher::{EmulatorProcess, Launching, PassiveWindowProbe};
use padlauncher::mapping::{MappingRegistry, ResolvedBindings};
use padlauncher::persistence::{self, LauncherConfig};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const INVENTORY_FILE: &str = "controllers.toml";

/// Configures emulator controllers and launches a game
#[derive(Parser, Debug)]
#[command(name = "padlauncher", version, about)]
struct Args {
    /// Emulator id: retroarch, mame, dolphin or epsxe
    emulator: String,

    /// Game file to start
    rom: PathBuf,

    /// System name; defaults to the ROM's parent directory name
    #[arg(long)]
    system: Option<String>,

    /// Controller inventory written by the frontend
    #[arg(long)]
    controllers: Option<PathBuf>,

    /// Ignore any inventory and probe connected pads instead
    #[arg(long)]
    probe: bool,

    /// Print the resolved bindings and command without writing or launching
    #[arg(long)]
    dry_run: bool,

    /// Launcher settings file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(persistence::config_path);
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(persistence::config_dir);
    // a dry run writes nothing, not even default settings
    let config = persistence::load_or_init(&config_path, !args.dry_run).await?;

    let adapter = find_adapter(&args.emulator)?;
    let install = config.install(adapter.id()).ok_or_else(|| {
        eyre!(
            "No install directory for {} in {}",
            adapter.id(),
            config_path.display()
        )
    })?;

    let builder = MappingRegistry::builder().with_builtin().unwrap_or_else(|e| {
        error!("Embedded mapping tables unusable: {}", e);
        MappingRegistry::builder()
    });
    let registry = builder
        .with_override_dir(&config.mapping_dir_or(&config_dir))
        .build();

    let controllers = load_controllers(&args, &config_dir)?;
    let system = args.system.clone().unwrap_or_else(|| system_from_rom(&args.rom));
    let request = GameRequest::new(adapter.id(), system, &args.rom);
    info!(
        "Launching {} ({}) with {} on {} controllers",
        request.rom.display(),
        request.system,
        adapter.id(),
        controllers.len()
    );

    if args.dry_run {
        return dry_run(adapter.as_ref(), &registry, &request, &controllers, &config, install);
    }

    match configure_controllers(
        adapter.as_ref(),
        &registry,
        &install.directory,
        &request,
        &controllers,
        &config.input,
    ) {
        Ok(ConfigureOutcome::Written { path, players }) => {
            info!("Configured {} players in {}", players, path.display())
        }
        Ok(ConfigureOutcome::KeptDefaults) => {}
        Err(e) => error!("Controller configuration for {} failed: {}", adapter.id(), e),
    }

    let command = build_command(adapter.as_ref(), install, &request)?;
    let (process, mut status) = EmulatorProcess::<Launching>::create(command, config.supervisor.clone());

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping emulator");
            interrupt.cancel();
        }
    });
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            debug!("Status: {:?}", *status.borrow_and_update());
        }
    });

    let report = process.run_to_exit(&PassiveWindowProbe, cancel).await?;
    info!(
        "{} ran for {}s, exit code {:?}",
        report.program,
        report.duration().num_seconds(),
        report.exit_code
    );

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Inventory from `--controllers`, then `controllers.toml` next to the
/// settings, then a live probe
fn load_controllers(args: &Args, config_dir: &Path) -> Result<Vec<Controller>> {
    if args.probe {
        return Ok(inventory::probe_gamepads()?);
    }

    let path = args
        .controllers
        .clone()
        .unwrap_or_else(|| config_dir.join(INVENTORY_FILE));
    if path.is_file() {
        info!("Reading controller inventory from {}", path.display());
        return Ok(inventory::load_inventory(&path)?);
    }
    if args.controllers.is_some() {
        return Err(eyre!("Controller inventory {} not found", path.display()));
    }

    Ok(inventory::probe_gamepads()?)
}

fn system_from_rom(rom: &Path) -> String {
    rom.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn dry_run(
    adapter: &dyn EmulatorAdapter,
    registry: &MappingRegistry,
    request: &GameRequest,
    controllers: &[Controller],
    config: &LauncherConfig,
    install: &persistence::EmulatorInstall,
) -> Result<()> {
    match resolve_controllers(adapter, registry, request, controllers, &config.input)? {
        Some(bindings) => print_bindings(&bindings),
        None => println!("No usable controller, configuration left untouched"),
    }
    println!(
        "Would write {}",
        adapter.config_path(&install.directory).display()
    );

    match build_command(adapter, install, request) {
        Ok(command) => println!("Would run {}", command),
        Err(e) => warn!("{}", e),
    }
    Ok(())
}

fn print_bindings(bindings: &ResolvedBindings) {
    for player in &bindings.players {
        println!(
            "port {} <- player {} {} [{} #{}]",
            player.port,
            player.player,
            player.controller_name,
            player.classification.technology,
            player.classification.effective_index
        );
        for binding in &player.bindings {
            println!("  {:<12} {:<24} {}", binding.action, binding.target, binding.token);
        }
    }
}

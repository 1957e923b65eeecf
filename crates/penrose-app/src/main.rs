//! Penrose Walk - Main entry point
//!
//! Loads the configuration, sets up logging and runs the Bevy app.

use anyhow::Result;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::{prelude::MeshPickingPlugin, DefaultPickingPlugins};
use clap::Parser;
use penrose_core::{load_config, save_default_config};
use penrose_scene::PenroseScenePlugin;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "penrose")]
#[command(about = "Walk an impossible staircase around the corners of a cube")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "penrose.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Penrose Walk v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Default configuration written");
        return Ok(());
    }

    let settings = load_config(&args.config)?;
    info!(
        trigger_distance = settings.corner.trigger_distance,
        walk_speed = settings.locomotion.walk_speed,
        style = ?settings.camera.walkthrough_style,
        "Configuration loaded"
    );

    // bevy_log is not enabled, so Bevy leaves the global subscriber alone
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Penrose Walk".to_string(),
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // Picking must come before EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .add_plugins(PenroseScenePlugin::new(settings))
        .run();

    Ok(())
}

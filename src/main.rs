// src/main.rs

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*};
use bevy_tokio_tasks::TokioTasksPlugin;
use clap::Parser;
use std::time::Duration;

mod resonance;

use resonance::remote::RemoteConfig;
use resonance::{AppSettings, PerturbRng, ResonancePlugin};

/// Resonance table admin core: local edit session and bulk normalization
/// over a remotely loaded dataset. Headless; a UI plugin drives it through
/// the resources and events registered by `ResonancePlugin`.
#[derive(Parser, Debug)]
#[command(name = "echodesk", version)]
struct Cli {
    /// Base URL of the remote dataset service.
    #[arg(long, env = "ECHODESK_BASE_URL", default_value = "http://localhost:54321")]
    base_url: String,

    /// API key sent as both `apikey` and bearer token.
    #[arg(long, env = "ECHODESK_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Window (in days) for the "recently created" status filter.
    #[arg(long, default_value_t = 2)]
    recency_days: i64,

    /// Seed for the random-soft perturbation; omit for an OS-seeded run.
    #[arg(long)]
    seed: Option<u64>,

    /// Save a group through the single bulk endpoint instead of row-by-row
    /// updates.
    #[arg(long, default_value_t = false)]
    bulk_save: bool,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = AppSettings {
        remote: RemoteConfig {
            base_url: cli.base_url,
            api_key: cli.api_key,
        },
        recency_window: chrono::Duration::days(cli.recency_days),
        bulk_save: cli.bulk_save,
    };
    let rng = match cli.seed {
        Some(seed) => PerturbRng::seeded(seed),
        None => PerturbRng::default(),
    };

    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 30.0,
            ))),
        )
        .add_plugins(LogPlugin {
            level: bevy::log::Level::INFO,
            filter: "bevy_tokio_tasks=warn".to_string(),
            ..default()
        })
        .add_plugins(TokioTasksPlugin::default())
        .insert_resource(settings)
        .insert_resource(rng)
        .add_plugins(ResonancePlugin)
        .run();
}

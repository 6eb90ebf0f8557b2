//! EWWM gesture — headless replay of pose scripts through the gesture
//! registry.
//!
//! Part of the EXWM-VR project: a transhuman Emacs window manager.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use ewwm_gesture::backend::{headless, HeadlessConfig, Script};
use ewwm_gesture::gesture::{DuplicateAttach, GestureConfig};

#[derive(Parser, Debug)]
#[command(name = "ewwm-gesture", about = "EXWM-VR spatial gesture classifier")]
struct Cli {
    /// Pose script to replay (default: built-in demo)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Number of ticks to run (default: last scripted tick + 3)
    #[arg(long)]
    ticks: Option<u64>,

    /// Milliseconds between ticks
    #[arg(long, default_value_t = 0)]
    tick_ms: u64,

    /// Per-axis rotation threshold in degrees
    #[arg(long)]
    threshold_deg: Option<f32>,

    /// Drag distance threshold in meters
    #[arg(long)]
    drag_distance_m: Option<f32>,

    /// Count repeated attaches of the same caller instead of ignoring them
    #[arg(long)]
    count_duplicates: bool,

    /// Log registry status every N ticks (0 = never)
    #[arg(long, default_value_t = 0)]
    status_every: u64,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

impl Cli {
    fn gesture_config(&self) -> GestureConfig {
        let mut config = GestureConfig::default();
        if let Some(t) = self.threshold_deg {
            config.rotation_threshold_deg = t;
        }
        if let Some(d) = self.drag_distance_m {
            config.drag_distance_m = d;
        }
        if self.count_duplicates {
            config.duplicate_attach = DuplicateAttach::Count;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("ewwm-gesture {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ewwm_gesture=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let gesture_config = cli.gesture_config();
    gesture_config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid gesture configuration: {}", e))?;

    if cli.show_config {
        println!("{}", gesture_config.to_sexp());
        return Ok(());
    }

    info!("ewwm-gesture v{} starting", env!("CARGO_PKG_VERSION"));

    let script = match cli.script {
        Some(ref path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read script {:?}: {}", path, e))?;
            let script = Script::parse(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse script {:?}: {}", path, e))?;
            info!("Loaded {} step(s) from {:?}", script.steps().len(), path);
            script
        }
        None => {
            info!("No script given, replaying built-in demo");
            Script::demo()
        }
    };

    let headless_config = HeadlessConfig {
        ticks: cli.ticks,
        tick_interval_ms: cli.tick_ms,
        status_every: cli.status_every,
    };

    headless::install_signal_handlers();
    let summary = headless::run(&script, gesture_config, headless_config)?;

    for event in &summary.events {
        println!("{}", event.to_sexp());
    }
    println!("{}", summary.final_status);

    if summary.interrupted {
        info!("Replay interrupted after {} tick(s)", summary.ticks);
    }
    Ok(())
}

//! Framebot application binary - composition root.
//!
//! Ties the framebot crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Build the context (clock, focus gate, injector) and the rotation
//! 3. Run the frame loop, or one of the offline tools (`simulate`,
//!    `dedupe`, `region`)

mod cli;
mod rotation;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use framebot_capture::{
    CaptureService, CaptureSession, MockActiveWindow, RegionStore, WindowsActiveWindow,
    WindowsCaptureService,
};
use framebot_core::clock::Clock;
use framebot_core::config::FramebotConfig;
use framebot_core::error::FramebotError;
use framebot_core::types::{Detection, Rect};
use framebot_gate::{Context, FocusGate};
use framebot_input::{GuiCall, HotkeyService, WindowsInjector};

use cli::{CliArgs, Command, RegionAction};
use rotation::Rotation;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = CliArgs::parse();

    // Config is read before tracing so its log level can apply; problems
    // are reported once the subscriber is up.
    let config_file = args.resolve_config_path();
    let loaded = FramebotConfig::load_if_present(&config_file);
    let config_level = match &loaded {
        Ok(Some(config)) => Some(config.general.log_level.as_str()),
        _ => None,
    };

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(args.resolve_log_level(config_level))
            }),
        )
        .init();

    tracing::info!("Starting Framebot v{}", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(Some(config)) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Err(e) => {
            tracing::error!(path = %config_file.display(), error = %e, "Invalid configuration");
            return Err(e.into());
        }
        Ok(None) => {
            tracing::info!(path = %config_file.display(), "No configuration file, using defaults");
            FramebotConfig::default()
        }
    };

    match args.command {
        Command::Run => run(config).await,
        Command::Simulate { frames, fps, json } => {
            simulate(&config, frames, fps.unwrap_or(config.capture.fps), json)
        }
        Command::Dedupe { file, threshold } => dedupe(
            &file,
            threshold.unwrap_or(config.detection.overlap_threshold),
        ),
        Command::Region { action } => region(&config, action),
    }
}

// =============================================================================
// run
// =============================================================================

/// Capture, advance the frame and, while toggled on, run the rotation.
async fn run(config: FramebotConfig) -> AppResult<()> {
    let clock = Clock::real();
    let focus = FocusGate::new(
        Arc::new(WindowsActiveWindow),
        config.focus.allowed_titles.clone(),
        config.focus.refresh_interval_secs,
        clock.clone(),
    )?;
    let ctx = Context::new(clock, Arc::new(focus), Arc::new(WindowsInjector::new()));
    let registry = ctx.gate_registry();
    let rotation = Rotation::from_config(&config.actions, &registry)?;
    if rotation.is_empty() {
        tracing::warn!("No actions configured; the loop will only capture");
    }

    let mut hotkey = HotkeyService::new(&config.hotkey.toggle)?;
    let capture = WindowsCaptureService::new(config.capture.monitor_index);
    let mut session = CaptureSession::start();
    let mut enabled = false;

    tracing::info!(
        fps = config.capture.fps,
        actions = rotation.len(),
        toggle = %hotkey.key(),
        "Frame loop started (rotation off until toggled)"
    );

    let mut interval =
        tokio::time::interval(tokio::time::Duration::from_secs_f64(1.0 / config.capture.fps));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => break,
        }

        if hotkey.was_pressed() {
            enabled = !enabled;
            tracing::info!(enabled, "Rotation toggled");
        }

        let frame = match capture.capture_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                session.record_failure();
                tracing::debug!(error = %e, "Screen capture failed, skipping frame");
                continue;
            }
        };
        session.record_frame();
        let frame_index = ctx.frame();
        tracing::trace!(frame = frame_index, id = %frame.id, "Frame captured");

        if !enabled {
            continue;
        }
        if let Err(e) = rotation.tick(&ctx) {
            tracing::warn!(error = %e, "Rotation tick failed");
        }
    }

    hotkey.unregister();
    session.stop();
    tracing::info!(
        frames = session.frames_captured(),
        failed = session.frames_failed(),
        "Frame loop stopped"
    );
    Ok(())
}

// =============================================================================
// simulate
// =============================================================================

#[derive(Debug, Serialize)]
struct FireEvent {
    frame: u64,
    at: f64,
    action: String,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    frames: u64,
    fps: f64,
    fires: Vec<FireEvent>,
    recent_calls: Vec<GuiCall>,
}

/// Run the rotation for `frames` virtual frames with input recorded.
fn simulate_report(config: &FramebotConfig, frames: u64, fps: f64) -> AppResult<SimulationReport> {
    let clock = Clock::real();
    let focus = FocusGate::new(
        Arc::new(MockActiveWindow::new("")),
        config.focus.allowed_titles.clone(),
        config.focus.refresh_interval_secs,
        clock.clone(),
    )?;
    let ctx = Context::new(clock, Arc::new(focus), Arc::new(WindowsInjector::new()));
    let guard = ctx.mock_all(fps)?;
    let registry = ctx.gate_registry();
    let rotation = Rotation::from_config(&config.actions, &registry)?;

    let mut fires = Vec::new();
    for _ in 0..frames {
        let frame = ctx.frame();
        for report in rotation.tick(&ctx)? {
            if report.fired {
                fires.push(FireEvent {
                    frame,
                    at: ctx.now(),
                    action: report.action,
                });
            }
        }
    }

    let recent_calls = guard
        .recorder()
        .map(|recorder| recorder.calls())
        .unwrap_or_default();
    Ok(SimulationReport {
        frames,
        fps,
        fires,
        recent_calls,
    })
}

fn simulate(config: &FramebotConfig, frames: u64, fps: f64, json: bool) -> AppResult<()> {
    let report = simulate_report(config, frames, fps)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Simulated {} frames at {} fps ({:.3}s): {} fires",
        report.frames,
        report.fps,
        report.frames as f64 / report.fps,
        report.fires.len()
    );
    for fire in &report.fires {
        println!("{:>6} {:>8.3}s {}", fire.frame, fire.at, fire.action);
    }
    if !report.recent_calls.is_empty() {
        println!("Last {} input calls:", report.recent_calls.len());
        for call in &report.recent_calls {
            println!("  {}", call);
        }
    }
    Ok(())
}

// =============================================================================
// dedupe
// =============================================================================

fn dedupe_file(path: &Path, threshold: f64) -> AppResult<Vec<Detection>> {
    let content = std::fs::read_to_string(path)?;
    let candidates: Vec<Detection> =
        serde_json::from_str(&content).map_err(FramebotError::from)?;
    let total = candidates.len();
    let kept = framebot_detect::dedupe(candidates, threshold)?;
    tracing::info!(total, kept = kept.len(), threshold, "Detections deduplicated");
    Ok(kept.into_vec())
}

fn dedupe(path: &Path, threshold: f64) -> AppResult<()> {
    let kept = dedupe_file(path, threshold)?;
    println!("{}", serde_json::to_string_pretty(&kept)?);
    Ok(())
}

// =============================================================================
// region
// =============================================================================

fn region(config: &FramebotConfig, action: RegionAction) -> AppResult<()> {
    let store = RegionStore::open(cli::expand_home(&config.general.data_dir).join("regions"))?;
    match action {
        RegionAction::Show { name } => match store.load(&name) {
            Some(rect) => println!("{} {}", name, rect),
            None => println!("{} not calibrated", name),
        },
        RegionAction::Set { name, x, y, w, h } => {
            store.save(&name, Rect::new(x, y, w, h)?)?;
            println!("{} saved", name);
        }
        RegionAction::Clear { name } => {
            store.remove(&name)?;
            println!("{} cleared", name);
        }
    }
    Ok(())
}

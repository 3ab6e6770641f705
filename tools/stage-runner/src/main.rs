//! Headless runner for the StageKit demo stages.
//!
//! Drives a stage against the recording context on a timer and prints what
//! was drawn.
//!
//! ## Usage
//!
//! ```bash
//! # List the built-in stages
//! stage-runner list
//!
//! # Spin the lit cube for two seconds and keep a JSON summary
//! stage-runner run lighted-cube --frames 120 --report lighted.json
//!
//! # Use a real image on the textured cube
//! stage-runner run textured-cube --texture crate.png --frames 30
//! ```

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stagekit_common::{init_logging, CanvasConfig, StageKitConfig};
use stagekit_gl::{DrawCall, RecordingContext, TextureSource, TextureState};
use stagekit_stages::{catalog, FrameScheduler, PreparedStage};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "stage-runner")]
#[command(about = "Run StageKit demo stages headless")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log format: pretty, compact or json
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in stages
    List,

    /// Print the effective configuration as JSON
    Config,

    /// Run one stage and print a summary
    Run {
        /// Stage name, see `list`
        stage: String,
        /// Stop after this many frames
        #[arg(short, long)]
        frames: Option<u64>,
        /// Delay between frames in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Canvas width in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Canvas height in pixels
        #[arg(long)]
        height: Option<u32>,
        /// Image for textured stages
        #[arg(long)]
        texture: Option<PathBuf>,
        /// Write the summary to this file as well
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

/// Overrides from the `run` flags, applied on top of the config file.
#[derive(Debug, Default)]
struct RunOverrides {
    frames: Option<u64>,
    interval_ms: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
    texture: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CompileSummary {
    vertex: String,
    fragment: String,
    link: String,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    stage: String,
    canvas: CanvasConfig,
    frames: u64,
    elapsed_ms: u64,
    compile: CompileSummary,
    clears: usize,
    draws: usize,
    angle: f64,
    texture: Option<String>,
    last_mvp: Option<[f64; 16]>,
    gl_error: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StageKitConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StageKitConfig::default(),
    };
    if let Some(format) = cli.log_format {
        config.log.format = format;
    }

    match cli.command {
        Commands::List => {
            for spec in catalog::all()? {
                println!("{:18} {}", spec.name, spec.description);
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run {
            stage,
            frames,
            interval_ms,
            width,
            height,
            texture,
            report,
        } => {
            let overrides = RunOverrides {
                frames,
                interval_ms,
                width,
                height,
                texture,
            };
            let config = apply_overrides(config, overrides)?;
            init_logging(config.log.to_log_config()?);

            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            let summary = runtime.block_on(run_stage(&stage, &config))?;

            let json = serde_json::to_string_pretty(&summary)?;
            println!("{json}");
            if let Some(path) = report {
                write_report(&path, &json)?;
            }
        }
    }

    Ok(())
}

fn apply_overrides(mut config: StageKitConfig, overrides: RunOverrides) -> Result<StageKitConfig> {
    if let Some(frames) = overrides.frames {
        config.max_frames = Some(frames);
    }
    if let Some(interval) = overrides.interval_ms {
        config.frame_interval_ms = interval;
    }
    if let Some(width) = overrides.width {
        config.canvas.width = width;
    }
    if let Some(height) = overrides.height {
        config.canvas.height = height;
    }
    if overrides.texture.is_some() {
        config.texture_path = overrides.texture;
    }
    config.validate()?;
    Ok(config)
}

async fn run_stage(name: &str, config: &StageKitConfig) -> Result<RunSummary> {
    let mut spec = catalog::by_name(name)?;
    if let Some(path) = &config.texture_path {
        if !spec.set_texture_source(TextureSource::Path(path.clone())) {
            warn!(stage = %spec.name, "Stage has no texture, ignoring texture path");
        }
    }

    let canvas = config.canvas;
    let mut ctx = RecordingContext::new(canvas.width, canvas.height);
    let mut stage = PreparedStage::setup(&mut ctx, &spec, canvas)?;

    let mut scheduler = FrameScheduler::new(config.frame_interval());
    if let Some(max) = config.max_frames {
        scheduler = scheduler.with_max_frames(max);
    }

    let stop = scheduler.stop_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping frame loop");
            stop.stop();
        }
    });

    let mut failure = None;
    let mut tally = DrawTally::default();
    let stats = scheduler
        .run(|_| {
            let result = stage.render_frame(&mut ctx);
            tally.drain(&mut ctx);
            match result {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => {
                    failure = Some(e);
                    ControlFlow::Break(())
                }
            }
        })
        .await;
    ctrl_c.abort();

    if let Some(e) = failure {
        warn!(error = %e, frames = stage.frames(), "Stage stopped drawing");
    }

    let gl_error = ctx.get_error();
    let report = stage.report();

    let summary = RunSummary {
        stage: stage.name().to_string(),
        canvas,
        frames: stage.frames(),
        elapsed_ms: stats.elapsed.as_millis() as u64,
        compile: CompileSummary {
            vertex: report.vertex.clone(),
            fragment: report.fragment.clone(),
            link: report.link.clone(),
        },
        clears: tally.clears,
        draws: tally.draws,
        angle: stage.angle(),
        texture: stage.texture_state().map(describe_texture),
        last_mvp: stage.last_mvp().map(|m| m.to_cols_array()),
        gl_error,
    };

    stage.release(&mut ctx);
    Ok(summary)
}

/// Running counts of recorded calls. Draining every frame keeps the
/// recording context from growing for the whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DrawTally {
    clears: usize,
    draws: usize,
}

impl DrawTally {
    fn drain(&mut self, ctx: &mut RecordingContext) {
        for call in ctx.take_draw_calls() {
            match call {
                DrawCall::Clear { .. } => self.clears += 1,
                _ => self.draws += 1,
            }
        }
    }
}

fn describe_texture(state: &TextureState) -> String {
    match state {
        TextureState::Pending => "pending".to_string(),
        TextureState::Ready => "ready".to_string(),
        TextureState::Failed(reason) => format!("failed: {reason}"),
    }
}

fn write_report(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from([
            "stage-runner",
            "run",
            "rotating-cube",
            "--frames",
            "5",
            "--width",
            "320",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.log_format.as_deref(), Some("json"));
        match cli.command {
            Commands::Run {
                stage,
                frames,
                width,
                ..
            } => {
                assert_eq!(stage, "rotating-cube");
                assert_eq!(frames, Some(5));
                assert_eq!(width, Some(320));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_overrides_are_validated() {
        let overrides = RunOverrides {
            width: Some(0),
            ..Default::default()
        };
        assert!(apply_overrides(StageKitConfig::default(), overrides).is_err());

        let overrides = RunOverrides {
            frames: Some(3),
            interval_ms: Some(5),
            ..Default::default()
        };
        let config = apply_overrides(StageKitConfig::default(), overrides).unwrap();
        assert_eq!(config.max_frames, Some(3));
        assert_eq!(config.frame_interval_ms, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stage_summary() {
        let config = StageKitConfig {
            max_frames: Some(4),
            ..Default::default()
        };
        let summary = run_stage("rotating-cube", &config).await.unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.clears, 4);
        assert_eq!(summary.draws, 4);
        assert_eq!(summary.angle, 2.0);
        assert_eq!(summary.compile.link, "OK");
        assert!(summary.last_mvp.is_some());
        assert_eq!(summary.gl_error, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_run_counts_without_accumulating() {
        let config = StageKitConfig {
            max_frames: Some(2_000),
            frame_interval_ms: 1,
            ..Default::default()
        };
        let summary = run_stage("rotating-cube", &config).await.unwrap();
        assert_eq!(summary.frames, 2_000);
        assert_eq!(summary.clears, 2_000);
        assert_eq!(summary.draws, 2_000);
    }

    #[test]
    fn test_tally_drains_context() {
        let mut ctx = RecordingContext::new(8, 8);
        let spec = catalog::by_name("triangle").unwrap();
        let mut stage = PreparedStage::setup(&mut ctx, &spec, CanvasConfig::default()).unwrap();

        let mut tally = DrawTally::default();
        for _ in 0..5 {
            stage.render_frame(&mut ctx).unwrap();
            tally.drain(&mut ctx);
            assert!(ctx.draw_calls().is_empty());
        }
        assert_eq!(tally, DrawTally { clears: 5, draws: 5 });
    }

    #[tokio::test]
    async fn test_unknown_stage() {
        let err = run_stage("no-such-stage", &StageKitConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no-such-stage"));
    }

    #[test]
    fn test_write_report_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("summary.json");
        write_report(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }
}

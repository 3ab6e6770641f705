//! # StageKit Bench
//!
//! Timing harness for the hot paths of a stage: camera math, shader
//! compilation, stage setup and per-frame drawing.
//!
//! All measurements run against [`RecordingContext`], so they measure the
//! crate's own overhead rather than a driver.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stagekit_bench::Benchmark;
//!
//! let suite = Benchmark::new().run_all()?;
//! suite.print_summary();
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use stagekit_common::{CanvasConfig, StageKitError};
use stagekit_gl::{compile_program, RecordingContext};
use stagekit_math::{look_at, perspective_projection, Matrix4, Perspective, Vec3};
use stagekit_stages::{catalog, shaders, PreparedStage};
use thiserror::Error;
use tracing::{debug, info};

/// Benchmark errors.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Benchmark failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Stage(#[from] StageKitError),
}

/// Timing summary for one benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub iterations: u64,
    pub total_ns: u64,
    pub mean_ns: u64,
    pub std_dev_ns: u64,
    pub min_ns: u64,
    pub max_ns: u64,
    /// Iterations per second at the mean.
    pub ops_per_sec: f64,
}

impl BenchmarkResult {
    /// Summarize raw samples. An empty sample set yields all zeros.
    pub fn from_samples(name: impl Into<String>, samples: &[Duration]) -> Self {
        let name = name.into();
        let iterations = samples.len() as u64;
        if iterations == 0 {
            return Self {
                name,
                iterations,
                total_ns: 0,
                mean_ns: 0,
                std_dev_ns: 0,
                min_ns: 0,
                max_ns: 0,
                ops_per_sec: 0.0,
            };
        }

        let times_ns: Vec<u64> = samples.iter().map(|d| d.as_nanos() as u64).collect();
        let total_ns: u64 = times_ns.iter().sum();
        let mean_ns = total_ns / iterations;
        let min_ns = times_ns.iter().copied().min().unwrap_or(0);
        let max_ns = times_ns.iter().copied().max().unwrap_or(0);

        let variance = times_ns
            .iter()
            .map(|&t| (t as f64 - mean_ns as f64).powi(2))
            .sum::<f64>()
            / iterations as f64;

        let ops_per_sec = if mean_ns > 0 {
            1_000_000_000.0 / mean_ns as f64
        } else {
            0.0
        };

        Self {
            name,
            iterations,
            total_ns,
            mean_ns,
            std_dev_ns: variance.sqrt() as u64,
            min_ns,
            max_ns,
            ops_per_sec,
        }
    }

    /// Whether the mean frame cost leaves room for the given frame budget.
    pub fn fits_frame_budget(&self, budget: Duration) -> bool {
        u128::from(self.mean_ns) < budget.as_nanos()
    }

    pub fn format_mean(&self) -> String {
        format_duration(self.mean_ns)
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{:36} {:>12} {:>12} {:>12}/s",
            self.name,
            self.format_mean(),
            format!("±{}", format_duration(self.std_dev_ns)),
            format_ops(self.ops_per_sec),
        )
    }
}

fn format_duration(ns: u64) -> String {
    if ns >= 1_000_000_000 {
        format!("{:.2} s", ns as f64 / 1_000_000_000.0)
    } else if ns >= 1_000_000 {
        format!("{:.2} ms", ns as f64 / 1_000_000.0)
    } else if ns >= 1_000 {
        format!("{:.2} µs", ns as f64 / 1_000.0)
    } else {
        format!("{} ns", ns)
    }
}

fn format_ops(ops: f64) -> String {
    if ops >= 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops >= 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{:.2}", ops)
    }
}

/// A named set of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSuite {
    pub name: String,
    pub results: Vec<BenchmarkResult>,
    pub total_time: Duration,
}

impl BenchmarkSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Vec::new(),
            total_time: Duration::ZERO,
        }
    }

    pub fn add(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    pub fn get(&self, name: &str) -> Option<&BenchmarkResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn print_summary(&self) {
        let rule = "=".repeat(78);
        println!("\n{rule}");
        println!("Benchmark Suite: {}", self.name);
        println!("{rule}");
        println!(
            "{:36} {:>12} {:>12} {:>12}",
            "Name", "Mean", "StdDev", "Throughput"
        );
        println!("{}", "-".repeat(78));
        for result in &self.results {
            println!("{}", result.summary_line());
        }
        println!("{}", "-".repeat(78));
        println!("Total time: {:?}\n", self.total_time);
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), BenchError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, BenchError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Warmup-then-measure runner.
#[derive(Debug, Clone)]
pub struct Benchmark {
    pub warmup: u64,
    pub iterations: u64,
    pub canvas: CanvasConfig,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self::new()
    }
}

impl Benchmark {
    pub fn new() -> Self {
        Self {
            warmup: 10,
            iterations: 100,
            canvas: CanvasConfig::default(),
        }
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_warmup(mut self, warmup: u64) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_canvas(mut self, canvas: CanvasConfig) -> Self {
        self.canvas = canvas;
        self
    }

    /// Time `f` once per iteration after the warmup runs.
    pub fn run<F>(&self, name: &str, mut f: F) -> BenchmarkResult
    where
        F: FnMut(),
    {
        debug!(
            name,
            warmup = self.warmup,
            iterations = self.iterations,
            "Running benchmark"
        );

        for _ in 0..self.warmup {
            f();
        }

        let mut samples = Vec::with_capacity(self.iterations as usize);
        for _ in 0..self.iterations {
            let start = Instant::now();
            f();
            samples.push(start.elapsed());
        }

        BenchmarkResult::from_samples(name, &samples)
    }

    /// Like [`Benchmark::run`], for bodies that can fail. The first error
    /// aborts the benchmark.
    pub fn try_run<F>(&self, name: &str, mut f: F) -> Result<BenchmarkResult, BenchError>
    where
        F: FnMut() -> Result<(), BenchError>,
    {
        let mut failure = None;
        let result = self.run(name, || {
            if failure.is_none() {
                if let Err(e) = f() {
                    failure = Some(e);
                }
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }

    /// Camera matrix construction.
    pub fn run_math(&self) -> Vec<BenchmarkResult> {
        let (w, h) = (self.canvas.width as f64, self.canvas.height as f64);
        let perspective = Perspective::default();

        vec![
            self.run("math/perspective", || {
                std::hint::black_box(perspective_projection(30.0, w, h, 0.01, 100.0));
            }),
            self.run("math/look_at", || {
                std::hint::black_box(look_at(
                    Vec3::new(0.0, 0.0, 5.0),
                    Vec3::ZERO,
                    Vec3::Y,
                ));
            }),
            self.run("math/camera_chain", || {
                let mut camera = perspective.matrix(w, h);
                camera
                    .translate_self(0.0, 0.0, -5.0)
                    .rotate_self(40.0, 0.0, 0.0)
                    .rotate_self(0.0, -45.0, 0.0);
                std::hint::black_box(camera);
            }),
            self.run("math/model_view_projection", || {
                let camera = perspective.matrix(w, h);
                let mut model = Matrix4::identity();
                model.rotate_self(0.0, 30.0, -30.0).pre_multiply_self(&camera);
                std::hint::black_box(model);
            }),
        ]
    }

    /// Shader compile and link of the simplest and the largest program.
    pub fn run_compile(&self) -> Result<Vec<BenchmarkResult>, BenchError> {
        let pairs = [
            ("compile/flat", shaders::FLAT_VERT, shaders::FLAT_FRAG),
            (
                "compile/lighted_texture",
                shaders::LIGHTED_TEXTURE_VERT,
                shaders::LIGHTED_TEXTURE_FRAG,
            ),
        ];

        pairs
            .into_iter()
            .map(|(name, vs, fs)| {
                let mut ctx = RecordingContext::new(self.canvas.width, self.canvas.height);
                self.try_run(name, || {
                    let linked = compile_program(&mut ctx, vs, fs)
                        .map_err(|e| BenchError::Failed(e.to_string()))?;
                    std::hint::black_box(linked);
                    Ok(())
                })
            })
            .collect()
    }

    /// Setup and steady-state frame cost of every catalog stage.
    pub fn run_stages(&self) -> Result<Vec<BenchmarkResult>, BenchError> {
        let mut results = Vec::new();

        for spec in catalog::all()? {
            // texture decode runs off-thread and would dominate setup timing
            if spec.texture.is_none() {
                let canvas = self.canvas;
                results.push(self.try_run(&format!("setup/{}", spec.name), || {
                    let mut ctx = RecordingContext::new(canvas.width, canvas.height);
                    let stage = PreparedStage::setup(&mut ctx, &spec, canvas)?;
                    stage.release(&mut ctx);
                    Ok(())
                })?);
            }

            let mut ctx = RecordingContext::new(self.canvas.width, self.canvas.height);
            let mut stage = PreparedStage::setup(&mut ctx, &spec, self.canvas)?;
            results.push(self.try_run(&format!("frame/{}", spec.name), || {
                stage.render_frame(&mut ctx)?;
                ctx.take_draw_calls();
                Ok(())
            })?);
        }

        Ok(results)
    }

    pub fn run_all(&self) -> Result<BenchmarkSuite, BenchError> {
        let start = Instant::now();
        let mut suite = BenchmarkSuite::new("StageKit");

        for result in self.run_math() {
            suite.add(result);
        }
        for result in self.run_compile()? {
            suite.add(result);
        }
        for result in self.run_stages()? {
            suite.add(result);
        }

        suite.total_time = start.elapsed();
        info!(
            benchmarks = suite.results.len(),
            total_ms = suite.total_time.as_millis() as u64,
            "Benchmark suite finished"
        );
        Ok(suite)
    }
}

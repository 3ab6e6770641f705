//! StageKit benchmarks
//!
//! Run with: cargo bench -p stagekit-bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stagekit_common::CanvasConfig;
use stagekit_gl::{compile_program, upload_vertex_buffer, RecordingContext, RenderContext, VertexAttrib};
use stagekit_math::{look_at, perspective_projection, Matrix4, Perspective, Vec3};
use stagekit_stages::{catalog, shaders, PreparedStage};

fn matrix_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix");

    group.bench_function("perspective", |b| {
        b.iter(|| perspective_projection(30.0, 800.0, 600.0, 0.01, 100.0))
    });

    group.bench_function("look_at", |b| {
        b.iter(|| look_at(Vec3::new(3.0, 3.0, 7.0), Vec3::ZERO, Vec3::Y))
    });

    group.bench_function("rotate_self", |b| {
        let mut m = Matrix4::identity();
        b.iter(|| {
            m.rotate_self(0.0, 0.5, -0.5);
        })
    });

    group.bench_function("model_view_projection", |b| {
        let mut camera = Perspective::default().matrix(800.0, 600.0);
        camera.translate_self(0.0, 0.0, -5.0).rotate_self(0.0, 33.0, 0.0);
        let mut angle = 0.0;
        b.iter(|| {
            angle += 0.5;
            let mut model = Matrix4::identity();
            model.rotate_self(0.0, angle, -angle).pre_multiply_self(&camera);
            model.to_f32_array()
        })
    });

    group.finish();
}

fn program_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("program");

    let pairs = [
        ("flat", shaders::FLAT_VERT, shaders::FLAT_FRAG),
        ("vertex_color", shaders::VERTEX_COLOR_VERT, shaders::VERTEX_COLOR_FRAG),
        (
            "lighted_texture",
            shaders::LIGHTED_TEXTURE_VERT,
            shaders::LIGHTED_TEXTURE_FRAG,
        ),
    ];
    for (name, vs, fs) in pairs {
        group.throughput(Throughput::Bytes((vs.len() + fs.len()) as u64));
        group.bench_with_input(BenchmarkId::new("compile", name), &(vs, fs), |b, (vs, fs)| {
            let mut ctx = RecordingContext::new(800, 600);
            b.iter(|| compile_program(&mut ctx, vs, fs))
        });
    }

    group.finish();
}

fn upload_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("vertex_upload");

    for vertices in [36usize, 1_000, 10_000] {
        let data = generate_interleaved(vertices);
        group.throughput(Throughput::Bytes((data.len() * 4) as u64));
        group.bench_with_input(BenchmarkId::new("interleaved", vertices), &data, |b, data| {
            let mut ctx = RecordingContext::new(800, 600);
            let linked =
                compile_program(&mut ctx, shaders::VERTEX_COLOR_VERT, shaders::VERTEX_COLOR_FRAG)
                    .unwrap();
            let attributes = [
                VertexAttrib::new("position", 3, 6, 0).unwrap(),
                VertexAttrib::new("color", 3, 6, 3).unwrap(),
            ];
            b.iter(|| {
                let buffer =
                    upload_vertex_buffer(&mut ctx, &linked.program, data, &attributes).unwrap();
                ctx.delete_buffer(&buffer);
            })
        });
    }

    group.finish();
}

fn stage_benchmarks(c: &mut Criterion) {
    let canvas = CanvasConfig {
        width: 800,
        height: 600,
    };
    let specs = catalog::all().unwrap();

    let mut setup = c.benchmark_group("stage_setup");
    for spec in specs.iter().filter(|spec| spec.texture.is_none()) {
        setup.bench_with_input(BenchmarkId::from_parameter(&spec.name), spec, |b, spec| {
            b.iter(|| {
                let mut ctx = RecordingContext::new(canvas.width, canvas.height);
                PreparedStage::setup(&mut ctx, spec, canvas).unwrap()
            })
        });
    }
    setup.finish();

    let mut frame = c.benchmark_group("render_frame");
    for spec in &specs {
        frame.bench_with_input(BenchmarkId::from_parameter(&spec.name), spec, |b, spec| {
            let mut ctx = RecordingContext::new(canvas.width, canvas.height);
            let mut stage = PreparedStage::setup(&mut ctx, spec, canvas).unwrap();
            b.iter(|| {
                stage.render_frame(&mut ctx).unwrap();
                ctx.take_draw_calls()
            })
        });
    }
    frame.finish();
}

fn generate_interleaved(vertices: usize) -> Vec<f32> {
    (0..vertices)
        .flat_map(|i| {
            let t = i as f32 / vertices as f32;
            [t, 1.0 - t, 0.5, t, t * 0.5, 1.0]
        })
        .collect()
}

criterion_group!(
    benches,
    matrix_benchmarks,
    program_benchmarks,
    upload_benchmarks,
    stage_benchmarks,
);
criterion_main!(benches);

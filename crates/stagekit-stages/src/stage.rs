//! Stage setup and per-frame rendering.

use stagekit_common::{CanvasConfig, Result, StageKitError};
use stagekit_gl::{
    compile_program, constants, load_texture, upload_index_buffer, upload_vertex_buffer,
    CompileReport, GlError, IndexType, PendingTexture, RenderContext, TextureState,
};
use stagekit_math::Matrix4;
use tracing::{debug, info, info_span, warn};

use crate::spec::{DrawMode, StageSpec, UniformInit};

struct Spin<L> {
    step_degrees: f64,
    model: Option<L>,
    mvp: Option<L>,
}

/// A stage whose GL objects exist and which can be drawn repeatedly.
pub struct PreparedStage<C: RenderContext> {
    name: String,
    program: C::Program,
    report: CompileReport,
    vertex_buffers: Vec<C::Buffer>,
    index_buffer: Option<C::Buffer>,
    index_type: Option<IndexType>,
    draw: DrawMode,
    draw_count: i32,
    camera: Option<Matrix4>,
    spin: Option<Spin<C::UniformLocation>>,
    angle: f64,
    texture: Option<PendingTexture<C>>,
    clear_color: [f32; 4],
    clear_mask: u32,
    frames: u64,
    last_model: Option<Matrix4>,
    last_mvp: Option<Matrix4>,
}

fn setup_error(stage: &str, err: GlError) -> StageKitError {
    StageKitError::render_with_source(format!("setting up stage '{stage}'"), err)
}

impl<C: RenderContext> PreparedStage<C> {
    /// Compile, upload and configure everything `spec` describes.
    ///
    /// The camera matrix is computed once for `canvas`. A textured stage
    /// returns before its image is decoded; see [`PreparedStage::render_frame`].
    pub fn setup(ctx: &mut C, spec: &StageSpec, canvas: CanvasConfig) -> Result<Self> {
        let _span = info_span!("stage_setup", stage = %spec.name).entered();
        let name = spec.name.as_str();

        if ctx.is_context_lost() {
            return Err(setup_error(name, GlError::ContextLost));
        }
        for (label, pname) in [
            ("WebGL Version", constants::VERSION),
            ("WebGL Vendor", constants::VENDOR),
            ("WebGL Renderer", constants::RENDERER),
        ] {
            if let Some(value) = ctx.parameter_string(pname) {
                info!("{label}: {value}");
            }
        }

        let linked = compile_program(ctx, &spec.vertex_shader, &spec.fragment_shader)
            .map_err(|e| setup_error(name, e))?;
        let program = linked.program;

        if let Some((attr, [x, y, z, w])) = &spec.constant_attrib {
            let location = ctx.attrib_location(&program, attr);
            if location >= 0 {
                ctx.vertex_attrib4f(location as u32, *x, *y, *z, *w);
            } else {
                warn!(attribute = %attr, "Constant attribute not found in program");
            }
        }

        let mut vertex_buffers = Vec::with_capacity(spec.streams.len());
        for stream in &spec.streams {
            let buffer = upload_vertex_buffer(ctx, &program, &stream.data, &stream.attributes)
                .map_err(|e| setup_error(name, e))?;
            vertex_buffers.push(buffer);
        }

        let index_buffer = match &spec.indices {
            Some(indices) => {
                Some(upload_index_buffer(ctx, indices).map_err(|e| setup_error(name, e))?)
            }
            None => None,
        };

        let texture = match &spec.texture {
            Some(texture) => Some(
                load_texture(ctx, &program, &texture.sampler, texture.source.clone())
                    .map_err(|e| setup_error(name, e))?,
            ),
            None => None,
        };

        for (uniform, value) in &spec.uniforms {
            let location = ctx.uniform_location(&program, uniform);
            if location.is_none() {
                warn!(uniform = %uniform, "Uniform not found in program");
            }
            match *value {
                UniformInit::Vec3([x, y, z]) => ctx.uniform3f(location.as_ref(), x, y, z),
                UniformInit::Vec4([x, y, z, w]) => ctx.uniform4f(location.as_ref(), x, y, z, w),
            }
        }

        let camera = spec
            .camera
            .as_ref()
            .map(|camera| camera.matrix(canvas.width as f64, canvas.height as f64));
        if let (Some(camera_spec), Some(matrix)) = (&spec.camera, &camera) {
            if let Some(uniform) = &camera_spec.uniform {
                let location = ctx.uniform_location(&program, uniform);
                ctx.uniform_matrix4fv(location.as_ref(), &matrix.to_f32_array());
            }
        }

        let spin = spec.spin.as_ref().map(|spin| Spin {
            step_degrees: spin.step_degrees,
            model: ctx.uniform_location(&program, &spin.model_uniform),
            mvp: ctx.uniform_location(&program, &spin.mvp_uniform),
        });

        if spec.depth_test {
            ctx.enable(constants::DEPTH_TEST);
        }

        let (index_type, draw_count) = match (&spec.indices, spec.draw) {
            (Some(indices), DrawMode::Elements) => {
                (Some(indices.index_type()), indices.len() as i32)
            }
            (_, DrawMode::Arrays { count, .. }) => (None, count),
            (None, DrawMode::Elements) => {
                return Err(StageKitError::config(format!(
                    "stage '{name}' draws elements without indices"
                )));
            }
        };

        debug!(
            buffers = vertex_buffers.len(),
            indexed = index_buffer.is_some(),
            textured = texture.is_some(),
            "Stage ready"
        );

        Ok(Self {
            name: spec.name.clone(),
            program,
            report: linked.report,
            vertex_buffers,
            index_buffer,
            index_type,
            draw: spec.draw,
            draw_count,
            camera,
            spin,
            angle: 0.0,
            texture,
            clear_color: spec.clear_color,
            clear_mask: spec.clear_mask,
            frames: 0,
            last_model: None,
            last_mvp: camera,
        })
    }

    /// Draw one frame: finish a pending texture upload, advance the spin,
    /// write `model` and `mvp = camera × model`, clear, draw.
    pub fn render_frame(&mut self, ctx: &mut C) -> Result<()> {
        if ctx.is_context_lost() {
            return Err(StageKitError::render_with_source(
                format!("drawing stage '{}'", self.name),
                GlError::ContextLost,
            ));
        }

        if let Some(texture) = self.texture.as_mut() {
            texture.poll(ctx);
        }

        if let (Some(spin), Some(camera)) = (&self.spin, &self.camera) {
            self.angle += spin.step_degrees;

            let mut model = Matrix4::identity();
            model.rotate_self(0.0, self.angle, -self.angle);
            ctx.uniform_matrix4fv(spin.model.as_ref(), &model.to_f32_array());

            let mut mvp = model;
            mvp.pre_multiply_self(camera);
            ctx.uniform_matrix4fv(spin.mvp.as_ref(), &mvp.to_f32_array());

            self.last_model = Some(model);
            self.last_mvp = Some(mvp);
        }

        let [r, g, b, a] = self.clear_color;
        ctx.clear_color(r, g, b, a);
        ctx.clear(self.clear_mask);

        match (self.draw, self.index_type) {
            (DrawMode::Arrays { first, count }, _) => {
                ctx.draw_arrays(constants::TRIANGLES, first, count)
            }
            (DrawMode::Elements, Some(index_type)) => {
                ctx.draw_elements(constants::TRIANGLES, self.draw_count, index_type, 0)
            }
            (DrawMode::Elements, None) => {}
        }

        self.frames += 1;
        Ok(())
    }

    /// Delete the buffers and texture this stage created.
    pub fn release(self, ctx: &mut C) {
        for buffer in &self.vertex_buffers {
            ctx.delete_buffer(buffer);
        }
        if let Some(buffer) = &self.index_buffer {
            ctx.delete_buffer(buffer);
        }
        if let Some(texture) = &self.texture {
            ctx.delete_texture(texture.texture());
        }
        debug!(stage = %self.name, frames = self.frames, "Stage released");
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &C::Program {
        &self.program
    }

    pub fn report(&self) -> &CompileReport {
        &self.report
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Current spin angle in degrees.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn camera(&self) -> Option<&Matrix4> {
        self.camera.as_ref()
    }

    pub fn last_model(&self) -> Option<&Matrix4> {
        self.last_model.as_ref()
    }

    /// Matrix the last frame drew with; the bare camera for stages that do not spin.
    pub fn last_mvp(&self) -> Option<&Matrix4> {
        self.last_mvp.as_ref()
    }

    pub fn texture_state(&self) -> Option<&TextureState> {
        self.texture.as_ref().map(|t| t.state())
    }

    /// Wait for a pending texture decode; the upload still happens on the next frame.
    pub async fn texture_decoded(&mut self) {
        if let Some(texture) = self.texture.as_mut() {
            texture.wait().await;
        }
    }

    pub fn draw_count(&self) -> i32 {
        self.draw_count
    }
}

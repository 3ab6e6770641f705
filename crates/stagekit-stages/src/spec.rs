//! Stage descriptions.
//!
//! A [`StageSpec`] lists everything a demo needs: its shader pair, vertex
//! streams, optional indices, static uniforms, camera, spin and clear state.
//! Setting it up and drawing it is [`crate::PreparedStage`]'s job.

use stagekit_common::{Result, StageKitError};
use stagekit_gl::{constants, IndexData, TextureSource, VertexAttrib};
use stagekit_math::{Matrix4, Perspective};

/// How a stage issues its draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Non-indexed triangles.
    Arrays { first: i32, count: i32 },
    /// Indexed triangles over the whole index buffer.
    Elements,
}

/// One vertex buffer and the attributes it feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexStream {
    pub data: Vec<f32>,
    pub attributes: Vec<VertexAttrib>,
}

/// Uniform value written once during setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformInit {
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

/// Perspective camera with a fixed view transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSpec {
    pub perspective: Perspective,
    pub translation: [f64; 3],
    /// Applied in order after the translation, each as `rotate_self(x, y, z)`.
    pub rotations: Vec<[f64; 3]>,
    /// Uniform that receives the camera matrix at setup, if any.
    pub uniform: Option<String>,
}

impl CameraSpec {
    pub fn new(perspective: Perspective) -> Self {
        Self {
            perspective,
            translation: [0.0; 3],
            rotations: Vec::new(),
            uniform: None,
        }
    }

    pub fn translate(mut self, x: f64, y: f64, z: f64) -> Self {
        self.translation = [x, y, z];
        self
    }

    pub fn rotate(mut self, x: f64, y: f64, z: f64) -> Self {
        self.rotations.push([x, y, z]);
        self
    }

    pub fn bind_uniform(mut self, name: impl Into<String>) -> Self {
        self.uniform = Some(name.into());
        self
    }

    /// Projection followed by the view transform, for a canvas of this size.
    pub fn matrix(&self, width: f64, height: f64) -> Matrix4 {
        let mut m = self.perspective.matrix(width, height);
        let [tx, ty, tz] = self.translation;
        m.translate_self(tx, ty, tz);
        for [rx, ry, rz] in &self.rotations {
            m.rotate_self(*rx, *ry, *rz);
        }
        m
    }
}

/// Per-frame model rotation.
///
/// Each frame the angle grows by `step_degrees` and the model becomes
/// `rotate(0, angle, -angle)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinSpec {
    pub step_degrees: f64,
    pub model_uniform: String,
    pub mvp_uniform: String,
}

/// A texture bound to a sampler uniform.
#[derive(Debug, Clone)]
pub struct TextureSpec {
    pub sampler: String,
    pub source: TextureSource,
}

/// Everything needed to set up and draw one demo.
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub name: String,
    pub description: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub streams: Vec<VertexStream>,
    pub indices: Option<IndexData>,
    pub draw: DrawMode,
    pub uniforms: Vec<(String, UniformInit)>,
    /// Attribute value used while its array is disabled (`vertexAttrib4f`).
    pub constant_attrib: Option<(String, [f32; 4])>,
    pub camera: Option<CameraSpec>,
    pub spin: Option<SpinSpec>,
    pub texture: Option<TextureSpec>,
    pub depth_test: bool,
    pub clear_color: [f32; 4],
    pub clear_mask: u32,
}

impl StageSpec {
    pub fn builder(name: impl Into<String>) -> StageSpecBuilder {
        StageSpecBuilder::new(name.into())
    }

    /// Swap the image of a textured stage. Returns false when the stage has no texture.
    pub fn set_texture_source(&mut self, source: TextureSource) -> bool {
        match self.texture.as_mut() {
            Some(texture) => {
                texture.source = source;
                true
            }
            None => false,
        }
    }

    /// Number of vertices or indices the draw call consumes.
    pub fn draw_count(&self) -> usize {
        match (self.draw, &self.indices) {
            (DrawMode::Arrays { count, .. }, _) => count.max(0) as usize,
            (DrawMode::Elements, Some(indices)) => indices.len(),
            (DrawMode::Elements, None) => 0,
        }
    }
}

type AttribLayout = (String, u32, u32, u32);

/// Builder for [`StageSpec`]. Layouts are validated in [`StageSpecBuilder::build`].
#[derive(Debug)]
pub struct StageSpecBuilder {
    name: String,
    description: String,
    vertex_shader: String,
    fragment_shader: String,
    streams: Vec<(Vec<f32>, Vec<AttribLayout>)>,
    indices: Option<IndexData>,
    draw: Option<DrawMode>,
    uniforms: Vec<(String, UniformInit)>,
    constant_attrib: Option<(String, [f32; 4])>,
    camera: Option<CameraSpec>,
    spin: Option<SpinSpec>,
    texture: Option<TextureSpec>,
    depth_test: bool,
    clear_color: [f32; 4],
    clear_mask: u32,
}

impl StageSpecBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            description: String::new(),
            vertex_shader: String::new(),
            fragment_shader: String::new(),
            streams: Vec::new(),
            indices: None,
            draw: None,
            uniforms: Vec::new(),
            constant_attrib: None,
            camera: None,
            spin: None,
            texture: None,
            depth_test: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_mask: constants::COLOR_BUFFER_BIT,
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn shaders(mut self, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.vertex_shader = vertex.into();
        self.fragment_shader = fragment.into();
        self
    }

    /// Add a vertex buffer. Each attribute is `(name, size, stride, offset)` in floats.
    pub fn stream(mut self, data: &[f32], attributes: &[(&str, u32, u32, u32)]) -> Self {
        let layouts = attributes
            .iter()
            .map(|(name, size, stride, offset)| (name.to_string(), *size, *stride, *offset))
            .collect();
        self.streams.push((data.to_vec(), layouts));
        self
    }

    /// Indexed drawing over `indices`.
    pub fn indices(mut self, indices: IndexData) -> Self {
        self.indices = Some(indices);
        self.draw = Some(DrawMode::Elements);
        self
    }

    pub fn draw_arrays(mut self, first: i32, count: i32) -> Self {
        self.draw = Some(DrawMode::Arrays { first, count });
        self
    }

    pub fn uniform(mut self, name: impl Into<String>, value: UniformInit) -> Self {
        self.uniforms.push((name.into(), value));
        self
    }

    pub fn constant_attrib(mut self, name: impl Into<String>, value: [f32; 4]) -> Self {
        self.constant_attrib = Some((name.into(), value));
        self
    }

    pub fn camera(mut self, camera: CameraSpec) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn spin(
        mut self,
        step_degrees: f64,
        model_uniform: impl Into<String>,
        mvp_uniform: impl Into<String>,
    ) -> Self {
        self.spin = Some(SpinSpec {
            step_degrees,
            model_uniform: model_uniform.into(),
            mvp_uniform: mvp_uniform.into(),
        });
        self
    }

    pub fn texture(mut self, sampler: impl Into<String>, source: TextureSource) -> Self {
        self.texture = Some(TextureSpec {
            sampler: sampler.into(),
            source,
        });
        self
    }

    /// Enable depth testing and clear depth along with colour.
    pub fn depth_test(mut self) -> Self {
        self.depth_test = true;
        self.clear_mask |= constants::DEPTH_BUFFER_BIT;
        self
    }

    pub fn clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    pub fn clear_mask(mut self, mask: u32) -> Self {
        self.clear_mask = mask;
        self
    }

    pub fn build(self) -> Result<StageSpec> {
        let name = self.name;
        let Some(draw) = self.draw else {
            return Err(StageKitError::config(format!(
                "stage '{name}' has no draw call"
            )));
        };
        if self.streams.is_empty() {
            return Err(StageKitError::config(format!(
                "stage '{name}' has no vertex data"
            )));
        }
        if self.spin.is_some() && self.camera.is_none() {
            return Err(StageKitError::config(format!(
                "stage '{name}' spins without a camera"
            )));
        }

        let mut streams = Vec::with_capacity(self.streams.len());
        for (data, layouts) in self.streams {
            let mut attributes = Vec::with_capacity(layouts.len());
            for (attr_name, size, stride, offset) in layouts {
                let attrib = VertexAttrib::new(attr_name, size, stride, offset).map_err(|e| {
                    StageKitError::config_with_source(format!("stage '{name}'"), e)
                })?;
                attributes.push(attrib);
            }
            streams.push(VertexStream { data, attributes });
        }

        Ok(StageSpec {
            name,
            description: self.description,
            vertex_shader: self.vertex_shader,
            fragment_shader: self.fragment_shader,
            streams,
            indices: self.indices,
            draw,
            uniforms: self.uniforms,
            constant_attrib: self.constant_attrib,
            camera: self.camera,
            spin: self.spin,
            texture: self.texture,
            depth_test: self.depth_test,
            clear_color: self.clear_color,
            clear_mask: self.clear_mask,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagekit_math::Vec3;

    fn minimal() -> StageSpecBuilder {
        StageSpec::builder("test")
            .shaders("vs", "fs")
            .stream(&[0.0; 9], &[("position", 3, 3, 0)])
    }

    #[test]
    fn test_build_defaults() {
        let spec = minimal().draw_arrays(0, 3).build().unwrap();
        assert_eq!(spec.draw, DrawMode::Arrays { first: 0, count: 3 });
        assert_eq!(spec.clear_mask, constants::COLOR_BUFFER_BIT);
        assert_eq!(spec.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert!(!spec.depth_test);
        assert_eq!(spec.streams[0].attributes[0].byte_stride(), 12);
        assert_eq!(spec.draw_count(), 3);
    }

    #[test]
    fn test_depth_test_adds_depth_clear() {
        let spec = minimal().draw_arrays(0, 3).depth_test().build().unwrap();
        assert!(spec.depth_test);
        assert_eq!(
            spec.clear_mask,
            constants::COLOR_BUFFER_BIT | constants::DEPTH_BUFFER_BIT
        );
    }

    #[test]
    fn test_build_rejects_bad_layout() {
        let err = StageSpec::builder("bad")
            .stream(&[0.0; 6], &[("color", 3, 6, 4)])
            .draw_arrays(0, 1)
            .build()
            .unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_build_requires_draw_and_camera_for_spin() {
        assert!(minimal().build().is_err());
        assert!(minimal().draw_arrays(0, 3).spin(1.0, "model", "mvp").build().is_err());
    }

    #[test]
    fn test_indices_select_element_draw() {
        let spec = minimal()
            .indices(IndexData::U8(vec![0, 1, 2]))
            .build()
            .unwrap();
        assert_eq!(spec.draw, DrawMode::Elements);
        assert_eq!(spec.draw_count(), 3);
    }

    #[test]
    fn test_camera_matrix_applies_view_after_projection() {
        let camera = CameraSpec::new(Perspective::default())
            .translate(0.0, 0.0, -5.0)
            .rotate(0.0, 33.0, 0.0);

        let mut expected = Perspective::default().matrix(640.0, 480.0);
        expected.multiply_self(&Matrix4::translation(0.0, 0.0, -5.0));
        expected.multiply_self(&Matrix4::rotation_y(33.0));
        assert!(camera.matrix(640.0, 480.0).approx_eq(&expected, 1e-12));

        // the origin lands in front of the camera
        let clip = camera.matrix(640.0, 480.0).transform_point(Vec3::ZERO);
        assert!(clip[3] > 0.0);
    }

    #[test]
    fn test_set_texture_source() {
        let mut plain = minimal().draw_arrays(0, 3).build().unwrap();
        assert!(!plain.set_texture_source(TextureSource::Encoded(Vec::new())));

        let mut textured = minimal()
            .draw_arrays(0, 3)
            .texture("theSampler", TextureSource::Encoded(Vec::new()))
            .build()
            .unwrap();
        assert!(textured.set_texture_source(TextureSource::Path("a.png".into())));
        assert!(matches!(
            textured.texture.unwrap().source,
            TextureSource::Path(_)
        ));
    }
}

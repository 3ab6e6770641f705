//! The built-in stages.

use stagekit_common::{OptionExt, Result};
use stagekit_gl::{IndexData, TextureSource};
use stagekit_math::Perspective;

use crate::shaders;
use crate::spec::{CameraSpec, StageSpec, UniformInit};

/// Names accepted by [`by_name`], in presentation order.
pub const NAMES: &[&str] = &[
    "triangle",
    "colored-cube",
    "perspective-cube",
    "rotating-cube",
    "lighted-cube",
    "textured-cube",
];

pub fn names() -> &'static [&'static str] {
    NAMES
}

/// Look up a built-in stage.
pub fn by_name(name: &str) -> Result<StageSpec> {
    let build: Option<fn() -> Result<StageSpec>> = match name {
        "triangle" => Some(triangle),
        "colored-cube" => Some(colored_cube),
        "perspective-cube" => Some(perspective_cube),
        "rotating-cube" => Some(rotating_cube),
        "lighted-cube" => Some(lighted_cube),
        "textured-cube" => Some(textured_cube),
        _ => None,
    };
    let build = build.ok_or_not_found(format!("stage '{name}'"))?;
    build()
}

/// Every built-in stage.
pub fn all() -> Result<Vec<StageSpec>> {
    NAMES.iter().map(|name| by_name(name)).collect()
}

// ==================== Geometry ====================

const TRIANGLE: [f32; 9] = [
    0.0, 0.5, 0.0, //
    -0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0,
];

/// Eight shared corners, `[x, y, z, r, g, b]` each.
const CUBE_CORNERS: [f32; 48] = [
    1.0, 1.0, 1.0, 1.0, 1.0, 1.0, // v0 white
    -1.0, 1.0, 1.0, 1.0, 0.0, 1.0, // v1 magenta
    -1.0, -1.0, 1.0, 1.0, 0.0, 0.0, // v2 red
    1.0, -1.0, 1.0, 1.0, 1.0, 0.0, // v3 yellow
    1.0, -1.0, -1.0, 0.0, 1.0, 0.0, // v4 green
    1.0, 1.0, -1.0, 0.0, 1.0, 1.0, // v5 cyan
    -1.0, 1.0, -1.0, 0.0, 0.0, 1.0, // v6 blue
    -1.0, -1.0, -1.0, 0.0, 0.0, 0.0, // v7 black
];

const CUBE_CORNER_INDICES: [u8; 36] = [
    0, 1, 2, 0, 2, 3, //
    0, 3, 4, 0, 4, 5, //
    0, 5, 6, 0, 6, 1, //
    1, 6, 7, 1, 7, 2, //
    7, 4, 3, 7, 3, 2, //
    4, 7, 6, 4, 6, 5,
];

/// Four corners per face so each face can carry its own normal.
const FACE_POSITIONS: [f32; 72] = [
    1.0, 1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, // front
    1.0, 1.0, 1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, // right
    1.0, 1.0, 1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, // up
    -1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 1.0, // left
    -1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0, // down
    1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, // back
];

const FACE_COLORS: [f32; 72] = [
    1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
    1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, //
    1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0,
];

const FACE_NORMALS: [f32; 72] = [
    0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, // front
    1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, // right
    0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, // up
    -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, // left
    0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, // down
    0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0, // back
];

/// Face positions interleaved with texture coordinates, `[x, y, z, u, v]`.
const FACE_TEXTURED: [f32; 120] = [
    1.0, 1.0, 1.0, 1.0, 1.0, //
    -1.0, 1.0, 1.0, 0.0, 1.0, //
    -1.0, -1.0, 1.0, 0.0, 0.0, //
    1.0, -1.0, 1.0, 1.0, 0.0, // front
    1.0, 1.0, 1.0, 1.0, 1.0, //
    1.0, -1.0, 1.0, 0.0, 1.0, //
    1.0, -1.0, -1.0, 0.0, 0.0, //
    1.0, 1.0, -1.0, 1.0, 0.0, // right
    1.0, 1.0, 1.0, 1.0, 1.0, //
    1.0, 1.0, -1.0, 1.0, 0.0, //
    -1.0, 1.0, -1.0, 0.0, 0.0, //
    -1.0, 1.0, 1.0, 0.0, 1.0, // up
    -1.0, 1.0, 1.0, 1.0, 1.0, //
    -1.0, 1.0, -1.0, 1.0, 0.0, //
    -1.0, -1.0, -1.0, 0.0, 0.0, //
    -1.0, -1.0, 1.0, 0.0, 1.0, // left
    -1.0, -1.0, -1.0, 0.0, 0.0, //
    1.0, -1.0, -1.0, 1.0, 0.0, //
    1.0, -1.0, 1.0, 1.0, 1.0, //
    -1.0, -1.0, 1.0, 0.0, 1.0, // down
    1.0, -1.0, -1.0, 1.0, 0.0, //
    -1.0, -1.0, -1.0, 0.0, 0.0, //
    -1.0, 1.0, -1.0, 0.0, 1.0, //
    1.0, 1.0, -1.0, 1.0, 1.0, // back
];

const FACE_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3, // front
    4, 5, 6, 4, 6, 7, // right
    8, 9, 10, 8, 10, 11, // up
    12, 13, 14, 12, 14, 15, // left
    16, 17, 18, 16, 18, 19, // down
    20, 21, 22, 20, 22, 23, // back
];

const LIGHT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const LIGHT_POSITION: [f32; 3] = [1.4, 1.3, 1.5];
const AMBIENT_LIGHT: [f32; 3] = [0.1, 0.1, 0.1];

/// Size of the generated texture used when no image is configured.
const CHECKERBOARD_SIZE: u32 = 256;

fn default_perspective() -> Perspective {
    Perspective::new(30.0, 0.01, 100.0)
}

/// Camera orbiting the cube sideways.
fn side_camera() -> CameraSpec {
    CameraSpec::new(default_perspective())
        .translate(0.0, 0.0, -5.0)
        .rotate(0.0, 33.0, 0.0)
}

/// Camera looking down at a corner of the cube.
fn corner_camera() -> CameraSpec {
    CameraSpec::new(default_perspective())
        .translate(0.0, 0.0, -5.0)
        .rotate(40.0, 0.0, 0.0)
        .rotate(0.0, -45.0, 0.0)
}

// ==================== Stages ====================

/// A red triangle in clip space.
pub fn triangle() -> Result<StageSpec> {
    StageSpec::builder("triangle")
        .description("Red triangle, uniform colour, no transform")
        .shaders(shaders::FLAT_VERT, shaders::FLAT_FRAG)
        .stream(&TRIANGLE, &[("position", 3, 3, 0)])
        .constant_attrib("position", [0.0, 0.0, 0.0, 1.0])
        .uniform("color", UniformInit::Vec4([1.0, 0.0, 0.0, 1.0]))
        .draw_arrays(0, 3)
        .build()
}

/// Cube with per-corner colours, drawn without a camera.
pub fn colored_cube() -> Result<StageSpec> {
    StageSpec::builder("colored-cube")
        .description("Vertex-coloured cube, 8-bit indices, no projection")
        .shaders(shaders::VERTEX_COLOR_VERT, shaders::VERTEX_COLOR_FRAG)
        .stream(&CUBE_CORNERS, &[("position", 3, 6, 0), ("color", 3, 6, 3)])
        .indices(IndexData::U8(CUBE_CORNER_INDICES.to_vec()))
        .build()
}

/// The coloured cube seen through a perspective camera.
pub fn perspective_cube() -> Result<StageSpec> {
    StageSpec::builder("perspective-cube")
        .description("Vertex-coloured cube through a fixed perspective camera")
        .shaders(shaders::CAMERA_COLOR_VERT, shaders::VERTEX_COLOR_FRAG)
        .stream(&CUBE_CORNERS, &[("position", 3, 6, 0), ("color", 3, 6, 3)])
        .indices(IndexData::U8(CUBE_CORNER_INDICES.to_vec()))
        .camera(side_camera().bind_uniform("camera"))
        .depth_test()
        .build()
}

/// The coloured cube spinning half a degree per frame.
pub fn rotating_cube() -> Result<StageSpec> {
    StageSpec::builder("rotating-cube")
        .description("Vertex-coloured cube spinning 0.5 degrees per frame")
        .shaders(shaders::MODELVIEW_COLOR_VERT, shaders::VERTEX_COLOR_FRAG)
        .stream(&CUBE_CORNERS, &[("position", 3, 6, 0), ("color", 3, 6, 3)])
        .indices(IndexData::U16(
            CUBE_CORNER_INDICES.iter().map(|&i| u16::from(i)).collect(),
        ))
        .camera(side_camera())
        .spin(0.5, "model", "mvp")
        .depth_test()
        .build()
}

fn with_lights(builder: crate::spec::StageSpecBuilder) -> crate::spec::StageSpecBuilder {
    builder
        .uniform("lightColor", UniformInit::Vec3(LIGHT_COLOR))
        .uniform("lightPosition", UniformInit::Vec3(LIGHT_POSITION))
        .uniform("ambientLight", UniformInit::Vec3(AMBIENT_LIGHT))
}

/// Per-face coloured cube under a diffuse and ambient light.
pub fn lighted_cube() -> Result<StageSpec> {
    let builder = StageSpec::builder("lighted-cube")
        .description("Lit cube with per-face normals, one buffer per attribute")
        .shaders(shaders::LIGHTED_COLOR_VERT, shaders::VERTEX_COLOR_FRAG)
        .stream(&FACE_POSITIONS, &[("position", 3, 3, 0)])
        .stream(&FACE_COLORS, &[("color", 3, 3, 0)])
        .stream(&FACE_NORMALS, &[("normal", 3, 3, 0)])
        .indices(IndexData::U16(FACE_INDICES.to_vec()))
        .camera(corner_camera())
        .spin(1.0, "model", "mvp")
        .depth_test();
    with_lights(builder).build()
}

/// The lit cube with a texture instead of vertex colours.
///
/// Uses a generated checkerboard until a caller swaps in an image with
/// [`StageSpec::set_texture_source`].
pub fn textured_cube() -> Result<StageSpec> {
    let builder = StageSpec::builder("textured-cube")
        .description("Lit, textured cube; texture decoded in the background")
        .shaders(shaders::LIGHTED_TEXTURE_VERT, shaders::LIGHTED_TEXTURE_FRAG)
        .stream(&FACE_TEXTURED, &[("position", 3, 5, 0), ("texCoord", 2, 5, 3)])
        .stream(&FACE_NORMALS, &[("normal", 3, 3, 0)])
        .indices(IndexData::U16(FACE_INDICES.to_vec()))
        .texture(
            "theSampler",
            TextureSource::checkerboard(CHECKERBOARD_SIZE, 8, [230, 230, 230], [190, 20, 40]),
        )
        .camera(corner_camera())
        .spin(1.0, "model", "mvp")
        .depth_test();
    with_lights(builder).build()
}

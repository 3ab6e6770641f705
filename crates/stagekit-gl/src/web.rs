//! [`RenderContext`] for a browser WebGL2 context.
//!
//! Canvas lookup and context creation are left to the embedding page.

use tracing::warn;
use wasm_bindgen::JsValue;
use web_sys::{
    WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader, WebGlTexture,
    WebGlUniformLocation,
};

use crate::context::{BufferTarget, BufferUsage, IndexType, RenderContext, ShaderKind};

fn log_js_error(call: &str, err: JsValue) {
    warn!(call, error = ?err, "WebGL call failed");
}

impl RenderContext for Gl {
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type Buffer = WebGlBuffer;
    type Texture = WebGlTexture;
    type UniformLocation = WebGlUniformLocation;

    fn is_context_lost(&self) -> bool {
        Gl::is_context_lost(self)
    }

    fn parameter_string(&self, pname: u32) -> Option<String> {
        match Gl::get_parameter(self, pname) {
            Ok(value) => value.as_string(),
            Err(err) => {
                log_js_error("getParameter", err);
                None
            }
        }
    }

    fn create_shader(&mut self, kind: ShaderKind) -> Option<WebGlShader> {
        Gl::create_shader(self, kind.to_gl())
    }

    fn shader_source(&mut self, shader: &WebGlShader, source: &str) {
        Gl::shader_source(self, shader, source);
    }

    fn compile_shader(&mut self, shader: &WebGlShader) {
        Gl::compile_shader(self, shader);
    }

    fn shader_info_log(&self, shader: &WebGlShader) -> Option<String> {
        Gl::get_shader_info_log(self, shader)
    }

    fn create_program(&mut self) -> Option<WebGlProgram> {
        Gl::create_program(self)
    }

    fn attach_shader(&mut self, program: &WebGlProgram, shader: &WebGlShader) {
        Gl::attach_shader(self, program, shader);
    }

    fn link_program(&mut self, program: &WebGlProgram) {
        Gl::link_program(self, program);
    }

    fn program_info_log(&self, program: &WebGlProgram) -> Option<String> {
        Gl::get_program_info_log(self, program)
    }

    fn use_program(&mut self, program: Option<&WebGlProgram>) {
        Gl::use_program(self, program);
    }

    fn attrib_location(&self, program: &WebGlProgram, name: &str) -> i32 {
        Gl::get_attrib_location(self, program, name)
    }

    fn uniform_location(&self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        Gl::get_uniform_location(self, program, name)
    }

    fn create_buffer(&mut self) -> Option<WebGlBuffer> {
        Gl::create_buffer(self)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<&WebGlBuffer>) {
        Gl::bind_buffer(self, target.to_gl(), buffer);
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        Gl::buffer_data_with_u8_array(self, target.to_gl(), data, usage.to_gl());
    }

    fn delete_buffer(&mut self, buffer: &WebGlBuffer) {
        Gl::delete_buffer(self, Some(buffer));
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        Gl::vertex_attrib_pointer_with_i32(self, index, size, type_, normalized, stride, offset);
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        Gl::enable_vertex_attrib_array(self, index);
    }

    fn vertex_attrib4f(&mut self, index: u32, x: f32, y: f32, z: f32, w: f32) {
        Gl::vertex_attrib4f(self, index, x, y, z, w);
    }

    fn uniform1i(&mut self, location: Option<&WebGlUniformLocation>, x: i32) {
        Gl::uniform1i(self, location, x);
    }

    fn uniform3f(&mut self, location: Option<&WebGlUniformLocation>, x: f32, y: f32, z: f32) {
        Gl::uniform3f(self, location, x, y, z);
    }

    fn uniform4f(
        &mut self,
        location: Option<&WebGlUniformLocation>,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    ) {
        Gl::uniform4f(self, location, x, y, z, w);
    }

    fn uniform_matrix4fv(&mut self, location: Option<&WebGlUniformLocation>, value: &[f32; 16]) {
        Gl::uniform_matrix4fv_with_f32_array(self, location, false, value);
    }

    fn create_texture(&mut self) -> Option<WebGlTexture> {
        Gl::create_texture(self)
    }

    fn active_texture(&mut self, unit: u32) {
        Gl::active_texture(self, unit);
    }

    fn bind_texture(&mut self, target: u32, texture: Option<&WebGlTexture>) {
        Gl::bind_texture(self, target, texture);
    }

    fn tex_parameteri(&mut self, target: u32, pname: u32, param: i32) {
        Gl::tex_parameteri(self, target, pname, param);
    }

    fn pixel_storei(&mut self, pname: u32, param: i32) {
        Gl::pixel_storei(self, pname, param);
    }

    fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: u32,
        height: u32,
        format: u32,
        type_: u32,
        pixels: &[u8],
    ) {
        let result = Gl::tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            self,
            target,
            level,
            internal_format as i32,
            width as i32,
            height as i32,
            0,
            format,
            type_,
            Some(pixels),
        );
        if let Err(err) = result {
            log_js_error("texImage2D", err);
        }
    }

    fn delete_texture(&mut self, texture: &WebGlTexture) {
        Gl::delete_texture(self, Some(texture));
    }

    fn enable(&mut self, cap: u32) {
        Gl::enable(self, cap);
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        Gl::clear_color(self, r, g, b, a);
    }

    fn clear(&mut self, mask: u32) {
        Gl::clear(self, mask);
    }

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        Gl::draw_arrays(self, mode, first, count);
    }

    fn draw_elements(&mut self, mode: u32, count: i32, index_type: IndexType, offset: i32) {
        Gl::draw_elements_with_i32(self, mode, count, index_type.to_gl(), offset);
    }
}

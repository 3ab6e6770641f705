//! Binding helpers driven against the recording context

use stagekit_gl::{
    compile_program, constants, upload_index_buffer, upload_vertex_buffer, GlError, IndexData,
    RecordingContext, RenderContext, VertexAttrib,
};

const VERTEX_SHADER: &str = "#version 300 es
in vec3 position;
in vec3 color;
out vec3 vColor;
void main() {
  gl_Position = vec4(position, 1.0);
  vColor = color;
}";

const FRAGMENT_SHADER: &str = "#version 300 es
precision highp float;
in vec3 vColor;
out vec4 fragColor;
void main() {
  fragColor = vec4(vColor, 1.0);
}";

fn interleaved_attributes() -> Vec<VertexAttrib> {
    vec![
        VertexAttrib::new("position", 3, 6, 0).unwrap(),
        VertexAttrib::new("color", 3, 6, 3).unwrap(),
    ]
}

#[test]
fn interleaved_attributes_share_one_buffer() {
    let mut ctx = RecordingContext::new(64, 64);
    let linked = compile_program(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER).unwrap();

    // two vertices: position then colour
    let vertices = [
        0.0, 0.5, 0.0, 1.0, 0.0, 0.0, //
        -0.5, -0.5, 0.0, 0.0, 1.0, 0.0,
    ];
    let buffer =
        upload_vertex_buffer(&mut ctx, &linked.program, &vertices, &interleaved_attributes())
            .unwrap();

    let position = ctx.attrib_location(&linked.program, "position") as u32;
    let color = ctx.attrib_location(&linked.program, "color") as u32;

    let position_slot = ctx.vertex_attrib(position).unwrap();
    assert!(position_slot.enabled);
    assert_eq!(position_slot.size, 3);
    assert_eq!(position_slot.type_, constants::FLOAT);
    assert!(!position_slot.normalized);
    assert_eq!(position_slot.stride, 24);
    assert_eq!(position_slot.offset, 0);
    assert_eq!(position_slot.buffer, Some(buffer));

    let color_slot = ctx.vertex_attrib(color).unwrap();
    assert!(color_slot.enabled);
    assert_eq!(color_slot.stride, 24);
    assert_eq!(color_slot.offset, 12);
    assert_eq!(color_slot.buffer, Some(buffer));

    let data = ctx.get_buffer_data(&buffer).unwrap();
    assert_eq!(data.data.len(), vertices.len() * 4);
    assert_eq!(ctx.get_error(), constants::NO_ERROR);
}

#[test]
fn invalid_shader_still_yields_program() {
    let mut ctx = RecordingContext::new(64, 64);
    let broken = "#version 300 es\nin vec3 position;\nvoid main() {\n  gl_Position = vec4(position, 1.0;\n}";

    let linked = compile_program(&mut ctx, broken, FRAGMENT_SHADER).unwrap();

    assert_ne!(linked.report.vertex, "OK");
    assert!(linked.report.vertex.contains("ERROR"));
    assert_eq!(linked.report.fragment, "OK");
    assert_ne!(linked.report.link, "OK");
    assert!(!linked.report.is_clean());
    assert!(ctx.get_program_data(&linked.program).is_some());
}

#[test]
fn lost_context_fails_without_panicking() {
    let mut ctx = RecordingContext::new(64, 64);
    ctx.lose_context();

    let err = compile_program(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER).unwrap_err();
    assert_eq!(err, GlError::ContextLost);
    assert!(err.is_missing_dependency());
}

#[test]
fn lost_context_rejects_uploads() {
    let mut ctx = RecordingContext::new(64, 64);
    let linked = compile_program(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
    ctx.lose_context();

    let vertex = upload_vertex_buffer(&mut ctx, &linked.program, &[0.0; 6], &[]);
    assert_eq!(vertex.unwrap_err(), GlError::ContextLost);
    let index = upload_index_buffer(&mut ctx, &IndexData::U8(vec![0, 1, 2]));
    assert_eq!(index.unwrap_err(), GlError::ContextLost);
}

#[test]
fn empty_attribute_list_still_uploads() {
    let mut ctx = RecordingContext::new(64, 64);
    let linked = compile_program(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER).unwrap();

    let buffer = upload_vertex_buffer(&mut ctx, &linked.program, &[1.0, 2.0, 3.0], &[]).unwrap();

    assert_eq!(ctx.get_buffer_data(&buffer).unwrap().data.len(), 12);
    assert!(ctx.state().vertex_attribs.iter().all(|slot| !slot.enabled));
}

#[test]
fn each_upload_creates_a_new_buffer() {
    let mut ctx = RecordingContext::new(64, 64);
    let linked = compile_program(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
    let data = [0.0; 12];

    let first =
        upload_vertex_buffer(&mut ctx, &linked.program, &data, &interleaved_attributes()).unwrap();
    let second =
        upload_vertex_buffer(&mut ctx, &linked.program, &data, &interleaved_attributes()).unwrap();

    assert_ne!(first, second);
    assert_eq!(ctx.live_buffer_count(), 2);

    // locations were re-resolved and now point at the newest buffer
    let position = ctx.attrib_location(&linked.program, "position") as u32;
    assert_eq!(ctx.vertex_attrib(position).unwrap().buffer, Some(second));
}

#[test]
fn unknown_attribute_is_skipped() {
    let mut ctx = RecordingContext::new(64, 64);
    let linked = compile_program(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
    let attributes = [VertexAttrib::packed("normal", 3).unwrap()];

    let buffer = upload_vertex_buffer(&mut ctx, &linked.program, &[0.0; 3], &attributes);

    assert!(buffer.is_ok());
    assert_eq!(ctx.get_error(), constants::NO_ERROR);
    assert!(ctx.state().vertex_attribs.iter().all(|slot| !slot.enabled));
}

#[test]
fn index_buffer_draws_with_matching_width() {
    let mut ctx = RecordingContext::new(64, 64);
    let linked = compile_program(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
    upload_vertex_buffer(&mut ctx, &linked.program, &[0.0; 18], &interleaved_attributes())
        .unwrap();
    let indices = IndexData::U8(vec![0, 1, 2]);
    upload_index_buffer(&mut ctx, &indices).unwrap();

    ctx.draw_elements(constants::TRIANGLES, indices.len() as i32, indices.index_type(), 0);

    assert_eq!(ctx.get_error(), constants::NO_ERROR);
    assert_eq!(ctx.draw_calls().len(), 1);
}

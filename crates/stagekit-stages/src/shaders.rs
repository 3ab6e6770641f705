//! GLSL sources for the built-in stages.

/// GLSL ES 1.00 pass-through with a uniform colour.
pub const FLAT_VERT: &str = "
attribute vec4 position;
void main() {
  gl_Position = position;
}";

pub const FLAT_FRAG: &str = "
precision highp float;
uniform vec4 color;
void main() {
  gl_FragColor = color;
}";

/// Per-vertex colour, no transform.
pub const VERTEX_COLOR_VERT: &str = "#version 300 es
in vec4 position;
in vec4 color;
out vec4 vColor;
void main() {
  gl_Position = position;
  vColor = color;
}";

pub const VERTEX_COLOR_FRAG: &str = "#version 300 es
precision highp float;
in vec4 vColor;
out vec4 fragColor;
void main() {
  fragColor = vColor;
}";

/// Per-vertex colour through a single camera matrix.
pub const CAMERA_COLOR_VERT: &str = "#version 300 es
in vec4 position;
in vec4 color;
uniform mat4 camera;
out vec4 vColor;
void main() {
  gl_Position = camera * position;
  vColor = color;
}";

/// Per-vertex colour through a model-view-projection matrix.
pub const MODELVIEW_COLOR_VERT: &str = "#version 300 es
in vec4 position;
in vec4 color;
uniform mat4 model;
uniform mat4 mvp;
out vec4 vColor;
void main() {
  gl_Position = mvp * position;
  vColor = color;
}";

/// Diffuse point light plus ambient term, coloured vertices.
pub const LIGHTED_COLOR_VERT: &str = "#version 300 es
in vec4 position;
in vec4 color;
in vec3 normal;
uniform mat4 model;
uniform mat4 mvp;
uniform vec3 lightColor;
uniform vec3 lightPosition;
uniform vec3 ambientLight;
out vec4 vColor;
void main() {
  gl_Position = mvp * position;
  vec3 worldNormal = normalize(mat3(model) * normal);
  vec3 worldPosition = vec3(model * position);
  vec3 lightDirection = normalize(lightPosition - worldPosition);
  float diffuseFactor = max(dot(lightDirection, worldNormal), 0.0);
  vec3 diffuse = lightColor * color.rgb * diffuseFactor;
  vec3 ambient = ambientLight * color.rgb;
  vColor = vec4(diffuse + ambient, color.a);
}";

/// Same lighting as [`LIGHTED_COLOR_VERT`], modulating a texture instead.
pub const LIGHTED_TEXTURE_VERT: &str = "#version 300 es
in vec4 position;
in vec2 texCoord;
in vec3 normal;
uniform mat4 model;
uniform mat4 mvp;
uniform vec3 lightColor;
uniform vec3 lightPosition;
uniform vec3 ambientLight;
out vec2 vTexCoord;
out vec3 vLight;
void main() {
  gl_Position = mvp * position;
  vec3 worldNormal = normalize(mat3(model) * normal);
  vec3 worldPosition = vec3(model * position);
  vec3 lightDirection = normalize(lightPosition - worldPosition);
  float diffuseFactor = max(dot(lightDirection, worldNormal), 0.0);
  vLight = lightColor * diffuseFactor + ambientLight;
  vTexCoord = texCoord;
}";

pub const LIGHTED_TEXTURE_FRAG: &str = "#version 300 es
precision highp float;
in vec2 vTexCoord;
in vec3 vLight;
uniform sampler2D theSampler;
out vec4 fragColor;
void main() {
  vec4 texel = texture(theSampler, vTexCoord);
  fragColor = vec4(texel.rgb * vLight, texel.a);
}";

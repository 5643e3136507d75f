//! GLSL ES 3.00 sources for the particle field.
//!
//! `kernel` holds the same math on the CPU; keep the two in step.

/// Vertex/fragment source pair handed to a render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: &'static str,
    pub fragment: &'static str,
}

/// Attribute names bound by the surface, in buffer order.
pub mod attributes {
    pub const POSITION: &str = "position";
    pub const RANDOM_SEED: &str = "randomValues";
    pub const INSTANCE_INDEX: &str = "circleIndex";
    pub const UV: &str = "uv";
    pub const NORMAL: &str = "normal";
}

/// Built-in transform uniforms, set from the camera each frame.
pub mod builtins {
    pub const MODEL: &str = "modelMatrix";
    pub const VIEW: &str = "viewMatrix";
    pub const PROJECTION: &str = "projectionMatrix";
    pub const CAMERA_POSITION: &str = "cameraPosition";
}

pub const PARTICLE_FIELD: ShaderSource = ShaderSource {
    vertex: VERTEX,
    fragment: FRAGMENT,
};

pub const VERTEX: &str = r#"#version 300 es
precision highp float;
precision highp int;

uniform mat4 modelMatrix;
uniform mat4 viewMatrix;
uniform mat4 projectionMatrix;
uniform vec3 cameraPosition;

uniform float time;
// atlas layout, not read yet; unused uniforms resolve to null locations
uniform int instanceCount;
uniform int gridCols;
uniform int gridRows;

in vec3 position;
in vec3 randomValues;
in uint circleIndex;
in vec2 uv;

out vec4 vColor;
out vec2 vUv;

const float PI = 3.1415926535897932384626433832795;

float map(float value, float inputMin, float inputMax, float outputMin, float outputMax, bool clampResult) {
    if (clampResult) {
        if (value < inputMin) return outputMin;
        if (value > inputMax) return outputMax;
    }
    float p = (outputMax - outputMin) / (inputMax - inputMin);
    return ((value - inputMin) * p) + outputMin;
}

float cyclicAngle(float scale, float offset) {
    return map(mod(time * scale + offset, PI * 2.0), 0.0, PI * 2.0, -PI, PI, true);
}

vec3 rotateAboutAxis(vec3 p, float angle, vec3 axis) {
    vec3 a = normalize(axis);
    float s = sin(angle);
    float c = cos(angle);
    float r = 1.0 - c;
    mat3 m = mat3(
        a.x * a.x * r + c,
        a.y * a.x * r + a.z * s,
        a.z * a.x * r - a.y * s,
        a.x * a.y * r - a.z * s,
        a.y * a.y * r + c,
        a.z * a.y * r + a.x * s,
        a.x * a.z * r + a.y * s,
        a.y * a.z * r - a.x * s,
        a.z * a.z * r + c
    );
    return m * p;
}

float distanceAlpha(float d) {
    float da = abs(d - 400.0) / 500.0;
    return clamp(1.0 - da, 0.0, 1.0);
}

vec3 hsv2rgb(vec3 c) {
    vec4 K = vec4(1.0, 2.0 / 3.0, 1.0 / 3.0, 3.0);
    vec3 p = abs(fract(c.xxx + K.xyz) * 6.0 - K.www);
    return c.z * mix(K.xxx, clamp(p - K.xxx, 0.0, 1.0), c.y);
}

void main() {
    float radius = 80.0;
    vec3 pos = vec3(0.0);

    float theta = cyclicAngle(4.0, (randomValues.x + randomValues.y + randomValues.z) * 20.0);
    pos.z += radius + radius * map(sin(theta), -1.0, 1.0, 0.0, 1.0, true);
    pos = rotateAboutAxis(pos, cyclicAngle(4.0, randomValues.x * 20.0), vec3(0.0, 1.0, 0.0));
    pos = rotateAboutAxis(pos, cyclicAngle(4.0, randomValues.y * 20.0), vec3(1.0, 0.0, 0.0));
    pos = rotateAboutAxis(pos, cyclicAngle(4.0, randomValues.z * 20.0), vec3(0.0, 0.0, 1.0));

    vUv = uv - 0.5;

    vec4 modelPos = modelMatrix * vec4(pos, 1.0);
    vec4 viewPos = viewMatrix * modelPos;
    viewPos += vec4(position, 0.0);
    gl_Position = projectionMatrix * viewPos;

    float d = distance(cameraPosition, modelPos.xyz);
    float hue = (sin(cyclicAngle(2.0, randomValues.x * 2.0)) + 1.0) * 0.5;
    vColor = vec4(hsv2rgb(vec3(hue, 0.9, 0.8)), distanceAlpha(d));
}
"#;

pub const FRAGMENT: &str = r#"#version 300 es
precision highp float;

in vec4 vColor;
in vec2 vUv;

out vec4 fragColor;

void main() {
    vec2 center = vUv * 0.5;
    float lightness = 0.05 / length(vUv - center);
    vec4 color = vec4(vec3(lightness), 1.0) * vColor;
    if (color.r <= 0.2 || color.g <= 0.2 || color.b <= 0.2) {
        discard;
    }
    fragColor = color;
}
"#;

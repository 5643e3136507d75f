//! CPU rendition of the particle shader.
//!
//! Mirrors `shaders::VERTEX` and `shaders::FRAGMENT` step for step so the
//! motion and colour math can be checked without a GL context. Functions
//! named after GLSL built-ins follow GLSL semantics (`glsl_mod` floors,
//! unlike `%`).

use std::f32::consts::{PI, TAU};

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Radius of the orbit each instance travels on.
pub const ORBIT_RADIUS: f32 = 80.0;
/// Glyph radius in quad UV space.
pub const GLYPH_RADIUS: f32 = 0.05;
/// Fragments with any colour channel at or below this are discarded.
pub const DISCARD_THRESHOLD: f32 = 0.2;
pub const SATURATION: f32 = 0.9;
pub const VALUE: f32 = 0.8;
/// Distance from the camera at which instances are fully opaque.
pub const FADE_CENTER: f32 = 400.0;
/// Distance either side of `FADE_CENTER` over which alpha falls to zero.
pub const FADE_RANGE: f32 = 500.0;

/// Transforms and eye position for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
}

/// Vertex stage output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOut {
    pub clip_position: Vec4,
    pub color: Vec4,
    /// Quad UV recentred on (0, 0).
    pub uv: Vec2,
}

/// GLSL `mod`: result takes the sign of `y`.
pub fn glsl_mod(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Linear remap from `[in_min, in_max]` to `[out_min, out_max]`.
pub fn map_range(
    value: f32,
    in_min: f32,
    in_max: f32,
    out_min: f32,
    out_max: f32,
    clamp: bool,
) -> f32 {
    if clamp {
        if value < in_min {
            return out_min;
        }
        if value > in_max {
            return out_max;
        }
    }
    let p = (out_max - out_min) / (in_max - in_min);
    (value - in_min) * p + out_min
}

/// `time * scale + offset` wrapped into one turn and remapped to `[-π, π]`.
pub fn cyclic_angle(time: f32, scale: f32, offset: f32) -> f32 {
    map_range(glsl_mod(time * scale + offset, TAU), 0.0, TAU, -PI, PI, true)
}

/// Rotate `p` by `angle` radians about `axis`.
///
/// A zero axis leaves `p` unchanged.
pub fn rotate_about_axis(p: Vec3, angle: f32, axis: Vec3) -> Vec3 {
    match axis.try_normalize() {
        Some(axis) => Mat3::from_axis_angle(axis, angle) * p,
        None => p,
    }
}

/// HSV (all components in [0, 1]) to RGB.
pub fn hsv_to_rgb(hsv: Vec3) -> Vec3 {
    let k = Vec3::new(1.0, 2.0 / 3.0, 1.0 / 3.0);
    let p = ((Vec3::splat(hsv.x) + k).fract() * 6.0 - Vec3::splat(3.0)).abs();
    let channel = (p - Vec3::ONE).clamp(Vec3::ZERO, Vec3::ONE);
    hsv.z * (Vec3::ONE + (channel - Vec3::ONE) * hsv.y)
}

/// Opacity falloff around `FADE_CENTER`.
pub fn distance_alpha(distance: f32) -> f32 {
    let da = (distance - FADE_CENTER).abs() / FADE_RANGE;
    (1.0 - da).clamp(0.0, 1.0)
}

/// Model-space centre of an instance at `time`.
///
/// The instance is pushed out along +Z by a pulsing radius, then swung
/// about Y, X and Z by angles driven by its seed channels.
pub fn instance_center(seed: Vec3, time: f32) -> Vec3 {
    let theta = cyclic_angle(time, 4.0, (seed.x + seed.y + seed.z) * 20.0);
    let pulse = map_range(theta.sin(), -1.0, 1.0, 0.0, 1.0, true);
    let pos = Vec3::new(0.0, 0.0, ORBIT_RADIUS + ORBIT_RADIUS * pulse);

    let pos = rotate_about_axis(pos, cyclic_angle(time, 4.0, seed.x * 20.0), Vec3::Y);
    let pos = rotate_about_axis(pos, cyclic_angle(time, 4.0, seed.y * 20.0), Vec3::X);
    rotate_about_axis(pos, cyclic_angle(time, 4.0, seed.z * 20.0), Vec3::Z)
}

/// Per-instance RGBA: hue cycles with time, alpha fades with distance.
pub fn instance_color(seed: Vec3, time: f32, distance: f32) -> Vec4 {
    let hue = (cyclic_angle(time, 2.0, seed.x * 2.0).sin() + 1.0) * 0.5;
    hsv_to_rgb(Vec3::new(hue, SATURATION, VALUE)).extend(distance_alpha(distance))
}

/// Vertex stage for one quad corner.
///
/// The corner offset is added in view space, so every quad faces the camera.
pub fn shade_vertex(corner: Vec3, uv: Vec2, seed: Vec3, time: f32, frame: &FrameView) -> VertexOut {
    let center = instance_center(seed, time);
    let world = frame.model * center.extend(1.0);
    let eye = frame.view * world + corner.extend(0.0);
    let distance = frame.camera_position.distance(world.truncate());

    VertexOut {
        clip_position: frame.projection * eye,
        color: instance_color(seed, time, distance),
        uv: uv - Vec2::splat(0.5),
    }
}

/// Fragment stage. `None` means the fragment is discarded.
pub fn shade_fragment(uv: Vec2, color: Vec4) -> Option<Vec4> {
    let center = uv * 0.5;
    let lightness = GLYPH_RADIUS / uv.distance(center);
    let out = (color.truncate() * lightness).extend(color.w);
    if out.truncate().min_element() <= DISCARD_THRESHOLD {
        None
    } else {
        Some(out)
    }
}

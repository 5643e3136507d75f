#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

pub mod camera;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod shaders;
pub mod uniforms;

pub use config::{CameraConfig, FieldConfig, SurfaceConfig};
pub use controller::{ParticleField, RenderOutcome, RenderSurface};
pub use driver::{AnimationClock, AnimationDriver, DriverState, TickOutcome};
pub use error::{FieldError, Result};
pub use geometry::{QuadFieldBuffers, QuadFieldDescriptor};
pub use uniforms::{FieldUniforms, UniformKey, UniformValue};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use wasm_bindgen::prelude::*;

    use crate::config::FieldConfig;
    use crate::error::FieldError;

    mod render;
    pub mod surface;

    pub use surface::WebGlSurface;

    impl From<FieldError> for JsValue {
        fn from(e: FieldError) -> Self {
            JsValue::from_str(&e.to_string())
        }
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id("c")
            .ok_or("canvas not found")?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let config = FieldConfig::from_json(&canvas.get_attribute("data-field").unwrap_or_default())?;
        console_log::init_with_level(config.log_level()).ok();

        render::start(canvas, config)?;
        Ok(())
    }

    /// Stop the running field's animation loop.
    #[wasm_bindgen]
    pub fn stop() {
        render::stop();
    }
}

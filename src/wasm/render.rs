use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, HtmlCanvasElement, Performance, Window};

use super::surface::WebGlSurface;
use crate::config::{FieldConfig, SurfaceConfig};
use crate::controller::ParticleField;
use crate::driver::{AnimationClock, AnimationDriver};
use crate::geometry;
use crate::shaders::PARTICLE_FIELD;

/// `performance.now()` clock. Frame requests are recorded and issued by the
/// animation-frame closure after each tick.
pub struct RafClock {
    performance: Performance,
    pending: bool,
}

impl RafClock {
    fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl AnimationClock for RafClock {
    fn now(&self) -> f64 {
        self.performance.now()
    }

    fn request_next_frame(&mut self) {
        self.pending = true;
    }
}

struct FieldLoop {
    field: ParticleField<WebGlSurface>,
    driver: AnimationDriver<RafClock>,
}

thread_local! {
    static RUNNING: RefCell<Option<Rc<RefCell<FieldLoop>>>> = RefCell::new(None);
}

/// Build the particle field on `canvas` and start its animation loop.
pub fn start(canvas: HtmlCanvasElement, config: FieldConfig) -> Result<(), JsValue> {
    let window = window().ok_or("no window")?;
    let performance = window.performance().ok_or("no performance clock")?;

    let surface = WebGlSurface::new(canvas)?;
    let mut field = ParticleField::initialize(surface, surface_size(&window), &config);
    let buffers = geometry::build(config.quad_size, config.instance_count)?;
    field.build_drawable(&buffers, &PARTICLE_FIELD)?;

    let driver = AnimationDriver::new(
        RafClock {
            performance,
            pending: false,
        },
        config.time_divisor,
    )?;
    let state = Rc::new(RefCell::new(FieldLoop { field, driver }));

    // Resize canvas to fit window
    let resize_closure = {
        let state = state.clone();
        Closure::wrap(Box::new(move || {
            if let Some(window) = web_sys::window() {
                state
                    .borrow_mut()
                    .field
                    .on_surface_change(surface_size(&window));
            }
        }) as Box<dyn FnMut()>)
    };
    window.add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref())?;
    resize_closure.forget();

    // Animation loop
    // `f` holds the animation-frame closure so that we can keep calling
    // `request_animation_frame` recursively. Storing it inside an `Option`
    // allows us to create the `Closure` first and then obtain a reference to
    // it from within itself.
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let tick_state = state.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let schedule = {
            let mut guard = tick_state.borrow_mut();
            let FieldLoop { field, driver } = &mut *guard;
            if let Err(e) = driver.tick(field) {
                log::error!("frame failed, animation stopped: {e}");
            }
            driver.clock_mut().take_pending()
        };

        // schedule next
        if schedule {
            if let Some(callback) = f.borrow().as_ref() {
                if let Err(e) = request_frame(callback) {
                    log::error!("requestAnimationFrame failed: {e:?}");
                }
            }
        }
    }) as Box<dyn FnMut()>));

    {
        let mut guard = state.borrow_mut();
        guard.driver.start();
        guard.driver.clock_mut().take_pending();
    }
    if let Some(callback) = g.borrow().as_ref() {
        request_frame(callback)?;
    }

    RUNNING.with(|cell| *cell.borrow_mut() = Some(state));
    log::info!(
        "circle field started: {} instances of size {}",
        config.instance_count,
        config.quad_size
    );
    Ok(())
}

/// Stop the running field, if any. A frame already scheduled runs as a no-op.
pub fn stop() {
    RUNNING.with(|cell| {
        if let Some(state) = cell.borrow().as_ref() {
            state.borrow_mut().driver.stop();
        }
    });
}

fn request_frame(callback: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    window()
        .ok_or("no window")?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}

fn surface_size(window: &Window) -> SurfaceConfig {
    let dimension = |v: Result<JsValue, JsValue>| {
        v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0).max(0.0) as u32
    };
    SurfaceConfig::new(
        dimension(window.inner_width()),
        dimension(window.inner_height()),
        window.device_pixel_ratio(),
    )
}

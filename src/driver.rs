//! Per-frame animation loop.
//!
//! The driver never sleeps or spawns: the host calls [`AnimationDriver::tick`]
//! once per display refresh, and the driver asks for the next one through its
//! [`AnimationClock`].

use crate::controller::{ParticleField, RenderOutcome, RenderSurface};
use crate::error::{FieldError, Result};

/// Host timing source.
pub trait AnimationClock {
    /// Monotonic time in milliseconds.
    fn now(&self) -> f64;

    /// Ask the host to call `tick` once more at the next refresh.
    fn request_next_frame(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Stopped or not started; nothing happened.
    Idle,
    /// Time advanced to `time` seconds and a frame was issued (or skipped).
    Frame { time: f32, render: RenderOutcome },
}

pub struct AnimationDriver<C: AnimationClock> {
    clock: C,
    state: DriverState,
    time_divisor: f64,
    last_time: f32,
    frames: u64,
}

impl<C: AnimationClock> AnimationDriver<C> {
    /// `time_divisor` converts clock milliseconds into shader time units
    /// and must be a positive, finite number.
    pub fn new(clock: C, time_divisor: f64) -> Result<Self> {
        if !(time_divisor > 0.0 && time_divisor.is_finite()) {
            return Err(FieldError::Config(format!(
                "time divisor must be positive, got {time_divisor}"
            )));
        }
        Ok(Self {
            clock,
            state: DriverState::Idle,
            time_divisor,
            last_time: 0.0,
            frames: 0,
        })
    }

    /// Idle → Running, scheduling the first frame. No-op when already running.
    pub fn start(&mut self) {
        if self.state == DriverState::Running {
            return;
        }
        self.state = DriverState::Running;
        log::info!("animation started");
        self.clock.request_next_frame();
    }

    /// Running → Idle. Later ticks do nothing and request no frames.
    pub fn stop(&mut self) {
        if self.state == DriverState::Idle {
            return;
        }
        self.state = DriverState::Idle;
        log::info!("animation stopped after {} frames", self.frames);
    }

    /// Advance time, render, and schedule the next frame.
    ///
    /// Time never goes backwards even if the clock does. A render error stops
    /// the loop and is returned.
    pub fn tick<S: RenderSurface>(&mut self, field: &mut ParticleField<S>) -> Result<TickOutcome> {
        if self.state == DriverState::Idle {
            return Ok(TickOutcome::Idle);
        }

        let time = ((self.clock.now() / self.time_divisor) as f32).max(self.last_time);
        self.last_time = time;
        field.uniforms_mut().time = time;

        let render = match field.render() {
            Ok(render) => render,
            Err(e) => {
                log::error!("render failed: {e}");
                self.stop();
                return Err(e);
            }
        };
        self.frames += 1;
        self.clock.request_next_frame();
        Ok(TickOutcome::Frame { time, render })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

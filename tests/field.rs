use glam::{Vec2, Vec3};

use circle_field::controller::Drawable;
use circle_field::kernel::{self, FrameView};
use circle_field::shaders::{ShaderSource, PARTICLE_FIELD};
use circle_field::{
    geometry, AnimationClock, AnimationDriver, DriverState, FieldConfig, FieldError,
    FieldUniforms, ParticleField, QuadFieldBuffers, RenderSurface, SurfaceConfig, TickOutcome,
    UniformKey, UniformValue,
};

/// Runs the vertex kernel on the CPU for every uploaded corner.
#[derive(Default)]
struct CpuSurface {
    size: (u32, u32),
    meshes: Vec<QuadFieldBuffers>,
    frames: Vec<Vec<kernel::VertexOut>>,
}

impl RenderSurface for CpuSurface {
    type Program = ShaderSource;
    type Mesh = usize;

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn compile_program(&mut self, source: &ShaderSource) -> circle_field::Result<ShaderSource> {
        Ok(*source)
    }

    fn upload_mesh(&mut self, buffers: &QuadFieldBuffers) -> circle_field::Result<usize> {
        self.meshes.push(buffers.clone());
        Ok(self.meshes.len() - 1)
    }

    fn begin_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    fn draw(
        &mut self,
        drawable: &Drawable<ShaderSource, usize>,
        view: &FrameView,
        uniforms: &FieldUniforms,
    ) -> circle_field::Result<()> {
        let mesh = &self.meshes[drawable.mesh];
        let outputs = (0..mesh.vertex_count())
            .map(|v| {
                kernel::shade_vertex(
                    Vec3::from_slice(&mesh.positions[v * 3..]),
                    Vec2::from_slice(&mesh.tex_coords[v * 2..]),
                    Vec3::from_slice(&mesh.random_seeds[v * 3..]),
                    uniforms.time,
                    view,
                )
            })
            .collect();
        if let Some(frame) = self.frames.last_mut() {
            *frame = outputs;
        }
        Ok(())
    }
}

struct StepClock {
    now: f64,
    step: f64,
    requests: usize,
}

impl AnimationClock for StepClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn request_next_frame(&mut self) {
        self.requests += 1;
        self.now += self.step;
    }
}

#[test]
fn build_four_by_three() {
    let b = geometry::build(4.0, 3).unwrap();
    assert_eq!(b.positions.len(), 12 * 3);
    assert_eq!(b.triangle_indices.len(), 18);
    assert!(b.triangle_indices.iter().all(|&k| k < 12));
    assert_eq!(&b.triangle_indices[..6], &[0, 2, 1, 2, 3, 1]);
}

#[test]
fn negative_count_is_rejected_before_building() {
    assert!(matches!(
        geometry::build(4.0, -1),
        Err(FieldError::NegativeInstanceCount(-1))
    ));
    assert!(matches!(
        geometry::build(-4.0, 1),
        Err(FieldError::InvalidQuadSize(_))
    ));
}

#[test]
fn bounded_run_from_config() {
    let config = FieldConfig::from_json(r#"{"instanceCount": 5, "quadSize": 2}"#).unwrap();
    let mut field = ParticleField::initialize(
        CpuSurface::default(),
        SurfaceConfig::new(400, 300, 1.5),
        &config,
    );
    assert_eq!(field.surface().size, (600, 450));

    let buffers = geometry::build(config.quad_size, config.instance_count).unwrap();
    field.build_drawable(&buffers, &PARTICLE_FIELD).unwrap();
    assert_eq!(field.uniform(UniformKey::InstanceCount), UniformValue::Int(5));

    let clock = StepClock {
        now: 0.0,
        step: 600.0,
        requests: 0,
    };
    let mut driver = AnimationDriver::new(clock, config.time_divisor).unwrap();
    driver.start();

    let mut times = Vec::new();
    for _ in 0..4 {
        match driver.tick(&mut field).unwrap() {
            TickOutcome::Frame { time, .. } => times.push(time),
            TickOutcome::Idle => panic!("driver idle while running"),
        }
    }
    driver.stop();
    assert_eq!(driver.state(), DriverState::Idle);
    assert_eq!(driver.tick(&mut field).unwrap(), TickOutcome::Idle);

    assert_eq!(times.len(), 4);
    assert!(times.windows(2).all(|w| w[1] > w[0]));
    assert_eq!(driver.frames(), 4);
    // one request from start, one per frame
    assert_eq!(driver.clock().requests, 5);

    let frames = &field.surface().frames;
    assert_eq!(frames.len(), 4);
    for frame in frames {
        assert_eq!(frame.len(), 20);
        for quad in frame.chunks_exact(4) {
            // corners of one instance share colour and depth
            assert!(quad.iter().all(|v| v.color == quad[0].color));
            assert!(quad
                .iter()
                .all(|v| (v.clip_position.w - quad[0].clip_position.w).abs() < 1e-3));
        }
    }
}

#[test]
fn uniform_writes_are_validated() {
    let mut field = ParticleField::initialize(
        CpuSurface::default(),
        SurfaceConfig::new(10, 10, 1.0),
        &FieldConfig::default(),
    );
    assert!(matches!(
        field.set_uniform("bogus", 1.0f32),
        Err(FieldError::InvalidUniformKey(_))
    ));
    field.set_uniform("time", 5.0f32).unwrap();
    assert_eq!(field.uniform(UniformKey::Time), UniformValue::Float(5.0));
    field.set_uniform("gridRows", 2i32).unwrap();
    assert_eq!(field.uniforms().grid_rows, 2);
}

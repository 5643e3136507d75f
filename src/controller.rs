//! Particle field controller.
//!
//! Owns the camera, the scene and the uniform bundle, and talks to the GPU
//! only through a [`RenderSurface`]. All methods run on the single thread
//! that receives resize and frame callbacks.

use glam::{Mat4, Vec3};

use crate::camera::PerspectiveCamera;
use crate::config::{FieldConfig, SurfaceConfig};
use crate::error::Result;
use crate::geometry::QuadFieldBuffers;
use crate::kernel::FrameView;
use crate::shaders::ShaderSource;
use crate::uniforms::{FieldUniforms, UniformKey, UniformValue};

/// GPU-side collaborator: sizing, program/mesh upload, and drawing.
pub trait RenderSurface {
    type Program;
    type Mesh;

    /// Resize the backing store to `width × height` device pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Compile and link a program. Failures must be reported, not logged away.
    fn compile_program(&mut self, source: &ShaderSource) -> Result<Self::Program>;

    fn upload_mesh(&mut self, buffers: &QuadFieldBuffers) -> Result<Self::Mesh>;

    /// Clear the target before the scene's drawables are issued.
    fn begin_frame(&mut self);

    fn draw(
        &mut self,
        drawable: &Drawable<Self::Program, Self::Mesh>,
        view: &FrameView,
        uniforms: &FieldUniforms,
    ) -> Result<()>;
}

/// Fixed-function state the particle material asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    pub transparent: bool,
    pub double_sided: bool,
    pub additive_blending: bool,
    pub depth_test: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            transparent: true,
            double_sided: true,
            additive_blending: true,
            depth_test: true,
        }
    }
}

/// A program plus the mesh it draws.
#[derive(Debug)]
pub struct Drawable<P, M> {
    pub program: P,
    pub mesh: M,
    pub index_count: usize,
    pub material: Material,
}

/// Scene root: drawables in insertion order.
#[derive(Debug)]
pub struct Scene<P, M> {
    drawables: Vec<Drawable<P, M>>,
}

impl<P, M> Scene<P, M> {
    pub fn new() -> Self {
        Self {
            drawables: Vec::new(),
        }
    }

    pub fn add(&mut self, drawable: Drawable<P, M>) {
        self.drawables.push(drawable);
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drawable<P, M>> {
        self.drawables.iter()
    }
}

impl<P, M> Default for Scene<P, M> {
    fn default() -> Self {
        Self::new()
    }
}

/// What a render request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Drawn,
    /// The surface has zero area; nothing was issued.
    Skipped,
}

pub struct ParticleField<S: RenderSurface> {
    surface: S,
    surface_config: SurfaceConfig,
    camera: PerspectiveCamera,
    scene: Scene<S::Program, S::Mesh>,
    uniforms: FieldUniforms,
}

impl<S: RenderSurface> ParticleField<S> {
    /// Set up camera, empty scene and uniforms, then size the surface.
    pub fn initialize(surface: S, surface_config: SurfaceConfig, config: &FieldConfig) -> Self {
        let mut field = Self {
            surface,
            surface_config,
            camera: PerspectiveCamera::new(&config.camera, aspect_of(&surface_config)),
            scene: Scene::new(),
            uniforms: FieldUniforms::from_config(config),
        };
        field.on_resize(surface_config.width, surface_config.height);
        field
    }

    /// Track a new CSS-pixel size. Safe to call repeatedly with the same size.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width;
        self.surface_config.height = height;
        if !self.surface_config.is_empty() {
            self.camera.aspect = aspect_of(&self.surface_config);
            self.camera.update_projection_matrix();
        }
        let (w, h) = self.surface_config.physical_size();
        self.surface.resize(w, h);
        log::debug!("resized to {width}x{height} ({w}x{h} device px)");
    }

    /// Track a new size together with a possibly changed pixel ratio.
    pub fn on_surface_change(&mut self, surface_config: SurfaceConfig) {
        self.surface_config.pixel_ratio = surface_config.pixel_ratio;
        self.on_resize(surface_config.width, surface_config.height);
    }

    /// Compile `source`, upload `buffers`, and add the result to the scene.
    ///
    /// Each call adds another drawable; callers build the field once.
    pub fn build_drawable(&mut self, buffers: &QuadFieldBuffers, source: &ShaderSource) -> Result<()> {
        let program = self.surface.compile_program(source)?;
        let mesh = self.surface.upload_mesh(buffers)?;
        self.scene.add(Drawable {
            program,
            mesh,
            index_count: buffers.triangle_indices.len(),
            material: Material::default(),
        });
        log::info!(
            "particle field ready: {} instances, {} indices",
            buffers.instance_count(),
            buffers.triangle_indices.len()
        );
        Ok(())
    }

    /// Write a uniform by its shader name.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.uniforms.set_by_name(name, value.into())
    }

    pub fn uniform(&self, key: UniformKey) -> UniformValue {
        self.uniforms.get(key)
    }

    pub fn uniforms(&self) -> &FieldUniforms {
        &self.uniforms
    }

    pub(crate) fn uniforms_mut(&mut self) -> &mut FieldUniforms {
        &mut self.uniforms
    }

    /// Aim the camera at the world origin and draw the scene.
    pub fn render(&mut self) -> Result<RenderOutcome> {
        self.camera.look_at(Vec3::ZERO);
        if self.surface_config.is_empty() {
            log::trace!("surface has zero area, skipping frame");
            return Ok(RenderOutcome::Skipped);
        }

        let view = FrameView {
            model: Mat4::IDENTITY,
            view: *self.camera.view(),
            projection: *self.camera.projection(),
            camera_position: self.camera.position,
        };
        self.surface.begin_frame();
        for drawable in self.scene.iter() {
            self.surface.draw(drawable, &view, &self.uniforms)?;
        }
        Ok(RenderOutcome::Drawn)
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene<S::Program, S::Mesh> {
        &self.scene
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_config(&self) -> SurfaceConfig {
        self.surface_config
    }
}

fn aspect_of(config: &SurfaceConfig) -> f32 {
    if config.is_empty() {
        1.0
    } else {
        config.width as f32 / config.height as f32
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{FieldError, ShaderStage};
    use crate::geometry;

    /// Surface that records calls instead of touching a GPU.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub size: (u32, u32),
        pub resizes: usize,
        pub frames: usize,
        pub draws: Vec<(usize, f32)>,
        pub fail_compile: bool,
    }

    impl RenderSurface for RecordingSurface {
        type Program = &'static str;
        type Mesh = usize;

        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.resizes += 1;
        }

        fn compile_program(&mut self, source: &ShaderSource) -> Result<Self::Program> {
            if self.fail_compile {
                return Err(FieldError::ShaderCompile {
                    stage: ShaderStage::Vertex,
                    log: "forced".into(),
                });
            }
            Ok(source.vertex)
        }

        fn upload_mesh(&mut self, buffers: &QuadFieldBuffers) -> Result<Self::Mesh> {
            Ok(buffers.vertex_count())
        }

        fn begin_frame(&mut self) {
            self.frames += 1;
        }

        fn draw(
            &mut self,
            drawable: &Drawable<Self::Program, Self::Mesh>,
            _view: &FrameView,
            uniforms: &FieldUniforms,
        ) -> Result<()> {
            self.draws.push((drawable.index_count, uniforms.time));
            Ok(())
        }
    }

    fn field(width: u32, height: u32) -> ParticleField<RecordingSurface> {
        ParticleField::initialize(
            RecordingSurface::default(),
            SurfaceConfig::new(width, height, 2.0),
            &FieldConfig::default(),
        )
    }

    #[test]
    fn initialize_sizes_surface_and_camera() {
        let f = field(800, 400);
        assert_eq!(f.surface().size, (1600, 800));
        assert_eq!(f.camera().aspect, 2.0);
        assert_eq!(f.camera().fov_deg, 35.0);
        assert_eq!(f.camera().position, Vec3::new(0.0, 0.0, 500.0));
        assert!(f.scene().is_empty());
    }

    #[test]
    fn resize_is_idempotent() {
        let mut f = field(800, 400);
        f.on_resize(1024, 768);
        let camera = f.camera().clone();
        let size = f.surface().size;
        f.on_resize(1024, 768);
        assert_eq!(f.camera(), &camera);
        assert_eq!(f.surface().size, size);
        assert_eq!(size, (2048, 1536));
    }

    #[test]
    fn pixel_ratio_change_resizes_backing_store() {
        let mut f = field(800, 400);
        f.on_surface_change(SurfaceConfig::new(800, 400, 1.0));
        assert_eq!(f.surface().size, (800, 400));
        assert_eq!(f.surface_config().pixel_ratio, 1.0);
        assert_eq!(f.camera().aspect, 2.0);

        f.on_surface_change(SurfaceConfig::new(600, 600, 3.0));
        assert_eq!(f.surface().size, (1800, 1800));
        assert_eq!(f.camera().aspect, 1.0);
    }

    #[test]
    fn build_drawable_adds_one_drawable() {
        let mut f = field(100, 100);
        let buffers = geometry::build(4.0, 3).unwrap();
        f.build_drawable(&buffers, &crate::shaders::PARTICLE_FIELD).unwrap();
        assert_eq!(f.scene().len(), 1);
        let d = f.scene().iter().next().unwrap();
        assert_eq!(d.index_count, 18);
        assert_eq!(d.mesh, 12);
        assert_eq!(d.material, Material::default());
    }

    #[test]
    fn compile_failure_leaves_scene_empty() {
        let mut f = ParticleField::initialize(
            RecordingSurface {
                fail_compile: true,
                ..Default::default()
            },
            SurfaceConfig::new(10, 10, 1.0),
            &FieldConfig::default(),
        );
        let buffers = geometry::build(1.0, 1).unwrap();
        let err = f
            .build_drawable(&buffers, &crate::shaders::PARTICLE_FIELD)
            .unwrap_err();
        assert!(matches!(err, FieldError::ShaderCompile { .. }));
        assert!(f.scene().is_empty());
    }

    #[test]
    fn set_uniform_validates_names() {
        let mut f = field(10, 10);
        assert!(matches!(
            f.set_uniform("bogus", 1.0f32),
            Err(FieldError::InvalidUniformKey(_))
        ));
        f.set_uniform("time", 5.0f32).unwrap();
        assert_eq!(f.uniform(UniformKey::Time), UniformValue::Float(5.0));
    }

    #[test]
    fn zero_area_skips_draw_until_resized() {
        let mut f = field(0, 0);
        let buffers = geometry::build(1.0, 2).unwrap();
        f.build_drawable(&buffers, &crate::shaders::PARTICLE_FIELD).unwrap();
        assert_eq!(f.render().unwrap(), RenderOutcome::Skipped);
        assert!(f.surface().draws.is_empty());

        f.on_resize(640, 480);
        assert_eq!(f.render().unwrap(), RenderOutcome::Drawn);
        assert_eq!(f.surface().draws.len(), 1);
        assert!((f.camera().aspect - 640.0 / 480.0).abs() < 1e-6);
    }

    #[test]
    fn zero_instances_still_renders() {
        let mut f = field(10, 10);
        let buffers = geometry::build(1.0, 0).unwrap();
        f.build_drawable(&buffers, &crate::shaders::PARTICLE_FIELD).unwrap();
        assert_eq!(f.render().unwrap(), RenderOutcome::Drawn);
        assert_eq!(f.surface().draws, vec![(0, 0.0)]);
    }
}

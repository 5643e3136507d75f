//! WebGL2 render surface.

use js_sys::{Float32Array, Uint32Array};
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::controller::{Drawable, Material, RenderSurface};
use crate::error::{FieldError, Result, ShaderStage};
use crate::geometry::QuadFieldBuffers;
use crate::kernel::FrameView;
use crate::shaders::{attributes, builtins, ShaderSource};
use crate::uniforms::{FieldUniforms, UniformKey, UniformValue};

// Attribute locations are bound before linking so meshes can be uploaded
// without knowing which program will draw them.
const POSITION_LOC: u32 = 0;
const RANDOM_SEED_LOC: u32 = 1;
const INSTANCE_INDEX_LOC: u32 = 2;
const UV_LOC: u32 = 3;
const NORMAL_LOC: u32 = 4;

pub struct WebGlSurface {
    canvas: HtmlCanvasElement,
    gl: GL,
}

pub struct GlProgram {
    program: WebGlProgram,
    model: Option<WebGlUniformLocation>,
    view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    camera_position: Option<WebGlUniformLocation>,
    fields: Vec<(UniformKey, Option<WebGlUniformLocation>)>,
}

pub struct GlMesh {
    vao: WebGlVertexArrayObject,
    _buffers: Vec<WebGlBuffer>,
}

impl WebGlSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let gl: GL = canvas
            .get_context("webgl2")
            .map_err(|_| surface_err("get_context failed"))?
            .ok_or_else(|| surface_err("WebGL2 not supported"))?
            .dyn_into()
            .map_err(|_| surface_err("context is not WebGL2"))?;
        Ok(Self { canvas, gl })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<WebGlShader> {
        let kind = match stage {
            ShaderStage::Vertex => GL::VERTEX_SHADER,
            ShaderStage::Fragment => GL::FRAGMENT_SHADER,
        };
        let shader = self
            .gl
            .create_shader(kind)
            .ok_or_else(|| surface_err("failed to create shader"))?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);
        if self
            .gl
            .get_shader_parameter(&shader, GL::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
        {
            Ok(shader)
        } else {
            let log = self
                .gl
                .get_shader_info_log(&shader)
                .unwrap_or_else(|| "unknown shader error".to_string());
            self.gl.delete_shader(Some(&shader));
            log::error!("{stage} shader compile failed: {log}");
            Err(FieldError::ShaderCompile { stage, log })
        }
    }

    fn float_attribute(&self, location: u32, size: i32, data: &[f32]) -> Result<WebGlBuffer> {
        let buffer = self.array_buffer(&Float32Array::from(data))?;
        self.gl.enable_vertex_attrib_array(location);
        self.gl
            .vertex_attrib_pointer_with_i32(location, size, GL::FLOAT, false, 0, 0);
        Ok(buffer)
    }

    fn uint_attribute(&self, location: u32, data: &[u32]) -> Result<WebGlBuffer> {
        let buffer = self.array_buffer(&Uint32Array::from(data))?;
        self.gl.enable_vertex_attrib_array(location);
        self.gl
            .vertex_attrib_i_pointer_with_i32(location, 1, GL::UNSIGNED_INT, 0, 0);
        Ok(buffer)
    }

    fn array_buffer(&self, data: &js_sys::Object) -> Result<WebGlBuffer> {
        let buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| surface_err("failed to create buffer"))?;
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        self.gl
            .buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, data, GL::STATIC_DRAW);
        Ok(buffer)
    }

    /// Uploads every attribute and the index buffer into the bound VAO.
    /// Buffers land in `owned` as they are created, including on failure.
    fn upload_attributes(
        &self,
        buffers: &QuadFieldBuffers,
        owned: &mut Vec<WebGlBuffer>,
    ) -> Result<()> {
        owned.push(self.float_attribute(POSITION_LOC, 3, &buffers.positions)?);
        owned.push(self.float_attribute(RANDOM_SEED_LOC, 3, &buffers.random_seeds)?);
        owned.push(self.uint_attribute(INSTANCE_INDEX_LOC, &buffers.instance_indices)?);
        owned.push(self.float_attribute(UV_LOC, 2, &buffers.tex_coords)?);
        owned.push(self.float_attribute(NORMAL_LOC, 3, &buffers.normals)?);

        let index_buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| surface_err("failed to create index buffer"))?;
        self.gl
            .bind_buffer(GL::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        self.gl.buffer_data_with_array_buffer_view(
            GL::ELEMENT_ARRAY_BUFFER,
            &Uint32Array::from(buffers.triangle_indices.as_slice()),
            GL::STATIC_DRAW,
        );
        owned.push(index_buffer);
        Ok(())
    }

    fn apply_material(&self, material: &Material) {
        if material.transparent {
            self.gl.enable(GL::BLEND);
            if material.additive_blending {
                self.gl.blend_func(GL::SRC_ALPHA, GL::ONE);
            } else {
                self.gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);
            }
        } else {
            self.gl.disable(GL::BLEND);
        }
        if material.double_sided {
            self.gl.disable(GL::CULL_FACE);
        } else {
            self.gl.enable(GL::CULL_FACE);
        }
        if material.depth_test {
            self.gl.enable(GL::DEPTH_TEST);
        } else {
            self.gl.disable(GL::DEPTH_TEST);
        }
    }
}

impl RenderSurface for WebGlSurface {
    type Program = GlProgram;
    type Mesh = GlMesh;

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn compile_program(&mut self, source: &ShaderSource) -> Result<GlProgram> {
        let vertex = self.compile_shader(ShaderStage::Vertex, source.vertex)?;
        let fragment = match self.compile_shader(ShaderStage::Fragment, source.fragment) {
            Ok(fragment) => fragment,
            Err(e) => {
                self.gl.delete_shader(Some(&vertex));
                return Err(e);
            }
        };
        let Some(program) = self.gl.create_program() else {
            self.gl.delete_shader(Some(&vertex));
            self.gl.delete_shader(Some(&fragment));
            return Err(surface_err("failed to create program"));
        };
        self.gl.attach_shader(&program, &vertex);
        self.gl.attach_shader(&program, &fragment);
        for (location, name) in [
            (POSITION_LOC, attributes::POSITION),
            (RANDOM_SEED_LOC, attributes::RANDOM_SEED),
            (INSTANCE_INDEX_LOC, attributes::INSTANCE_INDEX),
            (UV_LOC, attributes::UV),
            (NORMAL_LOC, attributes::NORMAL),
        ] {
            self.gl.bind_attrib_location(&program, location, name);
        }
        self.gl.link_program(&program);

        let linked = self
            .gl
            .get_program_parameter(&program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        self.gl.detach_shader(&program, &vertex);
        self.gl.detach_shader(&program, &fragment);
        self.gl.delete_shader(Some(&vertex));
        self.gl.delete_shader(Some(&fragment));
        if !linked {
            let log = self
                .gl
                .get_program_info_log(&program)
                .unwrap_or_else(|| "unknown program error".to_string());
            self.gl.delete_program(Some(&program));
            log::error!("shader link failed: {log}");
            return Err(FieldError::ShaderLink(log));
        }

        let location = |name: &str| self.gl.get_uniform_location(&program, name);
        Ok(GlProgram {
            model: location(builtins::MODEL),
            view: location(builtins::VIEW),
            projection: location(builtins::PROJECTION),
            camera_position: location(builtins::CAMERA_POSITION),
            fields: UniformKey::ALL
                .into_iter()
                .map(|key| (key, location(key.name())))
                .collect(),
            program,
        })
    }

    fn upload_mesh(&mut self, buffers: &QuadFieldBuffers) -> Result<GlMesh> {
        let vao = self
            .gl
            .create_vertex_array()
            .ok_or_else(|| surface_err("failed to create vertex array"))?;
        self.gl.bind_vertex_array(Some(&vao));

        let mut owned = Vec::new();
        let uploaded = self.upload_attributes(buffers, &mut owned);

        self.gl.bind_vertex_array(None);
        self.gl.bind_buffer(GL::ARRAY_BUFFER, None);
        if let Err(e) = uploaded {
            for buffer in &owned {
                self.gl.delete_buffer(Some(buffer));
            }
            self.gl.delete_vertex_array(Some(&vao));
            return Err(e);
        }
        Ok(GlMesh {
            vao,
            _buffers: owned,
        })
    }

    fn begin_frame(&mut self) {
        self.gl
            .viewport(0, 0, self.canvas.width() as i32, self.canvas.height() as i32);
        self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
        self.gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);
    }

    fn draw(
        &mut self,
        drawable: &Drawable<GlProgram, GlMesh>,
        view: &FrameView,
        uniforms: &FieldUniforms,
    ) -> Result<()> {
        if drawable.index_count == 0 {
            return Ok(());
        }
        let program = &drawable.program;
        self.gl.use_program(Some(&program.program));
        self.apply_material(&drawable.material);

        self.gl.uniform_matrix4fv_with_f32_array(
            program.model.as_ref(),
            false,
            &view.model.to_cols_array(),
        );
        self.gl.uniform_matrix4fv_with_f32_array(
            program.view.as_ref(),
            false,
            &view.view.to_cols_array(),
        );
        self.gl.uniform_matrix4fv_with_f32_array(
            program.projection.as_ref(),
            false,
            &view.projection.to_cols_array(),
        );
        self.gl.uniform3fv_with_f32_array(
            program.camera_position.as_ref(),
            &view.camera_position.to_array(),
        );
        for (key, location) in &program.fields {
            match uniforms.get(*key) {
                UniformValue::Float(v) => self.gl.uniform1f(location.as_ref(), v),
                UniformValue::Int(v) => self.gl.uniform1i(location.as_ref(), v),
            }
        }

        let count = i32::try_from(drawable.index_count)
            .map_err(|_| surface_err("index count exceeds GL range"))?;
        self.gl.bind_vertex_array(Some(&drawable.mesh.vao));
        self.gl
            .draw_elements_with_i32(GL::TRIANGLES, count, GL::UNSIGNED_INT, 0);
        self.gl.bind_vertex_array(None);
        Ok(())
    }
}

fn surface_err(message: &str) -> FieldError {
    FieldError::Surface(message.to_string())
}

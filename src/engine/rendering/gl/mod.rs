//! ### English
//! OpenGL `GpuBackend` built on glow.
//!
//! Every GL object of a surface lives in that surface's offscreen context (see `context`), which
//! shares objects with the embedder's context. Draws go into a per-surface FBO whose colour
//! texture is what the embedder composites; a producer fence is inserted after every draw.
//!
//! ### 中文
//! 基于 glow 的 OpenGL `GpuBackend`。
//!
//! 每个 surface 的所有 GL 对象都位于该 surface 的离屏上下文中（见 `context`），该上下文与宿主上下文
//! 共享对象。绘制写入每 surface 的 FBO，宿主合成的是其颜色纹理；每次绘制后插入生产者 fence。

mod context;
mod shaders;
mod target;

use std::collections::HashMap;
use std::sync::Arc;

use dpi::PhysicalSize;
use glow::HasContext as _;

use crate::engine::error::GpuError;
use crate::engine::frame::BYTES_PER_PIXEL;
use crate::engine::glfw::{GlfwWindowPtr, LoadedGlfwApi};

use super::{GpuBackend, GpuFactory, PipelineHandle, PresentedFrame, SamplerHandle, TextureHandle};

use context::SharedGlContext;
use target::SurfaceTarget;

fn compile_shader(gl: &glow::Context, kind: u32, source: &str) -> Result<glow::NativeShader, GpuError> {
    unsafe {
        let shader = gl.create_shader(kind).map_err(GpuError::Shader)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(GpuError::Shader(log));
        }
        Ok(shader)
    }
}

fn link_program(gl: &glow::Context, is_gles: bool) -> Result<glow::NativeProgram, GpuError> {
    let vertex = compile_shader(gl, glow::VERTEX_SHADER, &shaders::vertex_source(is_gles))?;
    let fragment = match compile_shader(gl, glow::FRAGMENT_SHADER, &shaders::fragment_source(is_gles)) {
        Ok(shader) => shader,
        Err(err) => {
            unsafe { gl.delete_shader(vertex) };
            return Err(err);
        }
    };

    unsafe {
        let program = match gl.create_program() {
            Ok(program) => program,
            Err(err) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                return Err(GpuError::Shader(err));
            }
        };
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);
        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(GpuError::Shader(log));
        }
        Ok(program)
    }
}

/// ### English
/// OpenGL backend of one surface.
///
/// ### 中文
/// 单个 surface 的 OpenGL 后端。
pub struct GlBackend {
    context: SharedGlContext,
    programs: HashMap<u32, glow::NativeProgram>,
    samplers: HashMap<u32, glow::NativeSampler>,
    textures: HashMap<u32, glow::NativeTexture>,
    /// ### English
    /// Empty VAO; core profiles require one bound even without vertex attributes.
    ///
    /// ### 中文
    /// 空 VAO；core profile 即使没有顶点属性也要求绑定一个。
    vertex_array: glow::NativeVertexArray,
    target: Option<SurfaceTarget>,
    fence: Option<glow::NativeFence>,
}

// SAFETY: the backend is only used under the bridge lock, and every GL call goes through
// `SharedGlContext::with_current`, which binds the context to whichever thread holds the lock.
unsafe impl Send for GlBackend {}

impl GlBackend {
    fn new(context: SharedGlContext) -> Result<Self, GpuError> {
        let vertex_array =
            context.with_current(|gl| unsafe { gl.create_vertex_array() }).map_err(GpuError::Resource)?;
        Ok(Self {
            context,
            programs: HashMap::new(),
            samplers: HashMap::new(),
            textures: HashMap::new(),
            vertex_array,
            target: None,
            fence: None,
        })
    }

    /// ### English
    /// Binds the presentation target at `size`, creating or resizing it as needed.
    ///
    /// ### 中文
    /// 以 `size` 绑定呈现目标，必要时创建或调整尺寸。
    fn bind_target(
        gl: &glow::Context,
        target: &mut Option<SurfaceTarget>,
        size: PhysicalSize<u32>,
    ) -> Result<(), GpuError> {
        match target {
            Some(existing) => existing.resize(gl, size),
            None => *target = Some(SurfaceTarget::new(gl, size)?),
        }
        if let Some(existing) = target.as_ref() {
            existing.bind(gl);
        }
        unsafe { gl.viewport(0, 0, size.width as i32, size.height as i32) };
        Ok(())
    }

    /// ### English
    /// Replaces the producer fence after a draw and flushes so other contexts observe the work.
    ///
    /// ### 中文
    /// 绘制后替换生产者 fence 并 flush，使其他上下文可观察到这些工作。
    fn publish(gl: &glow::Context, fence: &mut Option<glow::NativeFence>) {
        unsafe {
            if let Some(previous) = fence.take() {
                gl.delete_sync(previous);
            }
            *fence = gl.fence_sync(glow::SYNC_GPU_COMMANDS_COMPLETE, 0).ok();
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.flush();
        }
    }
}

impl GpuBackend for GlBackend {
    fn create_pipeline(&mut self) -> Result<PipelineHandle, GpuError> {
        let is_gles = self.context.is_gles();
        let program = self.context.with_current(|gl| link_program(gl, is_gles))?;
        let id = program.0.get();
        self.programs.insert(id, program);
        Ok(PipelineHandle(id))
    }

    fn create_sampler(&mut self) -> Result<SamplerHandle, GpuError> {
        let sampler = self.context.with_current(|gl| unsafe {
            let sampler = gl.create_sampler().map_err(GpuError::Resource)?;
            gl.sampler_parameter_i32(sampler, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.sampler_parameter_i32(sampler, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.sampler_parameter_i32(sampler, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.sampler_parameter_i32(sampler, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            Ok::<_, GpuError>(sampler)
        })?;
        let id = sampler.0.get();
        self.samplers.insert(id, sampler);
        Ok(SamplerHandle(id))
    }

    fn create_texture(&mut self, size: PhysicalSize<u32>) -> Result<TextureHandle, GpuError> {
        let texture = self.context.with_current(|gl| unsafe {
            let texture = gl.create_texture().map_err(GpuError::Resource)?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                size.width as i32,
                size.height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(None),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
            Ok::<_, GpuError>(texture)
        })?;
        let id = texture.0.get();
        self.textures.insert(id, texture);
        Ok(TextureHandle { id, size })
    }

    fn upload_texture(&mut self, texture: &TextureHandle, pixels: &[u8]) -> Result<(), GpuError> {
        let Some(&native) = self.textures.get(&texture.id) else {
            return Err(GpuError::Resource(format!("unknown texture {}", texture.id)));
        };
        let expected = texture.size.width as usize * texture.size.height as usize * BYTES_PER_PIXEL;
        if pixels.len() < expected {
            return Err(GpuError::Resource(format!(
                "upload of {} bytes is smaller than {}x{} texture",
                pixels.len(),
                texture.size.width,
                texture.size.height
            )));
        }

        self.context.with_current(|gl| unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(native));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, BYTES_PER_PIXEL as i32);
            gl.pixel_store_i32(glow::UNPACK_ROW_LENGTH, 0);
            gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                texture.size.width as i32,
                texture.size.height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(&pixels[..expected])),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
            /*
            ### English
            Make the upload visible to the display thread's draw in the same context.

            ### 中文
            使上传对同一上下文中显示线程的绘制可见。
            */
            gl.flush();
        });
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if let Some(native) = self.textures.remove(&texture.id) {
            self.context.with_current(|gl| unsafe { gl.delete_texture(native) });
        }
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        if let Some(program) = self.programs.remove(&pipeline.0) {
            self.context.with_current(|gl| unsafe { gl.delete_program(program) });
        }
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        if let Some(native) = self.samplers.remove(&sampler.0) {
            self.context.with_current(|gl| unsafe { gl.delete_sampler(native) });
        }
    }

    fn clear_surface(&mut self, size: PhysicalSize<u32>) {
        let Self {
            context,
            target,
            fence,
            ..
        } = self;
        context.with_current(|gl| {
            if let Err(err) = Self::bind_target(gl, target, size) {
                tracing::warn!(error = %err, "presentation target unavailable");
                return;
            }
            unsafe {
                gl.clear_color(0.0, 0.0, 0.0, 1.0);
                gl.clear(glow::COLOR_BUFFER_BIT);
            }
            Self::publish(gl, fence);
        });
    }

    fn draw_quad(
        &mut self,
        size: PhysicalSize<u32>,
        pipeline: PipelineHandle,
        sampler: SamplerHandle,
        texture: &TextureHandle,
    ) {
        let (Some(&program), Some(&native_sampler), Some(&native_texture)) = (
            self.programs.get(&pipeline.0),
            self.samplers.get(&sampler.0),
            self.textures.get(&texture.id),
        ) else {
            tracing::warn!(texture = texture.id, "draw skipped: unknown GPU resource");
            return;
        };

        let Self {
            context,
            vertex_array,
            target,
            fence,
            ..
        } = self;
        let vertex_array = *vertex_array;
        context.with_current(|gl| {
            if let Err(err) = Self::bind_target(gl, target, size) {
                tracing::warn!(error = %err, "presentation target unavailable");
                return;
            }
            unsafe {
                gl.disable(glow::BLEND);
                gl.disable(glow::DEPTH_TEST);
                gl.disable(glow::SCISSOR_TEST);
                gl.use_program(Some(program));
                gl.active_texture(glow::TEXTURE0);
                gl.bind_sampler(0, Some(native_sampler));
                gl.bind_texture(glow::TEXTURE_2D, Some(native_texture));
                let location = gl.get_uniform_location(program, shaders::FRAME_UNIFORM);
                gl.uniform_1_i32(location.as_ref(), 0);
                gl.bind_vertex_array(Some(vertex_array));
                gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
                gl.bind_vertex_array(None);
                gl.bind_texture(glow::TEXTURE_2D, None);
                gl.bind_sampler(0, None);
                gl.use_program(None);
            }
            Self::publish(gl, fence);
        });
    }

    fn presented_frame(&self) -> Option<PresentedFrame> {
        let target = self.target.as_ref()?;
        Some(PresentedFrame {
            texture_id: target.texture.0.get(),
            fence: self.fence.map(|f| f.0 as usize as u64).unwrap_or(0),
            size: target.size,
        })
    }
}

impl Drop for GlBackend {
    fn drop(&mut self) {
        let Self {
            context,
            programs,
            samplers,
            textures,
            vertex_array,
            target,
            fence,
        } = self;
        context.with_current(|gl| unsafe {
            for (_, program) in programs.drain() {
                gl.delete_program(program);
            }
            for (_, sampler) in samplers.drain() {
                gl.delete_sampler(sampler);
            }
            for (_, texture) in textures.drain() {
                gl.delete_texture(texture);
            }
            if let Some(target) = target.take() {
                target.delete(gl);
            }
            if let Some(fence) = fence.take() {
                gl.delete_sync(fence);
            }
            gl.delete_vertex_array(*vertex_array);
            gl.finish();
        });
    }
}

/// ### English
/// Creates `GlBackend`s whose contexts share objects with the embedder's GLFW window.
///
/// ### 中文
/// 创建 `GlBackend`，其上下文与宿主的 GLFW window 共享对象。
pub struct GlGpuFactory {
    glfw: Arc<LoadedGlfwApi>,
    /// ### English
    /// Embedder's GLFW window, stored as an address so the factory stays `Send + Sync`.
    ///
    /// ### 中文
    /// 宿主的 GLFW window，以地址形式保存，使工厂保持 `Send + Sync`。
    share_window: usize,
}

impl GlGpuFactory {
    /// ### English
    /// Loads GLFW and remembers the window to share GL objects with.
    ///
    /// ### 中文
    /// 加载 GLFW 并记录用于共享 GL 对象的 window。
    pub fn new(share_window: GlfwWindowPtr) -> Result<Self, GpuError> {
        if share_window.is_null() {
            return Err(GpuError::Context("shared GLFW window is NULL".to_string()));
        }
        Ok(Self {
            glfw: Arc::new(LoadedGlfwApi::load()?),
            share_window: share_window as usize,
        })
    }
}

impl GpuFactory for GlGpuFactory {
    fn create(&self) -> Result<Box<dyn GpuBackend>, GpuError> {
        let context = SharedGlContext::new(self.glfw.clone(), self.share_window as GlfwWindowPtr)?;
        Ok(Box::new(GlBackend::new(context)?))
    }
}

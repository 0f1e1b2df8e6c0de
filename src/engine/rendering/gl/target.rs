//! ### English
//! Per-surface presentation target (FBO + colour texture shared with the embedder).
//!
//! ### 中文
//! 每 surface 的呈现目标（FBO + 与宿主共享的颜色纹理）。

use dpi::PhysicalSize;
use glow::HasContext as _;

use crate::engine::error::GpuError;

pub(super) struct SurfaceTarget {
    framebuffer: glow::NativeFramebuffer,
    /// ### English
    /// Colour texture attached to `framebuffer` (the embedder samples it).
    ///
    /// ### 中文
    /// 绑定到 `framebuffer` 的颜色纹理（由宿主采样）。
    pub(super) texture: glow::NativeTexture,
    pub(super) size: PhysicalSize<u32>,
}

fn allocate_storage(gl: &glow::Context, size: PhysicalSize<u32>) {
    unsafe {
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
    }
}

impl SurfaceTarget {
    /// ### English
    /// Creates the FBO and its colour texture.
    ///
    /// #### Parameters
    /// - `gl`: Context the resources are created in (must be current).
    /// - `size`: Initial texture size.
    ///
    /// ### 中文
    /// 创建 FBO 及其颜色纹理。
    ///
    /// #### 参数
    /// - `gl`：创建资源所用的上下文（必须为 current）。
    /// - `size`：初始纹理尺寸。
    pub(super) fn new(gl: &glow::Context, size: PhysicalSize<u32>) -> Result<Self, GpuError> {
        unsafe {
            let framebuffer = gl.create_framebuffer().map_err(GpuError::Resource)?;
            let texture = match gl.create_texture() {
                Ok(texture) => texture,
                Err(err) => {
                    gl.delete_framebuffer(framebuffer);
                    return Err(GpuError::Resource(err));
                }
            };

            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            allocate_storage(gl, size);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.bind_texture(glow::TEXTURE_2D, None);

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            let target = Self {
                framebuffer,
                texture,
                size,
            };
            if status != glow::FRAMEBUFFER_COMPLETE {
                target.delete(gl);
                return Err(GpuError::Resource(format!(
                    "presentation framebuffer incomplete (0x{status:x})"
                )));
            }
            Ok(target)
        }
    }

    /// ### English
    /// Reallocates the colour texture storage if the size changed.
    ///
    /// ### 中文
    /// 当尺寸变化时重新分配颜色纹理存储。
    pub(super) fn resize(&mut self, gl: &glow::Context, new_size: PhysicalSize<u32>) {
        if self.size == new_size {
            return;
        }
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            allocate_storage(gl, new_size);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
        self.size = new_size;
    }

    pub(super) fn bind(&self, gl: &glow::Context) {
        unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer)) };
    }

    pub(super) fn delete(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_framebuffer(self.framebuffer);
            gl.delete_texture(self.texture);
        }
    }
}

//! ### English
//! Texture Uploader: copies the Frame Buffer into a GPU texture sized like the frame.
//!
//! ### 中文
//! 纹理上传器：把帧缓冲复制到与帧同尺寸的 GPU 纹理中。

use dpi::PhysicalSize;

use crate::engine::error::GpuError;
use crate::engine::frame::FrameBuffer;

use super::{GpuBackend, TextureHandle};

#[derive(Debug, Default)]
pub struct TextureUploader {
    texture: Option<TextureHandle>,
    uploads: u64,
}

impl TextureUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// ### English
    /// Uploads `frame` into the current texture, replacing the texture first when its size no
    /// longer matches the frame.
    ///
    /// On failure the texture reference is cleared.
    ///
    /// #### Parameters
    /// - `gpu`: Backend owning the texture.
    /// - `frame`: Freshly painted frame.
    ///
    /// ### 中文
    /// 把 `frame` 上传到当前纹理；若纹理尺寸与帧不一致，先替换纹理。
    ///
    /// 失败时清空纹理引用。
    ///
    /// #### 参数
    /// - `gpu`：持有纹理的后端。
    /// - `frame`：刚绘制好的帧。
    pub fn upload(&mut self, gpu: &mut dyn GpuBackend, frame: &FrameBuffer) -> Result<(), GpuError> {
        let size = frame.size();
        if self.texture.is_some_and(|texture| texture.size != size) {
            self.release(gpu);
        }

        let texture = match self.texture {
            Some(texture) => texture,
            None => {
                let texture = gpu.create_texture(size)?;
                tracing::debug!(width = size.width, height = size.height, "texture created");
                self.texture = Some(texture);
                texture
            }
        };

        if let Err(err) = gpu.upload_texture(&texture, frame.pixels()) {
            self.release(gpu);
            return Err(err);
        }
        self.uploads += 1;
        Ok(())
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }

    pub fn texture_size(&self) -> Option<PhysicalSize<u32>> {
        self.texture.map(|texture| texture.size)
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// ### English
    /// Destroys the texture; later draws see no texture and clear the surface.
    ///
    /// ### 中文
    /// 销毁纹理；之后的绘制看不到纹理，会清空 surface。
    pub fn release(&mut self, gpu: &mut dyn GpuBackend) {
        if let Some(texture) = self.texture.take() {
            gpu.destroy_texture(texture);
        }
    }
}

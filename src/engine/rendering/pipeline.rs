//! ### English
//! Presentation Pipeline: program + sampler drawing one full-surface textured quad.
//!
//! ### 中文
//! 呈现管线：由程序与采样器组成，绘制一个覆盖整个 surface 的纹理四边形。

use dpi::PhysicalSize;

use crate::engine::error::GpuError;

use super::{GpuBackend, PipelineHandle, SamplerHandle, TextureHandle};

#[derive(Debug, Default)]
pub struct PresentationPipeline {
    pipeline: Option<PipelineHandle>,
    sampler: Option<SamplerHandle>,
}

/// ### English
/// What a `draw` call ended up doing.
///
/// ### 中文
/// 一次 `draw` 调用的实际结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    Presented,
    Cleared,
    Skipped,
}

impl PresentationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// ### English
    /// Creates the program and the sampler. Partial results are released on failure.
    ///
    /// ### 中文
    /// 创建程序与采样器；失败时释放已创建的部分。
    pub fn build(&mut self, gpu: &mut dyn GpuBackend) -> Result<(), GpuError> {
        let pipeline = gpu.create_pipeline()?;
        let sampler = match gpu.create_sampler() {
            Ok(sampler) => sampler,
            Err(err) => {
                gpu.destroy_pipeline(pipeline);
                return Err(err);
            }
        };
        self.pipeline = Some(pipeline);
        self.sampler = Some(sampler);
        Ok(())
    }

    /// ### English
    /// Draws `texture` over the whole surface, or clears the surface when the program, the sampler
    /// or the texture is missing.
    ///
    /// ### 中文
    /// 将 `texture` 绘制到整个 surface；若程序、采样器或纹理缺失，则清空 surface。
    pub fn draw(
        &self,
        gpu: &mut dyn GpuBackend,
        size: PhysicalSize<u32>,
        texture: Option<&TextureHandle>,
    ) -> DrawOutcome {
        if size.width == 0 || size.height == 0 {
            return DrawOutcome::Skipped;
        }
        match (self.pipeline, self.sampler, texture) {
            (Some(pipeline), Some(sampler), Some(texture)) => {
                gpu.draw_quad(size, pipeline, sampler, texture);
                DrawOutcome::Presented
            }
            _ => {
                gpu.clear_surface(size);
                DrawOutcome::Cleared
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some() && self.sampler.is_some()
    }

    pub fn release(&mut self, gpu: &mut dyn GpuBackend) {
        if let Some(sampler) = self.sampler.take() {
            gpu.destroy_sampler(sampler);
        }
        if let Some(pipeline) = self.pipeline.take() {
            gpu.destroy_pipeline(pipeline);
        }
    }
}

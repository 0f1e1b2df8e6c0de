//! ### English
//! Rendering module entry point.
//!
//! `GpuBackend` is the seam to the graphics API; `TextureUploader` and `PresentationPipeline`
//! drive it on behalf of the bridge. The OpenGL implementation lives in `gl`.
//!
//! ### 中文
//! 渲染模块入口。
//!
//! `GpuBackend` 是与图形 API 之间的接缝；`TextureUploader` 与 `PresentationPipeline` 代表渲染桥
//! 驱动它。OpenGL 实现位于 `gl`。

pub mod gl;
mod metrics;
mod pipeline;
mod uploader;

use dpi::PhysicalSize;

use crate::engine::error::GpuError;

pub use metrics::SurfaceMetrics;
pub use pipeline::{DrawOutcome, PresentationPipeline};
pub use uploader::TextureUploader;

/// ### English
/// Backend id of a linked vertex/fragment program.
///
/// ### 中文
/// 已链接的顶点/片元程序在后端中的 id。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerHandle(pub u32);

/// ### English
/// GPU-resident 2D texture and the size its storage was allocated with.
///
/// ### 中文
/// GPU 侧 2D 纹理及其存储分配时的尺寸。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureHandle {
    pub id: u32,
    pub size: PhysicalSize<u32>,
}

/// ### English
/// Last presented surface content, as handed to the embedder.
///
/// ### 中文
/// 最近一次呈现的 surface 内容（交给宿主使用）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentedFrame {
    pub texture_id: u32,
    /// ### English
    /// Producer fence (`GLsync` cast to `u64`), or `0` if unavailable.
    ///
    /// Valid only until the next draw of this surface: that draw deletes it (`glDeleteSync`) on
    /// the display thread. Wait on it from the display thread, or finish waiting before the next
    /// display tick; never delete it.
    ///
    /// ### 中文
    /// 生产者 fence（`GLsync` 转为 `u64`），不可用时为 `0`。
    ///
    /// 仅在该 surface 下一次绘制之前有效：下一次绘制会在显示线程上删除它（`glDeleteSync`）。
    /// 请在显示线程上等待它，或在下一次 display tick 之前完成等待；不要自行删除。
    pub fence: u64,
    pub size: PhysicalSize<u32>,
}

/// ### English
/// Graphics API operations needed by one surface.
///
/// Calls are serialized by the bridge lock but may come from different threads: uploads from the
/// decoder's render-ready thread, draws from the display thread, teardown from the UI thread.
///
/// ### 中文
/// 单个 surface 所需的图形 API 操作。
///
/// 调用由渲染桥锁串行化，但可能来自不同线程：上传来自解码器的 render-ready 线程，
/// 绘制来自显示线程，销毁来自 UI 线程。
pub trait GpuBackend: Send {
    fn create_pipeline(&mut self) -> Result<PipelineHandle, GpuError>;

    fn create_sampler(&mut self) -> Result<SamplerHandle, GpuError>;

    fn create_texture(&mut self, size: PhysicalSize<u32>) -> Result<TextureHandle, GpuError>;

    /// ### English
    /// Overwrites the whole texture with tightly packed 4-byte pixels (`size.width * 4` stride).
    ///
    /// ### 中文
    /// 以紧密排列的 4 字节像素（stride 为 `size.width * 4`）覆盖整个纹理。
    fn upload_texture(&mut self, texture: &TextureHandle, pixels: &[u8]) -> Result<(), GpuError>;

    fn destroy_texture(&mut self, texture: TextureHandle);

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);

    fn destroy_sampler(&mut self, sampler: SamplerHandle);

    /// ### English
    /// Clears the surface (blank output while connecting or without a frame).
    ///
    /// ### 中文
    /// 清空 surface（连接中或尚无帧时输出空白）。
    fn clear_surface(&mut self, size: PhysicalSize<u32>);

    /// ### English
    /// Draws one full-surface quad sampling `texture`; no blending, no depth test.
    ///
    /// ### 中文
    /// 绘制一个采样 `texture` 的全 surface 四边形；不混合、不做深度测试。
    fn draw_quad(
        &mut self,
        size: PhysicalSize<u32>,
        pipeline: PipelineHandle,
        sampler: SamplerHandle,
        texture: &TextureHandle,
    );

    /// ### English
    /// Renderable surface handle, or `None` before the first draw.
    ///
    /// ### 中文
    /// 可渲染的 surface 句柄；首次绘制前为 `None`。
    fn presented_frame(&self) -> Option<PresentedFrame>;
}

/// ### English
/// Creates one `GpuBackend` per surface.
///
/// ### 中文
/// 为每个 surface 创建一个 `GpuBackend`。
pub trait GpuFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn GpuBackend>, GpuError>;
}

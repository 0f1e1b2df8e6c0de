//! ### English
//! Surface Adapter: maps UI tile lifecycle events onto one render bridge.
//!
//! ### 中文
//! Surface 适配器：把 UI tile 的生命周期事件映射到单个渲染桥。

use std::sync::Arc;

use dpi::LogicalSize;

use crate::engine::bridge::{BridgeServices, RenderBridge};
use crate::engine::config::BridgeConfig;
use crate::engine::error::BridgeError;
use crate::engine::rendering::{PresentedFrame, SurfaceMetrics};
use crate::engine::state::StreamState;

/// ### English
/// UI-facing handle of one camera tile.
///
/// Creation attaches; visibility drives pause/resume; `destroy` and `Drop` both shut the bridge
/// down, and only the first of them does any work.
///
/// ### 中文
/// 单个摄像头 tile 面向 UI 的句柄。
///
/// 创建即 attach；可见性驱动 pause/resume；`destroy` 与 `Drop` 都会关闭渲染桥，只有先发生的那次
/// 真正执行。
pub struct SurfaceAdapter {
    bridge: Arc<RenderBridge>,
}

impl SurfaceAdapter {
    /// ### English
    /// Creates the bridge and attaches it to `locator`.
    ///
    /// #### Parameters
    /// - `id`: Surface id.
    /// - `locator`: Stream locator from the session client.
    /// - `config`: Decoder configuration.
    /// - `size`: Initial logical tile size.
    /// - `scale_factor`: Display pixel density.
    /// - `services`: Runtime collaborators.
    ///
    /// ### 中文
    /// 创建渲染桥并 attach 到 `locator`。
    ///
    /// #### 参数
    /// - `id`：surface id。
    /// - `locator`：会话客户端提供的流定位符。
    /// - `config`：解码配置。
    /// - `size`：初始逻辑 tile 尺寸。
    /// - `scale_factor`：显示像素密度。
    /// - `services`：运行时协作者。
    pub fn new(
        id: u64,
        locator: &str,
        config: BridgeConfig,
        size: LogicalSize<u32>,
        scale_factor: f64,
        services: BridgeServices,
    ) -> Result<Self, BridgeError> {
        let metrics = Arc::new(SurfaceMetrics::new(size, scale_factor));
        let bridge = RenderBridge::new(id, config, metrics, services);
        bridge.attach(locator)?;
        Ok(Self { bridge })
    }

    pub fn id(&self) -> u64 {
        self.bridge.id()
    }

    /// ### English
    /// Visible tiles play; hidden tiles pause.
    ///
    /// ### 中文
    /// 可见的 tile 播放；隐藏的 tile 暂停。
    pub fn set_visible(&self, visible: bool) {
        if visible {
            self.bridge.resume();
        } else {
            self.bridge.pause();
        }
    }

    /// ### English
    /// Updates the live tile size and scale factor; the next render uses them. A redraw is
    /// requested so the last frame is stretched to the new size until a new one arrives.
    ///
    /// ### 中文
    /// 更新实时 tile 尺寸与缩放因子，下一次渲染即使用新值。同时请求重绘，使最后一帧在新帧到来前
    /// 被拉伸到新尺寸。
    pub fn set_metrics(&self, size: LogicalSize<u32>, scale_factor: f64) {
        if !self.bridge.metrics().set(size, scale_factor) {
            tracing::warn!(surface = self.id(), scale_factor, "invalid scale factor ignored");
        }
        if !self.bridge.is_shut_down() {
            self.bridge.request_redraw();
        }
    }

    pub fn stream_state(&self) -> StreamState {
        self.bridge.stream_state()
    }

    pub fn subscribe(&self, observer: impl Fn(&StreamState) + Send + Sync + 'static) {
        self.bridge.subscribe(observer);
    }

    /// ### English
    /// GL texture id of the renderable surface (`0` before the first draw).
    ///
    /// ### 中文
    /// 可渲染 surface 的 GL 纹理 id（首次绘制前为 `0`）。
    pub fn surface_texture_id(&self) -> u32 {
        self.bridge.texture_id()
    }

    pub fn surface_frame(&self) -> Option<PresentedFrame> {
        self.bridge.presented_frame()
    }

    pub fn stop(&self) {
        self.bridge.stop();
    }

    /// ### English
    /// Explicit teardown hook (tile removed).
    ///
    /// ### 中文
    /// 显式销毁钩子（tile 被移除）。
    pub fn destroy(&self) {
        self.bridge.shutdown();
    }

    pub fn bridge(&self) -> &Arc<RenderBridge> {
        &self.bridge
    }
}

impl Drop for SurfaceAdapter {
    fn drop(&mut self) {
        self.bridge.shutdown();
    }
}

//! ### English
//! Bridge runtime: shared queues and backend factories for every surface of one embedder.
//!
//! ### 中文
//! 渲染桥运行时：同一宿主下所有 surface 共享的队列与后端工厂。

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dpi::LogicalSize;

use crate::engine::bridge::BridgeServices;
use crate::engine::config::BridgeConfig;
use crate::engine::decoder::DecoderFactory;
use crate::engine::decoder::mpv::MpvDecoderFactory;
use crate::engine::dispatch::MainThreadQueue;
use crate::engine::error::BridgeError;
use crate::engine::glfw::GlfwWindowPtr;
use crate::engine::rendering::GpuFactory;
use crate::engine::rendering::gl::GlGpuFactory;
use crate::engine::surface::SurfaceAdapter;
use crate::engine::vsync::{DisplayLink, ImmediateDisplayLink, VsyncRedrawQueue};

/// ### English
/// Owns the main-thread task queue, the vsync redraw queue and the backend factories.
///
/// The embedder drives it from two places: `pump` on the UI thread (decoder events, state
/// changes) and `tick` on the display thread (redraws).
///
/// ### 中文
/// 持有主线程任务队列、vsync 重绘队列与后端工厂。
///
/// 宿主从两处驱动它：UI 线程调用 `pump`（解码器事件、状态变化），显示线程调用 `tick`（重绘）。
pub struct BridgeRuntime {
    decoder_factory: Arc<dyn DecoderFactory>,
    gpu_factory: Arc<dyn GpuFactory>,
    main_thread: MainThreadQueue,
    vsync: Arc<VsyncRedrawQueue>,
    next_surface_id: AtomicU64,
}

impl BridgeRuntime {
    pub fn new(decoder_factory: Arc<dyn DecoderFactory>, gpu_factory: Arc<dyn GpuFactory>) -> Self {
        Self {
            decoder_factory,
            gpu_factory,
            main_thread: MainThreadQueue::new(),
            vsync: Arc::new(VsyncRedrawQueue::new()),
            next_surface_id: AtomicU64::new(1),
        }
    }

    /// ### English
    /// Runtime backed by libmpv (software rendering) and OpenGL through the embedder's GLFW
    /// context.
    ///
    /// #### Parameters
    /// - `glfw_shared_window`: Embedder-owned GLFW window whose context shares GL objects.
    /// - `libmpv_path`: Optional explicit libmpv path (otherwise the platform default names).
    ///
    /// ### 中文
    /// 基于 libmpv（软件渲染）与宿主 GLFW 上下文下 OpenGL 的运行时。
    ///
    /// #### 参数
    /// - `glfw_shared_window`：宿主持有的 GLFW window，其上下文与本 crate 共享 GL 对象。
    /// - `libmpv_path`：可选的 libmpv 显式路径（否则使用平台默认名称）。
    pub fn with_glfw_mpv(
        glfw_shared_window: GlfwWindowPtr,
        libmpv_path: Option<&Path>,
    ) -> Result<Self, BridgeError> {
        let decoder_factory = MpvDecoderFactory::load(libmpv_path)?;
        let gpu_factory = GlGpuFactory::new(glfw_shared_window)?;
        tracing::info!("bridge runtime ready (libmpv + OpenGL)");
        Ok(Self::new(Arc::new(decoder_factory), Arc::new(gpu_factory)))
    }

    fn services(&self, config: &BridgeConfig) -> BridgeServices {
        let display: Arc<dyn DisplayLink> = if config.immediate_redraw {
            Arc::new(ImmediateDisplayLink)
        } else {
            self.vsync.clone()
        };
        BridgeServices {
            decoder_factory: self.decoder_factory.clone(),
            gpu_factory: self.gpu_factory.clone(),
            main_thread: self.main_thread.clone(),
            display,
        }
    }

    /// ### English
    /// Creates and attaches one camera surface. Must be called on the UI thread.
    ///
    /// ### 中文
    /// 创建并 attach 一个摄像头 surface；必须在 UI 线程调用。
    pub fn create_surface(
        &self,
        locator: &str,
        config: BridgeConfig,
        size: LogicalSize<u32>,
        scale_factor: f64,
    ) -> Result<SurfaceAdapter, BridgeError> {
        let id = self.next_surface_id.fetch_add(1, Ordering::Relaxed);
        let services = self.services(&config);
        SurfaceAdapter::new(id, locator, config, size, scale_factor, services)
    }

    /// ### English
    /// Runs tasks marshalled to the UI thread (decoder events, state transitions).
    ///
    /// ### 中文
    /// 执行投递到 UI 线程的任务（解码器事件、状态转换）。
    pub fn pump(&self) -> usize {
        self.main_thread.drain()
    }

    /// ### English
    /// Runs pending redraws on the calling (display) thread.
    ///
    /// ### 中文
    /// 在调用线程（显示线程）执行待处理的重绘。
    pub fn tick(&self) -> usize {
        self.vsync.tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::decoder::DecoderEvent;
    use crate::engine::flags;
    use crate::engine::state::StreamState;
    use crate::engine::testing::{FakeDecoderFactory, FakeGpuFactory};

    fn runtime() -> (BridgeRuntime, Arc<FakeDecoderFactory>, Arc<FakeGpuFactory>) {
        let decoder = Arc::new(FakeDecoderFactory::new());
        let gpu = Arc::new(FakeGpuFactory::new());
        (BridgeRuntime::new(decoder.clone(), gpu.clone()), decoder, gpu)
    }

    #[test]
    fn pump_applies_decoder_events_and_tick_draws() {
        let (runtime, decoder, gpu) = runtime();
        let surface = runtime
            .create_surface(
                "rtsp://example/stream",
                BridgeConfig::default(),
                LogicalSize::new(320, 240),
                1.0,
            )
            .unwrap();
        let engine = decoder.last_probe().unwrap();

        engine.push_event(DecoderEvent::FileLoaded);
        engine.fire_wakeup();
        assert_eq!(surface.stream_state(), StreamState::Connecting);
        assert_eq!(runtime.pump(), 1);
        assert_eq!(surface.stream_state(), StreamState::Playing);

        engine.fire_frame();
        assert_eq!(gpu.probe().draw_calls(), 0);
        assert_eq!(runtime.tick(), 1);
        assert_eq!(gpu.probe().draw_calls(), 1);
        assert_ne!(surface.surface_texture_id(), 0);
    }

    #[test]
    fn surfaces_get_distinct_ids() {
        let (runtime, _, _) = runtime();
        let config = BridgeConfig::default();
        let a = runtime
            .create_surface("rtsp://a/1", config.clone(), LogicalSize::new(1, 1), 1.0)
            .unwrap();
        let b = runtime
            .create_surface("rtsp://b/1", config, LogicalSize::new(1, 1), 1.0)
            .unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn immediate_redraw_flag_bypasses_the_vsync_queue() {
        let (runtime, decoder, gpu) = runtime();
        let config = BridgeConfig::from_flags(flags::CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW);
        let _surface = runtime
            .create_surface("rtsp://example/stream", config, LogicalSize::new(64, 64), 1.0)
            .unwrap();

        decoder.last_probe().unwrap().fire_frame();
        assert_eq!(gpu.probe().draw_calls(), 1);
        assert_eq!(runtime.tick(), 0);
    }
}

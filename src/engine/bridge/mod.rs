//! ### English
//! Lifecycle Controller: one render bridge per camera surface.
//!
//! All mutable decoder and GPU state lives behind a single re-entrant lock
//! (`ReentrantMutex<RefCell<BridgeResources>>`). The `RefCell` borrow is always dropped before
//! calling into the display scheduler, so a display system that re-enters `draw` from inside
//! `schedule` neither deadlocks nor double-borrows.
//!
//! Decoder callbacks run on engine-owned threads. They read the shutdown flags without locking and
//! return immediately once shutdown was requested. Wake-ups are marshalled to the UI thread through
//! the main-thread queue. Render-ready notifications render under the lock on the calling thread.
//!
//! ### 中文
//! 生命周期控制器：每个摄像头 surface 一个渲染桥。
//!
//! 所有可变的解码器与 GPU 状态都位于同一把可重入锁之后（`ReentrantMutex<RefCell<BridgeResources>>`）。
//! 调用显示调度器之前总会先释放 `RefCell` 借用，因此在 `schedule` 内部重入 `draw` 的显示系统
//! 既不会死锁，也不会重复借用。
//!
//! 解码器回调运行在引擎自有线程上：无锁读取关闭标记，一旦已请求关闭立即返回。
//! wake-up 通过主线程队列投递到 UI 线程；render-ready 通知在调用线程上持锁渲染。

mod events;
mod lifecycle;
mod present;
mod render;
mod shutdown;
#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;

use crate::engine::config::BridgeConfig;
use crate::engine::decoder::{DecoderFactory, DecoderHandle, SoftwareRenderContext};
use crate::engine::dispatch::MainThreadQueue;
use crate::engine::frame::FrameBuffer;
use crate::engine::rendering::{
    GpuBackend, GpuFactory, PresentationPipeline, SurfaceMetrics, TextureUploader,
};
use crate::engine::state::{LifecyclePhase, ShutdownFlags, StreamState, StreamStateCell};
use crate::engine::vsync::DisplayLink;

/// ### English
/// Collaborators shared by every bridge of one runtime.
///
/// ### 中文
/// 同一运行时下所有渲染桥共享的协作者。
#[derive(Clone)]
pub struct BridgeServices {
    pub decoder_factory: Arc<dyn DecoderFactory>,
    pub gpu_factory: Arc<dyn GpuFactory>,
    /// ### English
    /// Queue drained on the UI thread (`BridgeRuntime::pump`).
    ///
    /// ### 中文
    /// 在 UI 线程 drain 的队列（`BridgeRuntime::pump`）。
    pub main_thread: MainThreadQueue,
    pub display: Arc<dyn DisplayLink>,
}

/// ### English
/// Lock-free flags read by decoder callback threads.
///
/// ### 中文
/// 解码器回调线程无锁读取的标记。
#[derive(Default)]
struct BridgeSignals {
    shutdown: ShutdownFlags,
    /// ### English
    /// A drain task is queued on the UI thread; further wake-ups are coalesced into it.
    ///
    /// ### 中文
    /// UI 线程上已排队一个 drain 任务；后续 wake-up 会合并到该任务中。
    wakeup_pending: AtomicBool,
    /// ### English
    /// A redraw is scheduled on the display link and has not run yet.
    ///
    /// ### 中文
    /// 已在 display link 上调度一次尚未执行的重绘。
    redraw_pending: AtomicBool,
    first_frame_reported: AtomicBool,
    /// ### English
    /// `shutdown` ran while `render`/`draw` held the resources; the outer call finishes the
    /// teardown once its borrow is released.
    ///
    /// ### 中文
    /// `shutdown` 在 `render`/`draw` 持有资源借用时被调用；外层调用释放借用后完成销毁。
    teardown_deferred: AtomicBool,
}

/// ### English
/// State guarded by the bridge lock.
///
/// ### 中文
/// 由渲染桥锁保护的状态。
struct BridgeResources {
    phase: LifecyclePhase,
    decoder: Option<DecoderHandle>,
    render_context: Option<Box<dyn SoftwareRenderContext>>,
    frame: Option<FrameBuffer>,
    gpu: Option<Box<dyn GpuBackend>>,
    uploader: TextureUploader,
    pipeline: PresentationPipeline,
    /// ### English
    /// Set after a GPU resource failure; the render path stays off until the bridge is recreated.
    ///
    /// ### 中文
    /// GPU 资源失败后置位；在渲染桥重建之前渲染路径保持关闭。
    render_inert: bool,
}

impl BridgeResources {
    fn new() -> Self {
        Self {
            phase: LifecyclePhase::Uninitialized,
            decoder: None,
            render_context: None,
            frame: None,
            gpu: None,
            uploader: TextureUploader::new(),
            pipeline: PresentationPipeline::new(),
            render_inert: false,
        }
    }
}

/// ### English
/// Render bridge of one camera surface.
///
/// Always handled through `Arc`: decoder callbacks and scheduled tasks hold `Weak` references.
///
/// ### 中文
/// 单个摄像头 surface 的渲染桥。
///
/// 始终通过 `Arc` 持有：解码器回调与已调度任务只持有 `Weak` 引用。
pub struct RenderBridge {
    id: u64,
    config: BridgeConfig,
    lock: ReentrantMutex<RefCell<BridgeResources>>,
    signals: Arc<BridgeSignals>,
    state: StreamStateCell,
    metrics: Arc<SurfaceMetrics>,
    services: BridgeServices,
    this: Weak<RenderBridge>,
}

impl RenderBridge {
    /// ### English
    /// Creates an unattached bridge.
    ///
    /// #### Parameters
    /// - `id`: Surface id (log field).
    /// - `config`: Decoder configuration used by `attach`.
    /// - `metrics`: Live surface metrics read on every render.
    /// - `services`: Shared runtime collaborators.
    ///
    /// ### 中文
    /// 创建一个尚未 attach 的渲染桥。
    ///
    /// #### 参数
    /// - `id`：surface id（日志字段）。
    /// - `config`：`attach` 使用的解码配置。
    /// - `metrics`：每次渲染都会读取的实时 surface 度量。
    /// - `services`：共享的运行时协作者。
    pub fn new(
        id: u64,
        config: BridgeConfig,
        metrics: Arc<SurfaceMetrics>,
        services: BridgeServices,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id,
            config,
            lock: ReentrantMutex::new(RefCell::new(BridgeResources::new())),
            signals: Arc::new(BridgeSignals::default()),
            state: StreamStateCell::new(),
            metrics,
            services,
            this: this.clone(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn stream_state(&self) -> StreamState {
        self.state.get()
    }

    /// ### English
    /// Registers an observer called on the UI thread after every stream state transition.
    ///
    /// Observers may call back into the bridge; no bridge or state lock is held while they run.
    ///
    /// ### 中文
    /// 注册观察者；每次流状态转换后在 UI 线程上调用。
    ///
    /// 观察者可以回调渲染桥；其运行期间不持有渲染桥锁或状态锁。
    pub fn subscribe(&self, observer: impl Fn(&StreamState) + Send + Sync + 'static) {
        self.state.subscribe(Arc::new(observer));
    }

    pub fn metrics(&self) -> &Arc<SurfaceMetrics> {
        &self.metrics
    }

    /// ### English
    /// Current lifecycle phase (briefly takes the bridge lock).
    ///
    /// ### 中文
    /// 当前生命周期阶段（会短暂获取渲染桥锁）。
    pub fn phase(&self) -> LifecyclePhase {
        let guard = self.lock.lock();
        guard
            .try_borrow()
            .map(|resources| resources.phase)
            .unwrap_or(LifecyclePhase::ShuttingDown)
    }

    pub fn is_shut_down(&self) -> bool {
        self.signals.shutdown.is_completed()
    }

    /// ### English
    /// Posts `task` to the UI thread with a strong reference to this bridge, if it is still alive.
    ///
    /// ### 中文
    /// 若渲染桥仍存活，则携带其强引用将 `task` 投递到 UI 线程。
    fn post_to_main_thread(&self, task: impl FnOnce(&RenderBridge) + Send + 'static) {
        let this = self.this.clone();
        self.services.main_thread.post(Box::new(move || {
            if let Some(bridge) = this.upgrade() {
                task(&bridge);
            }
        }));
    }
}

impl Drop for RenderBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

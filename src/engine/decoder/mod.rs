//! ### English
//! Decoder engine seam.
//!
//! The bridge drives a native decoding engine through two object-safe traits: `DecoderEngine`
//! (one engine instance) and `SoftwareRenderContext` (the "paint into caller memory" capability
//! tied to that instance). `DecoderHandle` owns one engine and implements the bridge-facing
//! contract (configure, open, fire-and-forget commands, idempotent shutdown).
//!
//! ### 中文
//! 解码引擎接缝。
//!
//! 渲染桥通过两个对象安全的 trait 驱动原生解码引擎：`DecoderEngine`（单个引擎实例）与
//! `SoftwareRenderContext`（绑定到该实例的“绘制到调用方内存”能力）。`DecoderHandle` 持有一个引擎，
//! 并实现面向渲染桥的契约（配置、打开、即发即弃命令、幂等关闭）。

mod callback;
mod handle;
pub mod mpv;

pub(crate) use callback::CallbackToken;
pub use handle::DecoderHandle;

use crate::engine::error::DecoderError;
use crate::engine::frame::FrameBuffer;

/// ### English
/// Notification closure registered with the engine (wake-up or render-ready).
///
/// Invoked on engine-owned threads; must not block and must not call back into the engine.
///
/// ### 中文
/// 注册到引擎的通知闭包（wake-up 或 render-ready）。
///
/// 在引擎自有线程上调用；不得阻塞，也不得回调引擎。
pub type NotifyFn = dyn Fn() + Send + Sync + 'static;

/// ### English
/// Why the engine stopped playing the current stream.
///
/// ### 中文
/// 引擎停止播放当前流的原因。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndFileReason {
    Eof,
    Stop,
    Quit,
    Error,
    Redirect,
    Unknown(i32),
}

/// ### English
/// One event drained from the engine's event queue.
///
/// ### 中文
/// 从引擎事件队列中取出的单个事件。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecoderEvent {
    FileLoaded,
    EndFile {
        reason: EndFileReason,
        /// ### English
        /// Engine diagnostic code (`0` unless `reason` is `Error`).
        ///
        /// ### 中文
        /// 引擎诊断码（`reason` 不是 `Error` 时为 `0`）。
        code: i32,
        detail: Option<String>,
    },
    /// ### English
    /// An asynchronous command failed after it was accepted.
    ///
    /// ### 中文
    /// 已被接受的异步命令在之后执行失败。
    CommandFailed { code: i32, detail: Option<String> },
    Shutdown,
    Log {
        level: String,
        prefix: String,
        text: String,
    },
}

/// ### English
/// One native decoder engine instance.
///
/// Calls are issued from one owner at a time (the bridge's UI thread, or any thread under the
/// bridge lock); the engine may invoke registered callbacks from its own threads.
///
/// ### 中文
/// 单个原生解码引擎实例。
///
/// 调用同一时间只来自一个持有者（渲染桥的 UI 线程，或持有渲染桥锁的任意线程）；
/// 引擎可在其自有线程上调用已注册的回调。
pub trait DecoderEngine: Send {
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), DecoderError>;

    fn request_log_messages(&mut self, min_level: &str) -> Result<(), DecoderError>;

    fn initialize(&mut self) -> Result<(), DecoderError>;

    /// ### English
    /// Queues a command asynchronously; only argument validation errors are reported here.
    ///
    /// ### 中文
    /// 异步排队一个命令；此处只报告参数校验错误。
    fn command_async(&mut self, args: &[&str]) -> Result<(), DecoderError>;

    /// ### English
    /// Registers (`Some`) or unregisters (`None`) the wake-up callback.
    ///
    /// Unregistering must guarantee the previous callback is not invoked afterwards.
    ///
    /// ### 中文
    /// 注册（`Some`）或注销（`None`）wake-up 回调。
    ///
    /// 注销后必须保证之前的回调不会再被调用。
    fn set_wakeup_callback(&mut self, callback: Option<Box<NotifyFn>>);

    /// ### English
    /// Returns the next pending event without blocking, or `None` when the queue is empty.
    ///
    /// ### 中文
    /// 非阻塞地返回下一个待处理事件；队列为空时返回 `None`。
    fn next_event(&mut self) -> Option<DecoderEvent>;

    fn create_render_context(&mut self) -> Result<Box<dyn SoftwareRenderContext>, DecoderError>;

    /// ### English
    /// Halts the engine and releases the native instance. Called at most once.
    ///
    /// ### 中文
    /// 停止引擎并释放原生实例；最多调用一次。
    fn destroy(&mut self);
}

/// ### English
/// Software rendering capability of one engine instance.
///
/// ### 中文
/// 单个引擎实例的软件渲染能力。
pub trait SoftwareRenderContext: Send {
    /// ### English
    /// Registers (`Some`) or unregisters (`None`) the render-ready callback.
    ///
    /// ### 中文
    /// 注册（`Some`）或注销（`None`）render-ready 回调。
    fn set_update_callback(&mut self, callback: Option<Box<NotifyFn>>);

    /// ### English
    /// Acknowledges the last update notification; returns `true` if a new video frame is due.
    ///
    /// ### 中文
    /// 确认上一次更新通知；若有新视频帧待绘制则返回 `true`。
    fn frame_ready(&mut self) -> bool;

    /// ### English
    /// Paints the current video frame into `frame` at its size and stride, synchronously.
    ///
    /// ### 中文
    /// 同步地按 `frame` 的尺寸与 stride 将当前视频帧绘制到其中。
    fn render(&mut self, frame: &mut FrameBuffer) -> Result<(), DecoderError>;

    /// ### English
    /// Releases the native render context. Called at most once, after the update callback was
    /// unregistered.
    ///
    /// ### 中文
    /// 释放原生渲染上下文；最多调用一次，且在注销更新回调之后调用。
    fn free(&mut self);
}

/// ### English
/// Creates engine instances (one per attach).
///
/// ### 中文
/// 创建引擎实例（每次 attach 一个）。
pub trait DecoderFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn DecoderEngine>, DecoderError>;
}

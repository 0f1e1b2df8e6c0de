//! ### English
//! Display scheduling for redraw requests.
//!
//! The render path never calls the draw routine directly; it hands a redraw callback to a
//! `DisplayLink`. The default link is a queue drained by the embedder's display tick, so the
//! display system decides when (and how often) surfaces are drawn.
//!
//! ### 中文
//! 重绘请求的显示调度。
//!
//! 渲染路径从不直接调用绘制函数，而是把重绘回调交给 `DisplayLink`。默认实现是一个由宿主显示
//! tick drain 的队列，由显示系统决定何时（以及多频繁地）绘制各 surface。

use crossbeam_channel as channel;

/// ### English
/// Redraw callback payload.
///
/// ### 中文
/// 重绘回调载荷。
pub type RedrawCallback = Box<dyn FnOnce() + Send + 'static>;

/// ### English
/// The display's native scheduling mechanism as seen by the bridge.
///
/// Implementations may run the callback later on the display thread, or synchronously from
/// inside `schedule` (some display systems re-enter the draw routine from the same call stack);
/// the bridge tolerates both.
///
/// ### 中文
/// 渲染桥视角下的显示原生调度机制。
///
/// 实现可以稍后在显示线程执行回调，也可以在 `schedule` 内同步执行（某些显示系统会在同一调用栈
/// 内重入绘制函数）；渲染桥两者都能容忍。
pub trait DisplayLink: Send + Sync {
    fn schedule(&self, callback: RedrawCallback);
}

/// ### English
/// Redraw queue drained by the embedder's vsync tick (display thread).
///
/// ### 中文
/// 由宿主 vsync tick（显示线程）drain 的重绘队列。
pub struct VsyncRedrawQueue {
    tx: channel::Sender<RedrawCallback>,
    rx: channel::Receiver<RedrawCallback>,
}

impl Default for VsyncRedrawQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl VsyncRedrawQueue {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    /// ### English
    /// Drains queued redraw callbacks and executes them on the calling (display) thread.
    ///
    /// Only drains up to the length observed on entry so callbacks enqueued during the tick run on
    /// the next tick.
    ///
    /// ### 中文
    /// drain 并在调用线程（显示线程）执行已排队的重绘回调。
    ///
    /// 仅 drain 到进入时观察到的长度，tick 期间新入队的回调留到下一次 tick。
    pub fn tick(&self) -> usize {
        let snapshot = self.rx.len();
        let mut drawn = 0;
        for _ in 0..snapshot {
            let Ok(callback) = self.rx.try_recv() else {
                break;
            };
            callback();
            drawn += 1;
        }
        drawn
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl DisplayLink for VsyncRedrawQueue {
    fn schedule(&self, callback: RedrawCallback) {
        let _ = self.tx.send(callback);
    }
}

/// ### English
/// Display link that runs the redraw synchronously inside `schedule`.
///
/// ### 中文
/// 在 `schedule` 内同步执行重绘的 display link。
#[derive(Default)]
pub struct ImmediateDisplayLink;

impl DisplayLink for ImmediateDisplayLink {
    fn schedule(&self, callback: RedrawCallback) {
        callback();
    }
}

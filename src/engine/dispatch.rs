//! ### English
//! Main-thread task queue.
//!
//! Decoder callback threads never mutate UI-owned state directly: they post a task here and
//! return. The UI thread drains the queue from its own loop (`BridgeRuntime::pump`).
//!
//! ### 中文
//! 主线程任务队列。
//!
//! 解码器回调线程从不直接修改 UI 持有的状态：只向这里投递任务后立即返回。
//! UI 线程在自身循环中 drain 该队列（`BridgeRuntime::pump`）。

use crossbeam_channel as channel;

/// ### English
/// Task executed on the UI thread.
///
/// ### 中文
/// 在 UI 线程执行的任务。
pub type MainThreadTask = Box<dyn FnOnce() + Send + 'static>;

/// ### English
/// Multi-producer queue of tasks drained by the UI thread. Cloning shares the same queue.
///
/// ### 中文
/// 由 UI 线程 drain 的多生产者任务队列；clone 后共享同一队列。
#[derive(Clone)]
pub struct MainThreadQueue {
    tx: channel::Sender<MainThreadTask>,
    rx: channel::Receiver<MainThreadTask>,
}

impl Default for MainThreadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainThreadQueue {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    /// ### English
    /// Posts a task for the UI thread (post-and-return, never blocks).
    ///
    /// ### 中文
    /// 向 UI 线程投递任务（投递即返回，永不阻塞）。
    pub fn post(&self, task: MainThreadTask) {
        let _ = self.tx.send(task);
    }

    /// ### English
    /// Runs the tasks queued before this call; tasks posted while draining run on the next drain.
    ///
    /// Returns the number of executed tasks.
    ///
    /// ### 中文
    /// 执行本次调用之前已排队的任务；drain 期间新投递的任务留到下一次 drain。
    ///
    /// 返回执行的任务数量。
    pub fn drain(&self) -> usize {
        let snapshot = self.rx.len();
        let mut executed = 0;
        for _ in 0..snapshot {
            match self.rx.try_recv() {
                Ok(task) => {
                    task();
                    executed += 1;
                }
                Err(_) => break,
            }
        }
        executed
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

//! ### English
//! Observable stream state, lifecycle phase and the two-phase shutdown flags.
//!
//! ### 中文
//! 可观察的流状态、生命周期阶段以及两阶段关闭标记。

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

/// ### English
/// Stream state observed by the UI layer for overlay rendering.
///
/// ### 中文
/// UI 层观察的流状态（用于叠加层显示）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connecting,
    Playing,
    /// ### English
    /// Holds a short diagnostic string suitable for display.
    ///
    /// ### 中文
    /// 携带可直接展示的简短诊断信息。
    Error(String),
}

impl StreamState {
    /// ### English
    /// Numeric code used by the C ABI (`0` idle, `1` connecting, `2` playing, `3` error).
    ///
    /// ### 中文
    /// C ABI 使用的数值编码（`0` idle、`1` connecting、`2` playing、`3` error）。
    pub fn code(&self) -> u32 {
        match self {
            Self::Idle => 0,
            Self::Connecting => 1,
            Self::Playing => 2,
            Self::Error(_) => 3,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// ### English
/// Lifecycle phase of one render bridge.
///
/// `Attached` means the stream was opened and is playing (not yet paused by the UI).
///
/// ### 中文
/// 单个渲染桥的生命周期阶段。
///
/// `Attached` 表示流已打开并在播放（尚未被 UI 暂停）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecyclePhase {
    Uninitialized,
    Attached,
    Active,
    Paused,
    ShuttingDown,
    ShutDown,
}

impl LifecyclePhase {
    /// ### English
    /// Whether pause/resume are meaningful in this phase.
    ///
    /// ### 中文
    /// 该阶段下 pause/resume 是否有意义。
    pub fn accepts_playback_commands(self) -> bool {
        matches!(self, Self::Attached | Self::Active | Self::Paused)
    }
}

const SHUTDOWN_RUNNING: u8 = 0;
const SHUTDOWN_DRAINING: u8 = 1;
const SHUTDOWN_STOPPED: u8 = 2;

/// ### English
/// Two-phase shutdown flags as an atomic tri-state (`running → draining → stopped`).
///
/// - "requested" (`draining` or later) is advisory: decoder callbacks read it without locking and
///   bail out before touching shared state.
/// - "completed" (`stopped`) guards against double teardown.
///
/// Both transitions are monotonic; the state never moves backwards.
///
/// ### 中文
/// 以原子三态（`running → draining → stopped`）表示的两阶段关闭标记。
///
/// - “已请求”（`draining` 及之后）仅为提示：解码回调无锁读取，并在触碰共享状态前直接返回。
/// - “已完成”（`stopped`）防止重复销毁。
///
/// 两次转换都是单调的，状态永不回退。
#[derive(Debug, Default)]
pub struct ShutdownFlags {
    state: AtomicU8,
}

impl ShutdownFlags {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SHUTDOWN_RUNNING),
        }
    }

    /// ### English
    /// Marks shutdown as requested. Returns `true` iff this call performed the transition.
    ///
    /// ### 中文
    /// 标记关闭已请求；当且仅当本次调用完成了状态转换时返回 `true`。
    #[inline]
    pub fn request(&self) -> bool {
        self.state
            .compare_exchange(
                SHUTDOWN_RUNNING,
                SHUTDOWN_DRAINING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// ### English
    /// Marks shutdown as completed (implies requested).
    ///
    /// ### 中文
    /// 标记关闭已完成（同时意味着已请求）。
    #[inline]
    pub fn complete(&self) {
        self.state.store(SHUTDOWN_STOPPED, Ordering::Release);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.state.load(Ordering::Acquire) != SHUTDOWN_RUNNING
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.state.load(Ordering::Acquire) == SHUTDOWN_STOPPED
    }
}

type StateObserver = Arc<dyn Fn(&StreamState) + Send + Sync + 'static>;

/// ### English
/// Single-writer cell for `StreamState` plus its observers.
///
/// Writes only happen on the UI thread (callbacks marshal there first). The mutexes exist so the
/// cell can live inside a shared bridge; none of them is held while observers run, so an observer
/// may call back into the bridge (`stop`, `subscribe`, ...).
///
/// ### 中文
/// `StreamState` 的单写者存储及其观察者。
///
/// 写入只发生在 UI 线程（回调会先投递到 UI 线程）。互斥锁仅用于让该存储能放在共享的渲染桥中；
/// 观察者运行期间不持有任何一把锁，因此观察者可以回调渲染桥（`stop`、`subscribe` 等）。
pub(crate) struct StreamStateCell {
    current: Mutex<StreamState>,
    observers: Mutex<Vec<StateObserver>>,
    owner: Mutex<Option<ThreadId>>,
}

impl StreamStateCell {
    pub(crate) fn new() -> Self {
        Self {
            current: Mutex::new(StreamState::Idle),
            observers: Mutex::new(Vec::new()),
            owner: Mutex::new(None),
        }
    }

    /// ### English
    /// Records the calling thread as the only thread allowed to write the state.
    ///
    /// ### 中文
    /// 记录调用线程为唯一允许写入状态的线程。
    pub(crate) fn bind_owner_thread(&self) {
        *self.owner.lock() = Some(thread::current().id());
    }

    pub(crate) fn get(&self) -> StreamState {
        self.current.lock().clone()
    }

    pub(crate) fn subscribe(&self, observer: StateObserver) {
        self.observers.lock().push(observer);
    }

    /// ### English
    /// Replaces the state and notifies observers when it actually changed.
    ///
    /// Observers run on a snapshot taken after the write, with no lock held. A nested `set` from
    /// an observer notifies everyone again before the outer notification continues.
    ///
    /// Returns `true` when a transition happened.
    ///
    /// ### 中文
    /// 替换状态；仅当状态实际变化时通知观察者。
    ///
    /// 观察者在写入后取得的快照上运行，期间不持有任何锁。观察者内部嵌套的 `set` 会先完成一轮通知，
    /// 然后外层通知才继续。
    ///
    /// 发生转换时返回 `true`。
    pub(crate) fn set(&self, next: StreamState) -> bool {
        debug_assert!(
            self.owner
                .lock()
                .is_none_or(|owner| owner == thread::current().id()),
            "StreamState must only be written on the UI thread"
        );

        {
            let mut current = self.current.lock();
            if *current == next {
                return false;
            }
            tracing::debug!(from = ?*current, to = ?next, "stream state transition");
            *current = next.clone();
        }

        let observers = self.observers.lock().clone();
        for observer in &observers {
            observer(&next);
        }
        true
    }

    /// ### English
    /// Applies `next` only if the current state equals `expected`.
    ///
    /// ### 中文
    /// 仅当当前状态等于 `expected` 时才切换到 `next`。
    pub(crate) fn transition(&self, expected: &StreamState, next: StreamState) -> bool {
        if self.get() != *expected {
            return false;
        }
        self.set(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn shutdown_flags_are_monotonic() {
        let flags = ShutdownFlags::new();
        assert!(!flags.is_requested());
        assert!(!flags.is_completed());

        assert!(flags.request());
        assert!(!flags.request());
        assert!(flags.is_requested());
        assert!(!flags.is_completed());

        flags.complete();
        assert!(flags.is_requested());
        assert!(flags.is_completed());
        assert!(!flags.request());
        assert!(flags.is_completed());
    }

    #[test]
    fn observers_only_see_real_transitions() {
        let cell = StreamStateCell::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        cell.subscribe(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(cell.set(StreamState::Connecting));
        assert!(!cell.set(StreamState::Connecting));
        assert!(!cell.transition(&StreamState::Idle, StreamState::Playing));
        assert!(cell.transition(&StreamState::Connecting, StreamState::Playing));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(cell.get(), StreamState::Playing);
    }

    #[test]
    fn observers_may_write_and_subscribe_from_a_notification() {
        let cell = Arc::new(StreamStateCell::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&cell);
        let late = late_calls.clone();
        cell.subscribe(Arc::new(move |state| {
            let Some(cell) = weak.upgrade() else {
                return;
            };
            if state.is_error() {
                let late = late.clone();
                cell.subscribe(Arc::new(move |_| {
                    late.fetch_add(1, Ordering::SeqCst);
                }));
                cell.set(StreamState::Idle);
            }
        }));

        assert!(cell.set(StreamState::Error("boom".into())));
        assert_eq!(cell.get(), StreamState::Idle);
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn codes_match_abi() {
        assert_eq!(StreamState::Idle.code(), 0);
        assert_eq!(StreamState::Connecting.code(), 1);
        assert_eq!(StreamState::Playing.code(), 2);
        assert_eq!(StreamState::Error("x".into()).code(), 3);
    }
}

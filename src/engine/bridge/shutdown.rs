//! ### English
//! Two-phase, idempotent shutdown.
//!
//! ### 中文
//! 两阶段、幂等的关闭流程。

use std::sync::atomic::Ordering;

use crate::engine::decoder::{DecoderHandle, SoftwareRenderContext};
use crate::engine::rendering::GpuBackend;
use crate::engine::state::LifecyclePhase;

use super::RenderBridge;

/// ### English
/// Torn-down objects dropped after the lock is released (their destructors may join engine
/// threads that are waiting for the lock).
///
/// ### 中文
/// 已销毁、在释放锁之后才 drop 的对象（其析构可能 join 正在等待该锁的引擎线程）。
struct Graveyard {
    _render_context: Option<Box<dyn SoftwareRenderContext>>,
    _decoder: Option<DecoderHandle>,
    _gpu: Option<Box<dyn GpuBackend>>,
}

impl RenderBridge {
    /// ### English
    /// Tears the bridge down. Safe from any state and any number of times; only the first call
    /// does work.
    ///
    /// Order: request flag, lock, render context (unregister then free), decoder (unregister
    /// then destroy), frame buffer, texture, pipeline objects, completed flag, unlock.
    ///
    /// Called from inside `render`/`draw` on the same thread (GPU or decoder re-entry), the
    /// teardown is deferred and completed by that outer call before it returns.
    ///
    /// ### 中文
    /// 销毁渲染桥。可在任意状态调用任意次；只有第一次调用会执行实际工作。
    ///
    /// 顺序：请求标记、加锁、渲染上下文（先注销再释放）、解码器（先注销再销毁）、帧缓冲、纹理、
    /// 管线对象、完成标记、解锁。
    ///
    /// 若在同一线程的 `render`/`draw` 内部被调用（GPU 或解码器重入），销毁会被推迟，
    /// 并由外层调用在返回前完成。
    pub fn shutdown(&self) {
        if self.signals.shutdown.is_completed() {
            return;
        }
        if self.signals.shutdown.request() {
            tracing::info!(surface = self.id, "render bridge shutdown requested");
        }

        let guard = self.lock.lock();
        if self.signals.shutdown.is_completed() {
            return;
        }

        let graveyard = {
            let Ok(mut resources) = guard.try_borrow_mut() else {
                tracing::debug!(surface = self.id, "shutdown deferred until render or draw returns");
                self.signals.teardown_deferred.store(true, Ordering::Release);
                return;
            };
            let resources = &mut *resources;
            resources.phase = LifecyclePhase::ShuttingDown;

            let render_context = resources.render_context.take().map(|mut context| {
                context.set_update_callback(None);
                context.free();
                context
            });

            let decoder = resources.decoder.take().map(|mut decoder| {
                decoder.shutdown();
                decoder
            });

            resources.frame = None;

            if let Some(gpu) = resources.gpu.as_mut() {
                resources.uploader.release(gpu.as_mut());
                resources.pipeline.release(gpu.as_mut());
            }

            resources.phase = LifecyclePhase::ShutDown;
            Graveyard {
                _render_context: render_context,
                _decoder: decoder,
                _gpu: resources.gpu.take(),
            }
        };

        self.signals.shutdown.complete();
        drop(guard);
        drop(graveyard);
        tracing::info!(surface = self.id, "render bridge shut down");
    }

    /// ### English
    /// Completes a shutdown that was deferred by re-entry. Call only after the resources borrow
    /// was released.
    ///
    /// ### 中文
    /// 完成因重入而推迟的关闭。只能在资源借用释放之后调用。
    pub(crate) fn finish_deferred_teardown(&self) {
        if self.signals.teardown_deferred.swap(false, Ordering::AcqRel) {
            self.shutdown();
        }
    }
}

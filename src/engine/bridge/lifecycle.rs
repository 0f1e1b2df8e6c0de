//! ### English
//! Attach, pause/resume and explicit stop (UI thread).
//!
//! ### 中文
//! attach、pause/resume 与显式停止（UI 线程）。

use std::sync::atomic::Ordering;

use crate::engine::decoder::{DecoderHandle, NotifyFn};
use crate::engine::error::BridgeError;
use crate::engine::locator;
use crate::engine::state::{LifecyclePhase, StreamState};

use super::{BridgeResources, RenderBridge};

impl RenderBridge {
    /// ### English
    /// Attaches the bridge to the stream at `locator`.
    ///
    /// Creates the GPU pipeline, the decoder engine and its render context, then opens the stream
    /// and emits `Connecting`. Initialization failures are not returned: they surface as
    /// `StreamState::Error` (no retry), as does a locator the decoder cannot play. Only an empty
    /// locator, a second attach or an attach after shutdown are returned as errors, without any
    /// state change.
    ///
    /// #### Parameters
    /// - `locator`: Opaque stream locator (transport URL or path, may embed credentials).
    ///
    /// ### 中文
    /// 将渲染桥 attach 到 `locator` 指向的流。
    ///
    /// 依次创建 GPU 管线、解码引擎及其渲染上下文，然后打开流并发出 `Connecting`。
    /// 初始化失败不会作为返回值：而是表现为 `StreamState::Error`（不重试）；解码器无法播放的定位符同样如此。
    /// 只有空定位符、重复 attach、关闭后 attach 才返回错误，且不改变任何状态。
    ///
    /// #### 参数
    /// - `locator`：不透明的流定位符（传输 URL 或路径，可能内嵌凭据）。
    pub fn attach(&self, locator: &str) -> Result<(), BridgeError> {
        if self.signals.shutdown.is_requested() {
            return Err(BridgeError::ShutDown);
        }
        let stream = locator::validate_locator(locator)?;

        let started = {
            let guard = self.lock.lock();
            let mut resources = guard.borrow_mut();
            if resources.phase != LifecyclePhase::Uninitialized {
                return Err(BridgeError::AlreadyAttached);
            }
            resources.phase = LifecyclePhase::Attached;
            self.start_locked(&mut resources, stream)
        };

        self.state.bind_owner_thread();
        tracing::info!(
            surface = self.id,
            stream = %locator::redacted(stream),
            "render bridge attached"
        );
        self.state.set(StreamState::Connecting);

        if let Err(err) = started {
            tracing::error!(surface = self.id, error = %err, "stream initialization failed");
            self.state.set(StreamState::Error(err.to_string()));
        }
        Ok(())
    }

    fn start_locked(
        &self,
        resources: &mut BridgeResources,
        locator: &str,
    ) -> Result<(), BridgeError> {
        let mut gpu = match self.services.gpu_factory.create() {
            Ok(gpu) => gpu,
            Err(err) => {
                resources.render_inert = true;
                return Err(err.into());
            }
        };
        if let Err(err) = resources.pipeline.build(gpu.as_mut()) {
            resources.render_inert = true;
            return Err(err.into());
        }
        resources.gpu = Some(gpu);

        let decoder = DecoderHandle::create(
            self.services.decoder_factory.as_ref(),
            &self.config,
            self.id,
        )?;
        let decoder = resources.decoder.insert(decoder);
        decoder.set_wakeup_callback(self.wakeup_callback())?;

        let mut render_context = decoder.create_render_context()?;
        render_context.set_update_callback(Some(self.render_ready_callback()));
        resources.render_context = Some(render_context);

        decoder.open(locator)?;
        Ok(())
    }

    /// ### English
    /// Wake-up callback (engine event thread): coalesces and marshals event draining to the UI
    /// thread.
    ///
    /// ### 中文
    /// wake-up 回调（引擎事件线程）：合并后将事件 drain 投递到 UI 线程。
    fn wakeup_callback(&self) -> Box<NotifyFn> {
        let signals = self.signals.clone();
        let this = self.this.clone();
        let main_thread = self.services.main_thread.clone();
        let surface = self.id;
        Box::new(move || {
            if signals.shutdown.is_requested() {
                tracing::trace!(surface, "wake-up after shutdown request ignored");
                return;
            }
            if signals.wakeup_pending.swap(true, Ordering::AcqRel) {
                return;
            }
            let this = this.clone();
            main_thread.post(Box::new(move || {
                if let Some(bridge) = this.upgrade() {
                    bridge.drain_decoder_events();
                }
            }));
        })
    }

    /// ### English
    /// Render-ready callback (engine render thread): renders under the bridge lock.
    ///
    /// ### 中文
    /// render-ready 回调（引擎渲染线程）：持渲染桥锁进行渲染。
    fn render_ready_callback(&self) -> Box<NotifyFn> {
        let signals = self.signals.clone();
        let this = self.this.clone();
        let surface = self.id;
        Box::new(move || {
            if signals.shutdown.is_requested() {
                tracing::trace!(surface, "render-ready after shutdown request ignored");
                return;
            }
            if let Some(bridge) = this.upgrade() {
                bridge.render();
            }
        })
    }

    /// ### English
    /// Pauses playback (tile hidden). No-op when already paused, before attach, after shutdown or
    /// while the stream is `Idle`/`Error`.
    ///
    /// ### 中文
    /// 暂停播放（tile 被隐藏）。已暂停、attach 之前、关闭之后或流处于 `Idle`/`Error` 时为 no-op。
    pub fn pause(&self) {
        self.set_paused(true);
    }

    /// ### English
    /// Resumes playback (tile visible again). Same no-op rules as `pause`.
    ///
    /// ### 中文
    /// 恢复播放（tile 重新可见）。no-op 规则与 `pause` 相同。
    pub fn resume(&self) {
        self.set_paused(false);
    }

    fn set_paused(&self, paused: bool) {
        if self.signals.shutdown.is_requested() {
            return;
        }
        let state = self.state.get();
        if matches!(state, StreamState::Idle | StreamState::Error(_)) {
            tracing::debug!(surface = self.id, ?state, paused, "playback command ignored");
            return;
        }

        let guard = self.lock.lock();
        let mut resources = guard.borrow_mut();
        let next = match (resources.phase, paused) {
            (LifecyclePhase::Attached | LifecyclePhase::Active, true) => LifecyclePhase::Paused,
            (LifecyclePhase::Paused, false) => LifecyclePhase::Active,
            (LifecyclePhase::Attached, false) => {
                resources.phase = LifecyclePhase::Active;
                return;
            }
            _ => return,
        };

        if let Some(decoder) = resources.decoder.as_mut() {
            decoder.set_pause(paused);
        }
        resources.phase = next;
        tracing::debug!(surface = self.id, phase = ?next, "playback phase changed");
    }

    /// ### English
    /// Stops the stream explicitly; the state becomes `Idle`. The bridge stays attached until
    /// shutdown.
    ///
    /// ### 中文
    /// 显式停止流；状态变为 `Idle`。渲染桥在关闭前仍保持 attach。
    pub fn stop(&self) {
        if self.signals.shutdown.is_requested() {
            return;
        }
        {
            let guard = self.lock.lock();
            let mut resources = guard.borrow_mut();
            if !resources.phase.accepts_playback_commands() {
                return;
            }
            if let Some(decoder) = resources.decoder.as_mut() {
                decoder.stop();
            }
        }
        tracing::info!(surface = self.id, "stream stopped");
        self.state.set(StreamState::Idle);
    }
}

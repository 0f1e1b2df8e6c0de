//! ### English
//! Render path: decoder paints into the Frame Buffer, which is uploaded into the texture.
//!
//! ### 中文
//! 渲染路径：解码器绘制到帧缓冲，再上传到纹理。

use std::sync::atomic::Ordering;

use crate::engine::error::GpuError;
use crate::engine::frame::FrameBuffer;
use crate::engine::state::StreamState;

use super::{BridgeResources, RenderBridge};

enum RenderOutcome {
    Uploaded,
    Skipped,
    GpuFailed(GpuError),
}

impl RenderBridge {
    /// ### English
    /// Renders the current video frame at the live surface size and requests a redraw.
    ///
    /// Called on the decoder's render-ready thread. Never draws directly; the display link decides
    /// when `draw` runs.
    ///
    /// ### 中文
    /// 以实时 surface 尺寸渲染当前视频帧并请求重绘。
    ///
    /// 在解码器的 render-ready 线程调用；从不直接绘制，由 display link 决定 `draw` 何时执行。
    pub fn render(&self) {
        if self.signals.shutdown.is_requested() {
            return;
        }

        let guard = self.lock.lock();
        if self.signals.shutdown.is_completed() {
            return;
        }
        let outcome = {
            let Ok(mut resources) = guard.try_borrow_mut() else {
                tracing::trace!(surface = self.id, "re-entrant render skipped");
                return;
            };
            if resources.render_inert {
                return;
            }
            self.render_locked(&mut resources)
        };
        if self.signals.teardown_deferred.load(Ordering::Acquire) {
            drop(guard);
            self.finish_deferred_teardown();
            return;
        }

        match outcome {
            RenderOutcome::Uploaded => {
                self.request_redraw();
                if !self.signals.first_frame_reported.swap(true, Ordering::AcqRel) {
                    tracing::debug!(surface = self.id, "first frame uploaded");
                    self.post_to_main_thread(|bridge| {
                        bridge
                            .state
                            .transition(&StreamState::Connecting, StreamState::Playing);
                    });
                }
            }
            RenderOutcome::Skipped => {}
            RenderOutcome::GpuFailed(err) => {
                tracing::error!(surface = self.id, error = %err, "render path disabled");
                let message = format!("GPU resource failure: {err}");
                self.post_to_main_thread(move |bridge| {
                    bridge.state.set(StreamState::Error(message));
                });
                self.request_redraw();
            }
        }
        drop(guard);
        self.finish_deferred_teardown();
    }

    fn render_locked(&self, resources: &mut BridgeResources) -> RenderOutcome {
        let size = self.metrics.pixel_size();
        if size.width == 0 || size.height == 0 {
            return RenderOutcome::Skipped;
        }
        let (Some(context), Some(gpu)) =
            (resources.render_context.as_mut(), resources.gpu.as_mut())
        else {
            return RenderOutcome::Skipped;
        };

        let frame_due = context.frame_ready();
        if !frame_due && resources.uploader.texture_size() == Some(size) {
            return RenderOutcome::Skipped;
        }

        let frame = resources.frame.get_or_insert_with(FrameBuffer::new);
        if frame.ensure(size) {
            tracing::debug!(
                surface = self.id,
                width = size.width,
                height = size.height,
                capacity = frame.capacity(),
                "frame buffer grown"
            );
        }

        if let Err(err) = context.render(frame) {
            tracing::warn!(surface = self.id, error = %err, "decoder render failed");
            return RenderOutcome::Skipped;
        }

        match resources.uploader.upload(gpu.as_mut(), frame) {
            Ok(()) => RenderOutcome::Uploaded,
            Err(err) => {
                resources.render_inert = true;
                RenderOutcome::GpuFailed(err)
            }
        }
    }

    /// ### English
    /// Schedules one `draw` on the display link. Requests made while one is outstanding coalesce.
    ///
    /// Must not be called with the resources borrowed: the link may run `draw` synchronously.
    ///
    /// ### 中文
    /// 在 display link 上调度一次 `draw`；已有未执行的请求时会合并。
    ///
    /// 调用时不得持有资源借用：display link 可能同步执行 `draw`。
    pub(crate) fn request_redraw(&self) {
        if self.signals.redraw_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        let this = self.this.clone();
        self.services.display.schedule(Box::new(move || {
            if let Some(bridge) = this.upgrade() {
                bridge.draw();
            }
        }));
    }
}

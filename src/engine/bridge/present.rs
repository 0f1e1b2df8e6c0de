//! ### English
//! Presentation path (display thread) and renderable surface queries.
//!
//! ### 中文
//! 呈现路径（显示线程）与可渲染 surface 查询。

use std::sync::atomic::Ordering;

use crate::engine::rendering::{DrawOutcome, PresentedFrame};

use super::RenderBridge;

impl RenderBridge {
    /// ### English
    /// Draws the current texture over the whole surface, or clears it when no texture exists yet.
    ///
    /// Invoked by the display link only. Returns `Skipped` after shutdown, when the GPU backend
    /// is gone, or when re-entered while the resources are borrowed.
    ///
    /// ### 中文
    /// 将当前纹理绘制到整个 surface；若尚无纹理则清空 surface。
    ///
    /// 只由 display link 调用。关闭之后、GPU 后端不存在、或在资源被借用时重入，返回 `Skipped`。
    pub fn draw(&self) -> DrawOutcome {
        self.signals.redraw_pending.store(false, Ordering::Release);

        let guard = self.lock.lock();
        if self.signals.shutdown.is_completed() {
            return DrawOutcome::Skipped;
        }
        let outcome = {
            let Ok(mut resources) = guard.try_borrow_mut() else {
                tracing::trace!(surface = self.id, "re-entrant draw skipped");
                return DrawOutcome::Skipped;
            };

            let size = self.metrics.pixel_size();
            let resources = &mut *resources;
            match resources.gpu.as_mut() {
                Some(gpu) => resources
                    .pipeline
                    .draw(gpu.as_mut(), size, resources.uploader.texture()),
                None => DrawOutcome::Skipped,
            }
        };
        drop(guard);

        self.finish_deferred_teardown();
        outcome
    }

    /// ### English
    /// Last presented surface (texture id, producer fence, size), or `None` before the first draw
    /// and after shutdown.
    ///
    /// ### 中文
    /// 最近一次呈现的 surface（纹理 id、生产者 fence、尺寸）；首次绘制前与关闭后为 `None`。
    pub fn presented_frame(&self) -> Option<PresentedFrame> {
        let guard = self.lock.lock();
        if self.signals.shutdown.is_completed() {
            return None;
        }
        let resources = guard.try_borrow().ok()?;
        resources.gpu.as_ref()?.presented_frame()
    }

    /// ### English
    /// GL texture id of the renderable surface, or `0` when there is none.
    ///
    /// ### 中文
    /// 可渲染 surface 的 GL 纹理 id；不存在时为 `0`。
    pub fn texture_id(&self) -> u32 {
        self.presented_frame()
            .map(|frame| frame.texture_id)
            .unwrap_or(0)
    }
}

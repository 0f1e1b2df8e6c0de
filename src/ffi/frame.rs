//! ### English
//! C ABI bindings for the renderable surface (display thread).
//!
//! ### 中文
//! 可渲染 surface 相关的 C ABI 绑定（显示线程）。

use super::{CamviewBridgeFrame, CamviewBridgeSurface};
use crate::engine::PresentedFrame;

impl From<PresentedFrame> for CamviewBridgeFrame {
    fn from(value: PresentedFrame) -> Self {
        Self {
            texture_id: value.texture_id,
            fence: value.fence,
            width: value.size.width,
            height: value.size.height,
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Returns the GL texture id of the surface's colour target, or `0` before the first draw.
///
/// ### 中文
/// 返回 surface 颜色目标的 GL 纹理 id；首次绘制前返回 `0`。
pub unsafe extern "C" fn camview_bridge_surface_texture_id(
    surface: *mut CamviewBridgeSurface,
) -> u32 {
    if surface.is_null() {
        return 0;
    }
    unsafe { (*surface).surface.surface_texture_id() }
}

#[unsafe(no_mangle)]
/// ### English
/// Writes the last presented frame (texture, producer fence, size) into `out_frame`.
///
/// Returns `false` (and leaves `out_frame` untouched) before the first draw or after shutdown.
///
/// The returned fence lives until the surface's next draw, which deletes it on the display
/// thread. Wait on it from the display thread (e.g. right after `camview_bridge_runtime_tick`),
/// or complete a wait from another thread before the next tick. Never delete it. Surfaces created
/// with `CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW` draw on the decoder's render thread instead, so
/// their fence may be deleted at any time after this call returns.
///
/// ### 中文
/// 将最近一次呈现的帧（纹理、生产者 fence、尺寸）写入 `out_frame`。
///
/// 首次绘制之前或关闭之后返回 `false`（且不修改 `out_frame`）。
///
/// 返回的 fence 存活到 surface 的下一次绘制为止，届时会在显示线程上被删除。请在显示线程上等待它
/// （例如紧接 `camview_bridge_runtime_tick` 之后），或从其他线程等待并在下一次 tick 之前完成。
/// 不要自行删除。使用 `CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW` 创建的 surface 改在解码器渲染线程上绘制，
/// 因此其 fence 在本函数返回后随时可能被删除。
pub unsafe extern "C" fn camview_bridge_surface_acquire_frame(
    surface: *mut CamviewBridgeSurface,
    out_frame: *mut CamviewBridgeFrame,
) -> bool {
    if surface.is_null() || out_frame.is_null() {
        return false;
    }
    let Some(frame) = (unsafe { (*surface).surface.surface_frame() }) else {
        return false;
    };

    unsafe {
        *out_frame = frame.into();
    }
    true
}

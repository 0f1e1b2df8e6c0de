//! ### English
//! C ABI bindings for camera surfaces (create/destroy/visibility/metrics/state).
//!
//! ### 中文
//! 摄像头 surface 相关的 C ABI 绑定（create/destroy/可见性/度量/状态）。

use std::ffi::c_char;

use dpi::LogicalSize;

use super::{CamviewBridgeRuntime, CamviewBridgeSurface};
use crate::engine::{BridgeConfig, StreamState};

#[unsafe(no_mangle)]
/// ### English
/// Creates one camera surface and attaches it to `locator` (UI thread).
///
/// `width`/`height` are the logical tile size; `scale_factor` the display pixel density.
/// `flags` is a bitmask of `CAMVIEW_SURFACE_FLAG_*`.
///
/// Returns NULL for a NULL runtime, an empty locator or a non UTF-8 string. Decoder or GPU
/// initialization failures, and locators the decoder cannot play, still return a surface whose
/// state is (or becomes) `3` (error).
///
/// ### 中文
/// 创建一个摄像头 surface 并 attach 到 `locator`（UI 线程）。
///
/// `width`/`height` 为 tile 的逻辑尺寸；`scale_factor` 为显示像素密度。
/// `flags` 为 `CAMVIEW_SURFACE_FLAG_*` 组成的位掩码。
///
/// runtime 为 NULL、定位符为空或字符串不是 UTF-8 时返回 NULL。解码器或 GPU 初始化失败，
/// 以及解码器无法播放的定位符，仍返回 surface，但其状态为（或随后变为）`3`（error）。
pub unsafe extern "C" fn camview_bridge_surface_create(
    runtime: *mut CamviewBridgeRuntime,
    locator: *const c_char,
    width: u32,
    height: u32,
    scale_factor: f64,
    flags: u32,
) -> *mut CamviewBridgeSurface {
    if runtime.is_null() {
        return std::ptr::null_mut();
    }
    let Some(locator) = (unsafe { super::cstr_to_str(locator) }) else {
        return std::ptr::null_mut();
    };

    let config = BridgeConfig::from_flags(flags);
    let created = unsafe {
        (*runtime).runtime.create_surface(
            locator,
            config,
            LogicalSize::new(width, height),
            scale_factor,
        )
    };
    match created {
        Ok(surface) => Box::into_raw(Box::new(CamviewBridgeSurface { surface })),
        Err(err) => {
            tracing::warn!(error = %err, "surface creation rejected");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Shuts the surface down and frees the handle (UI thread).
///
/// ### 中文
/// 关闭 surface 并释放句柄（UI 线程）。
pub unsafe extern "C" fn camview_bridge_surface_destroy(surface: *mut CamviewBridgeSurface) {
    if surface.is_null() {
        return;
    }
    let surface = unsafe { Box::from_raw(surface) };
    surface.surface.destroy();
}

#[unsafe(no_mangle)]
/// ### English
/// Tile visibility: visible surfaces play, hidden surfaces pause.
///
/// ### 中文
/// tile 可见性：可见时播放，隐藏时暂停。
pub unsafe extern "C" fn camview_bridge_surface_set_visible(
    surface: *mut CamviewBridgeSurface,
    visible: u8,
) {
    if surface.is_null() {
        return;
    }
    unsafe { (*surface).surface.set_visible(visible != 0) };
}

#[unsafe(no_mangle)]
/// ### English
/// Updates the live logical tile size and scale factor.
///
/// ### 中文
/// 更新实时的 tile 逻辑尺寸与缩放因子。
pub unsafe extern "C" fn camview_bridge_surface_set_metrics(
    surface: *mut CamviewBridgeSurface,
    width: u32,
    height: u32,
    scale_factor: f64,
) {
    if surface.is_null() {
        return;
    }
    unsafe {
        (*surface)
            .surface
            .set_metrics(LogicalSize::new(width, height), scale_factor)
    };
}

#[unsafe(no_mangle)]
/// ### English
/// Stops the stream; the state becomes idle.
///
/// ### 中文
/// 停止流；状态变为 idle。
pub unsafe extern "C" fn camview_bridge_surface_stop(surface: *mut CamviewBridgeSurface) {
    if surface.is_null() {
        return;
    }
    unsafe { (*surface).surface.stop() };
}

#[unsafe(no_mangle)]
/// ### English
/// Returns the stream state: `0` idle, `1` connecting, `2` playing, `3` error.
///
/// ### 中文
/// 返回流状态：`0` idle、`1` connecting、`2` playing、`3` error。
pub unsafe extern "C" fn camview_bridge_surface_state(surface: *mut CamviewBridgeSurface) -> u32 {
    if surface.is_null() {
        return StreamState::Idle.code();
    }
    unsafe { (*surface).surface.stream_state().code() }
}

#[unsafe(no_mangle)]
/// ### English
/// Copies the error diagnostic (NUL-terminated, truncated to `capacity`) into `buffer`.
///
/// Returns the full message length in bytes without the NUL, or `0` when the stream is not in
/// the error state. Pass a NULL `buffer` to query the length only.
///
/// ### 中文
/// 将错误诊断信息（NUL 结尾，按 `capacity` 截断）复制到 `buffer`。
///
/// 返回完整消息的字节长度（不含 NUL）；流不处于错误状态时返回 `0`。
/// `buffer` 传 NULL 时只查询长度。
pub unsafe extern "C" fn camview_bridge_surface_error_message(
    surface: *mut CamviewBridgeSurface,
    buffer: *mut c_char,
    capacity: usize,
) -> usize {
    if surface.is_null() {
        return 0;
    }
    let StreamState::Error(message) = (unsafe { (*surface).surface.stream_state() }) else {
        return 0;
    };

    let bytes = message.as_bytes();
    if !buffer.is_null() && capacity > 0 {
        let copied = bytes.len().min(capacity - 1);
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer.cast::<u8>(), copied);
            *buffer.add(copied) = 0;
        }
    }
    bytes.len()
}

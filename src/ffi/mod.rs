//! ### English
//! C ABI surface for `camview_bridge`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//! Strings passed by the embedder must be NUL-terminated UTF-8 (C string); they are validated as
//! UTF-8 and truncated at the first NUL byte.
//!
//! Threading: runtime/surface creation, destruction, `pump`, visibility and metrics calls belong
//! to the UI thread (the thread that owns the GLFW context). `tick`, `texture_id` and
//! `acquire_frame` belong to the display thread.
//!
//! ### 中文
//! `camview_bridge` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//! 宿主传入的字符串必须是以 NUL 结尾的 UTF-8（C 字符串）；Rust 会校验 UTF-8，
//! 且在遇到第一个 NUL 字节处截断。
//!
//! 线程约定：runtime/surface 的创建与销毁、`pump`、可见性与度量调用属于 UI 线程
//! （持有 GLFW 上下文的线程）。`tick`、`texture_id` 与 `acquire_frame` 属于显示线程。
mod abi;
mod frame;
mod runtime;
mod surface;

use std::ffi::{CStr, c_char};
use std::path::PathBuf;

use crate::engine::{BridgeRuntime, SurfaceAdapter};

/// ### English
/// Opaque runtime handle.
///
/// ### 中文
/// 不透明的运行时句柄。
pub struct CamviewBridgeRuntime {
    runtime: BridgeRuntime,
}

/// ### English
/// Opaque surface handle (one per camera tile).
///
/// ### 中文
/// 不透明的 surface 句柄（每个摄像头 tile 一个）。
pub struct CamviewBridgeSurface {
    surface: SurfaceAdapter,
}

#[repr(C)]
/// ### English
/// Last presented surface content returned to the embedder (display thread).
///
/// ### 中文
/// 返回给宿主（显示线程）的最近一次呈现内容。
pub struct CamviewBridgeFrame {
    /// ### English
    /// GL texture ID of the surface's colour target.
    ///
    /// ### 中文
    /// surface 颜色目标的 GL 纹理 ID。
    pub texture_id: u32,
    /// ### English
    /// Producer fence handle (`GLsync` cast to `u64`), or 0 if unavailable.
    ///
    /// Ownership: the sync object is owned by Rust. The next draw of the surface deletes it on
    /// the display thread, so a wait from another thread must complete before the next
    /// `camview_bridge_runtime_tick`. The embedder must NOT delete it.
    ///
    /// ### 中文
    /// 生产者 fence 句柄（`GLsync` 转为 `u64`），不可用则为 0。
    ///
    /// 所有权：该 sync 对象由 Rust 持有。surface 的下一次绘制会在显示线程上删除它，
    /// 因此从其他线程等待时必须在下一次 `camview_bridge_runtime_tick` 之前完成。宿主不要自行删除。
    pub fence: u64,
    pub width: u32,
    pub height: u32,
}

/// ### English
/// C ABI version for `camview_bridge`.
///
/// ### 中文
/// `camview_bridge` 的 C ABI 版本号。
const CAMVIEW_BRIDGE_ABI_VERSION: u32 = 1;

/// ### English
/// Reads a required NUL-terminated UTF-8 string.
///
/// ### 中文
/// 读取必填的 NUL 结尾 UTF-8 字符串。
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

unsafe fn cstr_to_path(ptr: *const c_char) -> Option<PathBuf> {
    let value = unsafe { cstr_to_str(ptr) }?;
    if value.is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

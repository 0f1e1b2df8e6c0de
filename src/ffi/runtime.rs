//! ### English
//! C ABI bindings for the runtime lifecycle (create/destroy/pump/tick).
//!
//! ### 中文
//! 运行时生命周期相关的 C ABI 绑定（create/destroy/pump/tick）。

use std::ffi::{c_char, c_void};

use super::CamviewBridgeRuntime;
use crate::engine::BridgeRuntime;
use crate::engine::glfw::GlfwWindowPtr;

#[unsafe(no_mangle)]
/// ### English
/// Creates a runtime bound to the embedder's GLFW OpenGL context, decoding with libmpv.
///
/// `libmpv_path` is an optional NUL-terminated UTF-8 path; NULL or an empty string means
/// "use the platform's default library names". Returns NULL on failure (details are logged).
///
/// ### 中文
/// 创建绑定到宿主 GLFW OpenGL 上下文、使用 libmpv 解码的运行时。
///
/// `libmpv_path` 为可选的 NUL 结尾 UTF-8 路径；传入 NULL 或空字符串表示“使用平台默认库名”。
/// 失败时返回 NULL（详情写入日志）。
pub unsafe extern "C" fn camview_bridge_runtime_create(
    glfw_shared_window: *mut c_void,
    libmpv_path: *const c_char,
) -> *mut CamviewBridgeRuntime {
    if glfw_shared_window.is_null() {
        return std::ptr::null_mut();
    }

    let libmpv_path = unsafe { super::cstr_to_path(libmpv_path) };
    let runtime = match BridgeRuntime::with_glfw_mpv(
        glfw_shared_window as GlfwWindowPtr,
        libmpv_path.as_deref(),
    ) {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "failed to create bridge runtime");
            return std::ptr::null_mut();
        }
    };

    Box::into_raw(Box::new(CamviewBridgeRuntime { runtime }))
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a runtime created by `camview_bridge_runtime_create`.
///
/// Destroy every surface first; surfaces must not outlive their runtime.
///
/// ### 中文
/// 销毁由 `camview_bridge_runtime_create` 创建的运行时。
///
/// 请先销毁所有 surface；surface 不得比其运行时存活更久。
pub unsafe extern "C" fn camview_bridge_runtime_destroy(runtime: *mut CamviewBridgeRuntime) {
    if runtime.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(runtime));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Runs tasks marshalled to the UI thread. Call once per UI loop iteration.
///
/// Returns the number of executed tasks.
///
/// ### 中文
/// 执行投递到 UI 线程的任务；每次 UI 循环调用一次。
///
/// 返回执行的任务数量。
pub unsafe extern "C" fn camview_bridge_runtime_pump(runtime: *mut CamviewBridgeRuntime) -> u32 {
    if runtime.is_null() {
        return 0;
    }
    unsafe { (*runtime).runtime.pump() as u32 }
}

#[unsafe(no_mangle)]
/// ### English
/// Runs pending redraws (embedder vsync). Call on the display thread.
///
/// ### 中文
/// 执行待处理的重绘（宿主 vsync）；在显示线程调用。
pub unsafe extern "C" fn camview_bridge_runtime_tick(runtime: *mut CamviewBridgeRuntime) -> u32 {
    if runtime.is_null() {
        return 0;
    }
    unsafe { (*runtime).runtime.tick() as u32 }
}

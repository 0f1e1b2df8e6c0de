//! ### English
//! Per-surface offscreen GL context sharing objects with the embedder's context.
//!
//! ### 中文
//! 与宿主上下文共享对象的每 surface 离屏 GL 上下文。

use std::sync::Arc;

use glow::HasContext as _;

use crate::engine::error::GpuError;
use crate::engine::glfw::{GlfwWindowPtr, LoadedGlfwApi};

pub(super) fn parse_gl_version(version: &str) -> (u32, u32) {
    // Expected forms: `"4.6.0 ..."` or `"OpenGL ES 3.2 ..."`.
    let mut major = 0u32;
    let mut minor = 0u32;
    let number_token = version
        .split_whitespace()
        .find(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()));
    if let Some(token) = number_token {
        let mut parts = token.split('.');
        if let Some(m) = parts.next().and_then(|s| s.parse::<u32>().ok()) {
            major = m;
        }
        if let Some(n) = parts.next().and_then(|s| s.parse::<u32>().ok()) {
            minor = n;
        }
    }
    (major, minor)
}

/// ### English
/// Owns one offscreen GLFW window/context and the glow function table loaded for it.
///
/// The context is only current inside `with_current`; the previously current context of the
/// calling thread is restored afterwards, so the embedder's own context is left untouched.
///
/// ### 中文
/// 持有一个离屏 GLFW window/context 以及为其加载的 glow 函数表。
///
/// 该上下文只在 `with_current` 内部为 current；之后会恢复调用线程原先的 current 上下文，
/// 因此不会影响宿主自己的上下文。
pub(super) struct SharedGlContext {
    glfw: Arc<LoadedGlfwApi>,
    window: GlfwWindowPtr,
    gl: glow::Context,
    is_gles: bool,
}

impl SharedGlContext {
    /// ### English
    /// Creates an offscreen context sharing objects with `share_window`.
    /// Must be called on the UI thread (GLFW window creation rule).
    ///
    /// ### 中文
    /// 创建与 `share_window` 共享对象的离屏上下文。
    /// 必须在 UI 线程调用（GLFW 的窗口创建规则）。
    pub(super) fn new(glfw: Arc<LoadedGlfwApi>, share_window: GlfwWindowPtr) -> Result<Self, GpuError> {
        let window = unsafe { glfw.create_shared_offscreen_window(share_window)? };

        let previous = unsafe { glfw.current_context() };
        unsafe { glfw.make_current(window) };
        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| glfw.get_proc_address(name))
        };
        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        unsafe { glfw.make_current(previous) };

        let is_gles = version.starts_with("OpenGL ES");
        let (major, minor) = parse_gl_version(&version);
        tracing::debug!(%version, major, minor, is_gles, "offscreen GL context created");

        let supported = if is_gles { major >= 3 } else { (major, minor) >= (3, 3) };
        if !supported {
            unsafe { glfw.destroy_window(window) };
            return Err(GpuError::Context(format!(
                "OpenGL 3.3 / GLES 3.0 required, found `{version}`"
            )));
        }

        Ok(Self {
            glfw,
            window,
            gl,
            is_gles,
        })
    }

    pub(super) fn is_gles(&self) -> bool {
        self.is_gles
    }

    /// ### English
    /// Runs `f` with this context current on the calling thread, then restores the previous one.
    ///
    /// ### 中文
    /// 在调用线程上使该上下文为 current 并执行 `f`，之后恢复原先的上下文。
    pub(super) fn with_current<R>(&self, f: impl FnOnce(&glow::Context) -> R) -> R {
        let previous = unsafe { self.glfw.current_context() };
        if previous != self.window {
            unsafe { self.glfw.make_current(self.window) };
        }
        let result = f(&self.gl);
        if previous != self.window {
            unsafe { self.glfw.make_current(previous) };
        }
        result
    }
}

impl Drop for SharedGlContext {
    fn drop(&mut self) {
        unsafe {
            if self.glfw.current_context() == self.window {
                self.glfw.make_current(std::ptr::null_mut());
            }
            self.glfw.destroy_window(self.window);
        }
    }
}

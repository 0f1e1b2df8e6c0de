//! ### English
//! Minimal GLFW dynamic loader.
//! Used to create per-surface offscreen OpenGL contexts that share objects with the embedder's
//! context.
//!
//! ### 中文
//! 最小化的 GLFW 动态加载器。
//! 用于创建与宿主上下文共享对象的每 surface 离屏 OpenGL 上下文。

use std::ffi::{CStr, c_char, c_int, c_void};

use libloading::Library;

use crate::engine::error::GpuError;

#[repr(C)]
pub struct GLFWwindow {
    _private: [u8; 0],
}

#[repr(C)]
pub struct GLFWmonitor {
    _private: [u8; 0],
}

pub type GlfwWindowPtr = *mut GLFWwindow;

type GLFWglproc = *const c_void;
type GlfwGetProcAddress = unsafe extern "C" fn(*const c_char) -> GLFWglproc;
type GlfwMakeContextCurrent = unsafe extern "C" fn(*mut GLFWwindow);
type GlfwGetCurrentContext = unsafe extern "C" fn() -> *mut GLFWwindow;
type GlfwDefaultWindowHints = unsafe extern "C" fn();
type GlfwWindowHint = unsafe extern "C" fn(c_int, c_int);
type GlfwGetWindowAttrib = unsafe extern "C" fn(*mut GLFWwindow, c_int) -> c_int;
type GlfwCreateWindow = unsafe extern "C" fn(
    c_int,
    c_int,
    *const c_char,
    *mut GLFWmonitor,
    *mut GLFWwindow,
) -> *mut GLFWwindow;
type GlfwDestroyWindow = unsafe extern "C" fn(*mut GLFWwindow);

#[cfg(target_os = "windows")]
const LIBRARY_NAMES: &[&str] = &["glfw3.dll", "glfw.dll"];
#[cfg(target_os = "macos")]
const LIBRARY_NAMES: &[&str] = &["libglfw.3.dylib", "libglfw.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const LIBRARY_NAMES: &[&str] = &["libglfw.so.3", "libglfw.so"];

pub struct LoadedGlfwApi {
    /// ### English
    /// Keeps the GLFW module loaded (the embedder normally loaded it already).
    ///
    /// ### 中文
    /// 保持 GLFW 模块已加载（通常宿主已经加载过）。
    _lib: Library,
    /// ### English
    /// Function pointer: `glfwGetProcAddress`.
    ///
    /// ### 中文
    /// 函数指针：`glfwGetProcAddress`。
    glfw_get_proc_address: GlfwGetProcAddress,
    /// ### English
    /// Function pointer: `glfwMakeContextCurrent`.
    ///
    /// ### 中文
    /// 函数指针：`glfwMakeContextCurrent`。
    glfw_make_context_current: GlfwMakeContextCurrent,
    /// ### English
    /// Function pointer: `glfwGetCurrentContext`.
    ///
    /// ### 中文
    /// 函数指针：`glfwGetCurrentContext`。
    glfw_get_current_context: GlfwGetCurrentContext,
    glfw_default_window_hints: GlfwDefaultWindowHints,
    glfw_window_hint: GlfwWindowHint,
    glfw_get_window_attrib: GlfwGetWindowAttrib,
    glfw_create_window: GlfwCreateWindow,
    glfw_destroy_window: GlfwDestroyWindow,
}

// SAFETY: plain function pointers into a library kept alive by `_lib`. GLFW's own threading rules
// (window creation/destruction on the main thread) are upheld by the callers.
unsafe impl Send for LoadedGlfwApi {}
unsafe impl Sync for LoadedGlfwApi {}

unsafe fn get_symbol<T: Copy>(lib: &Library, name: &CStr) -> Result<T, GpuError> {
    let symbol = unsafe { lib.get::<T>(name.to_bytes_with_nul()) }.map_err(|err| {
        GpuError::Context(format!("{} not found: {err}", name.to_string_lossy()))
    })?;
    Ok(*symbol)
}

impl LoadedGlfwApi {
    /// ### English
    /// Loads the minimal subset of GLFW symbols required by this crate.
    ///
    /// The embedder is expected to have already loaded GLFW; loading the same module again only
    /// bumps its reference count.
    ///
    /// ### 中文
    /// 加载本 crate 所需的最小 GLFW 符号集合。
    ///
    /// 宿主通常已加载 GLFW；再次加载同一模块只会增加其引用计数。
    pub fn load() -> Result<Self, GpuError> {
        let mut last_error = String::new();
        let lib = LIBRARY_NAMES
            .iter()
            .find_map(|name| match unsafe { Library::new(name) } {
                Ok(lib) => Some(lib),
                Err(err) => {
                    last_error = format!("{name}: {err}");
                    None
                }
            })
            .ok_or_else(|| {
                GpuError::Context(format!(
                    "failed to load GLFW ({last_error}); ensure GLFW is loaded by the embedder"
                ))
            })?;

        unsafe {
            Ok(Self {
                glfw_get_proc_address: get_symbol(&lib, c"glfwGetProcAddress")?,
                glfw_make_context_current: get_symbol(&lib, c"glfwMakeContextCurrent")?,
                glfw_get_current_context: get_symbol(&lib, c"glfwGetCurrentContext")?,
                glfw_default_window_hints: get_symbol(&lib, c"glfwDefaultWindowHints")?,
                glfw_window_hint: get_symbol(&lib, c"glfwWindowHint")?,
                glfw_get_window_attrib: get_symbol(&lib, c"glfwGetWindowAttrib")?,
                glfw_create_window: get_symbol(&lib, c"glfwCreateWindow")?,
                glfw_destroy_window: get_symbol(&lib, c"glfwDestroyWindow")?,
                _lib: lib,
            })
        }
    }

    /// ### English
    /// Makes `window` current on the calling thread (NULL releases the current context).
    ///
    /// ### 中文
    /// 将 `window` 设置为调用线程的 current 上下文（NULL 表示释放当前上下文）。
    pub unsafe fn make_current(&self, window: GlfwWindowPtr) {
        unsafe { (self.glfw_make_context_current)(window) };
    }

    pub unsafe fn current_context(&self) -> GlfwWindowPtr {
        unsafe { (self.glfw_get_current_context)() }
    }

    /// ### English
    /// Loads an OpenGL function pointer via GLFW (requires a current context).
    ///
    /// ### 中文
    /// 通过 GLFW 加载 OpenGL 函数指针（需要有 current 上下文）。
    pub unsafe fn get_proc_address(&self, name: &CStr) -> *const c_void {
        unsafe { (self.glfw_get_proc_address)(name.as_ptr()) }
    }

    pub unsafe fn destroy_window(&self, window: GlfwWindowPtr) {
        unsafe { (self.glfw_destroy_window)(window) };
    }

    /// ### English
    /// Creates an invisible 1x1 offscreen window whose GL context shares objects with `share`,
    /// mirroring the shared context's API, version and profile.
    ///
    /// Must be called on the thread that initialized GLFW (the UI thread).
    ///
    /// ### 中文
    /// 创建一个不可见的 1x1 离屏 window，其 GL 上下文与 `share` 共享对象，
    /// 并沿用共享上下文的 API、版本与 profile。
    ///
    /// 必须在初始化 GLFW 的线程（UI 线程）上调用。
    pub unsafe fn create_shared_offscreen_window(
        &self,
        share: GlfwWindowPtr,
    ) -> Result<GlfwWindowPtr, GpuError> {
        const GLFW_FALSE: c_int = 0;

        const GLFW_VISIBLE: c_int = 0x0002_0004;
        const GLFW_FOCUSED: c_int = 0x0002_0001;
        const GLFW_RESIZABLE: c_int = 0x0002_0003;

        const GLFW_CLIENT_API: c_int = 0x0002_2001;
        const GLFW_CONTEXT_VERSION_MAJOR: c_int = 0x0002_2002;
        const GLFW_CONTEXT_VERSION_MINOR: c_int = 0x0002_2003;
        const GLFW_OPENGL_FORWARD_COMPAT: c_int = 0x0002_2006;
        const GLFW_OPENGL_PROFILE: c_int = 0x0002_2008;
        const GLFW_CONTEXT_CREATION_API: c_int = 0x0002_200B;

        let attrib = |name| unsafe { (self.glfw_get_window_attrib)(share, name) };
        let shared_client_api = attrib(GLFW_CLIENT_API);
        let shared_major = attrib(GLFW_CONTEXT_VERSION_MAJOR);
        let shared_minor = attrib(GLFW_CONTEXT_VERSION_MINOR);
        let shared_profile = attrib(GLFW_OPENGL_PROFILE);
        let shared_forward = attrib(GLFW_OPENGL_FORWARD_COMPAT);
        let shared_creation_api = attrib(GLFW_CONTEXT_CREATION_API);

        unsafe {
            (self.glfw_default_window_hints)();
            (self.glfw_window_hint)(GLFW_VISIBLE, GLFW_FALSE);
            (self.glfw_window_hint)(GLFW_FOCUSED, GLFW_FALSE);
            (self.glfw_window_hint)(GLFW_RESIZABLE, GLFW_FALSE);

            if shared_client_api != 0 {
                (self.glfw_window_hint)(GLFW_CLIENT_API, shared_client_api);
            }
            if shared_major > 0 {
                (self.glfw_window_hint)(GLFW_CONTEXT_VERSION_MAJOR, shared_major);
            }
            if shared_minor > 0 {
                (self.glfw_window_hint)(GLFW_CONTEXT_VERSION_MINOR, shared_minor);
            }
            if shared_profile != 0 {
                (self.glfw_window_hint)(GLFW_OPENGL_PROFILE, shared_profile);
            }
            (self.glfw_window_hint)(GLFW_OPENGL_FORWARD_COMPAT, shared_forward);
            if shared_creation_api != 0 {
                (self.glfw_window_hint)(GLFW_CONTEXT_CREATION_API, shared_creation_api);
            }
        }

        let window = unsafe {
            (self.glfw_create_window)(
                1,
                1,
                c"camview-bridge-offscreen".as_ptr(),
                std::ptr::null_mut(),
                share,
            )
        };
        unsafe { (self.glfw_default_window_hints)() };

        if window.is_null() {
            return Err(GpuError::Context(
                "glfwCreateWindow failed; ensure the shared window's context is valid".to_string(),
            ));
        }
        Ok(window)
    }
}

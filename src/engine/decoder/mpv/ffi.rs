//! Raw bindings for the libmpv client and render APIs.
//!
//! Loaded dynamically at runtime via `libloading`; only the subset the bridge drives is bound.
//!
//! Reference: `mpv/client.h` and `mpv/render.h` (client API 2.x).

use std::ffi::{CStr, c_char, c_int, c_void};

use libloading::Library;
use tracing::{debug, info};

use crate::engine::error::DecoderError;

/// Opaque `mpv_handle`.
#[repr(C)]
pub struct MpvHandle {
    _private: [u8; 0],
}

/// Opaque `mpv_render_context`.
#[repr(C)]
pub struct MpvRenderContext {
    _private: [u8; 0],
}

pub type MpvCallback = unsafe extern "C" fn(*mut c_void);

// mpv_event_id
pub const MPV_EVENT_NONE: c_int = 0;
pub const MPV_EVENT_SHUTDOWN: c_int = 1;
pub const MPV_EVENT_LOG_MESSAGE: c_int = 2;
pub const MPV_EVENT_COMMAND_REPLY: c_int = 5;
pub const MPV_EVENT_END_FILE: c_int = 7;
pub const MPV_EVENT_FILE_LOADED: c_int = 8;

// mpv_end_file_reason
pub const MPV_END_FILE_REASON_EOF: c_int = 0;
pub const MPV_END_FILE_REASON_STOP: c_int = 2;
pub const MPV_END_FILE_REASON_QUIT: c_int = 3;
pub const MPV_END_FILE_REASON_ERROR: c_int = 4;
pub const MPV_END_FILE_REASON_REDIRECT: c_int = 5;

// mpv_render_param_type
pub const MPV_RENDER_PARAM_INVALID: c_int = 0;
pub const MPV_RENDER_PARAM_API_TYPE: c_int = 1;
pub const MPV_RENDER_PARAM_BLOCK_FOR_TARGET_TIME: c_int = 12;
pub const MPV_RENDER_PARAM_SW_SIZE: c_int = 17;
pub const MPV_RENDER_PARAM_SW_FORMAT: c_int = 18;
pub const MPV_RENDER_PARAM_SW_STRIDE: c_int = 19;
pub const MPV_RENDER_PARAM_SW_POINTER: c_int = 20;

pub const MPV_RENDER_API_TYPE_SW: &CStr = c"sw";

/// `mpv_render_update_flag`: a new video frame must be rendered.
pub const MPV_RENDER_UPDATE_FRAME: u64 = 1 << 0;

/// Matches `mpv_event`.
#[repr(C)]
pub struct MpvEvent {
    pub event_id: c_int,
    pub error: c_int,
    pub reply_userdata: u64,
    pub data: *mut c_void,
}

/// Matches `mpv_event_end_file`.
#[repr(C)]
pub struct MpvEventEndFile {
    pub reason: c_int,
    pub error: c_int,
    pub playlist_entry_id: i64,
    pub playlist_insert_id: i64,
    pub playlist_insert_num_entries: c_int,
}

/// Matches `mpv_event_log_message`.
#[repr(C)]
pub struct MpvEventLogMessage {
    pub prefix: *const c_char,
    pub level: *const c_char,
    pub text: *const c_char,
    pub log_level: c_int,
}

/// Matches `mpv_render_param`.
#[repr(C)]
pub struct MpvRenderParam {
    pub kind: c_int,
    pub data: *mut c_void,
}

impl MpvRenderParam {
    pub fn new<T>(kind: c_int, data: *const T) -> Self {
        Self {
            kind,
            data: data as *mut c_void,
        }
    }

    pub fn end() -> Self {
        Self {
            kind: MPV_RENDER_PARAM_INVALID,
            data: std::ptr::null_mut(),
        }
    }
}

/// Candidate file names for the libmpv 2.x shared library, tried in order.
#[cfg(target_os = "windows")]
const LIBRARY_NAMES: &[&str] = &["libmpv-2.dll", "mpv-2.dll"];
#[cfg(target_os = "macos")]
const LIBRARY_NAMES: &[&str] = &["libmpv.2.dylib", "libmpv.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const LIBRARY_NAMES: &[&str] = &["libmpv.so.2", "libmpv.so"];

type MpvCreate = unsafe extern "C" fn() -> *mut MpvHandle;
type MpvInitialize = unsafe extern "C" fn(*mut MpvHandle) -> c_int;
type MpvTerminateDestroy = unsafe extern "C" fn(*mut MpvHandle);
type MpvSetOptionString = unsafe extern "C" fn(*mut MpvHandle, *const c_char, *const c_char) -> c_int;
type MpvRequestLogMessages = unsafe extern "C" fn(*mut MpvHandle, *const c_char) -> c_int;
type MpvCommandAsync = unsafe extern "C" fn(*mut MpvHandle, u64, *mut *const c_char) -> c_int;
type MpvSetWakeupCallback = unsafe extern "C" fn(*mut MpvHandle, Option<MpvCallback>, *mut c_void);
type MpvWaitEvent = unsafe extern "C" fn(*mut MpvHandle, f64) -> *mut MpvEvent;
type MpvErrorString = unsafe extern "C" fn(c_int) -> *const c_char;
type MpvRenderContextCreate =
    unsafe extern "C" fn(*mut *mut MpvRenderContext, *mut MpvHandle, *mut MpvRenderParam) -> c_int;
type MpvRenderContextSetUpdateCallback =
    unsafe extern "C" fn(*mut MpvRenderContext, Option<MpvCallback>, *mut c_void);
type MpvRenderContextUpdate = unsafe extern "C" fn(*mut MpvRenderContext) -> u64;
type MpvRenderContextRender = unsafe extern "C" fn(*mut MpvRenderContext, *mut MpvRenderParam) -> c_int;
type MpvRenderContextFree = unsafe extern "C" fn(*mut MpvRenderContext);

/// Dynamically loaded libmpv function table.
pub struct MpvLibrary {
    /// Keep the library loaded for as long as the function pointers are in use.
    _lib: Library,

    pub mpv_create: MpvCreate,
    pub mpv_initialize: MpvInitialize,
    pub mpv_terminate_destroy: MpvTerminateDestroy,
    pub mpv_set_option_string: MpvSetOptionString,
    pub mpv_request_log_messages: MpvRequestLogMessages,
    pub mpv_command_async: MpvCommandAsync,
    pub mpv_set_wakeup_callback: MpvSetWakeupCallback,
    pub mpv_wait_event: MpvWaitEvent,
    pub mpv_error_string: MpvErrorString,

    pub mpv_render_context_create: MpvRenderContextCreate,
    pub mpv_render_context_set_update_callback: MpvRenderContextSetUpdateCallback,
    pub mpv_render_context_update: MpvRenderContextUpdate,
    pub mpv_render_context_render: MpvRenderContextRender,
    pub mpv_render_context_free: MpvRenderContextFree,
}

// SAFETY: the function pointers come from a shared library that stays loaded for the lifetime of
// this struct (`_lib`), and the libmpv client API is thread-safe.
unsafe impl Send for MpvLibrary {}
unsafe impl Sync for MpvLibrary {}

impl std::fmt::Debug for MpvLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpvLibrary").finish_non_exhaustive()
    }
}

macro_rules! load_symbol {
    ($lib:expr, $ty:ty, $name:literal) => {
        *$lib
            .get::<$ty>(concat!($name, "\0").as_bytes())
            .map_err(|e| DecoderError::SymbolNotFound(format!("{}: {e}", $name)))?
    };
}

impl MpvLibrary {
    /// Loads libmpv from the platform's default search path.
    pub fn load() -> Result<Self, DecoderError> {
        let mut last_error = String::new();
        for name in LIBRARY_NAMES {
            match unsafe { Library::new(name) } {
                Ok(lib) => {
                    info!("Loaded {name}");
                    return Self::from_library(lib);
                }
                Err(e) => {
                    debug!("Could not load {name}: {e}");
                    last_error = format!("{name}: {e}");
                }
            }
        }
        Err(DecoderError::LibraryNotFound(last_error))
    }

    /// Loads libmpv from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self, DecoderError> {
        let lib = unsafe { Library::new(path) }.map_err(|e| {
            DecoderError::LibraryNotFound(format!("Failed to load {}: {e}", path.display()))
        })?;
        Self::from_library(lib)
    }

    fn from_library(lib: Library) -> Result<Self, DecoderError> {
        // Each Symbol is dereferenced to copy the raw function pointer out; `_lib` keeps the
        // library mapped.
        unsafe {
            let mpv_create = load_symbol!(lib, MpvCreate, "mpv_create");
            let mpv_initialize = load_symbol!(lib, MpvInitialize, "mpv_initialize");
            let mpv_terminate_destroy = load_symbol!(lib, MpvTerminateDestroy, "mpv_terminate_destroy");
            let mpv_set_option_string = load_symbol!(lib, MpvSetOptionString, "mpv_set_option_string");
            let mpv_request_log_messages = load_symbol!(lib, MpvRequestLogMessages, "mpv_request_log_messages");
            let mpv_command_async = load_symbol!(lib, MpvCommandAsync, "mpv_command_async");
            let mpv_set_wakeup_callback = load_symbol!(lib, MpvSetWakeupCallback, "mpv_set_wakeup_callback");
            let mpv_wait_event = load_symbol!(lib, MpvWaitEvent, "mpv_wait_event");
            let mpv_error_string = load_symbol!(lib, MpvErrorString, "mpv_error_string");
            let mpv_render_context_create = load_symbol!(lib, MpvRenderContextCreate, "mpv_render_context_create");
            let mpv_render_context_set_update_callback = load_symbol!(
                lib,
                MpvRenderContextSetUpdateCallback,
                "mpv_render_context_set_update_callback"
            );
            let mpv_render_context_update = load_symbol!(lib, MpvRenderContextUpdate, "mpv_render_context_update");
            let mpv_render_context_render = load_symbol!(lib, MpvRenderContextRender, "mpv_render_context_render");
            let mpv_render_context_free = load_symbol!(lib, MpvRenderContextFree, "mpv_render_context_free");

            Ok(Self {
                _lib: lib,
                mpv_create,
                mpv_initialize,
                mpv_terminate_destroy,
                mpv_set_option_string,
                mpv_request_log_messages,
                mpv_command_async,
                mpv_set_wakeup_callback,
                mpv_wait_event,
                mpv_error_string,
                mpv_render_context_create,
                mpv_render_context_set_update_callback,
                mpv_render_context_update,
                mpv_render_context_render,
                mpv_render_context_free,
            })
        }
    }

    /// Human-readable message for a libmpv error code.
    pub fn error_string(&self, code: c_int) -> String {
        let ptr = unsafe { (self.mpv_error_string)(code) };
        if ptr.is_null() {
            return format!("error {code}");
        }
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    /// Maps a negative status code to `DecoderError::Api`.
    pub fn check(&self, call: &'static str, code: c_int) -> Result<(), DecoderError> {
        if code >= 0 {
            return Ok(());
        }
        Err(DecoderError::Api {
            call,
            code,
            message: self.error_string(code),
        })
    }
}

/// Copies a possibly-NULL C string owned by libmpv.
///
/// # Safety
/// `ptr` must be NULL or point to a NUL-terminated string valid for the duration of the call.
pub unsafe fn lossy_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

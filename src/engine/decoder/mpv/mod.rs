//! ### English
//! libmpv decoder backend.
//!
//! ### 中文
//! 基于 libmpv 的解码后端。

mod ffi;
mod render;

use std::ffi::{CString, c_char};
use std::path::Path;
use std::sync::Arc;

use crate::engine::error::DecoderError;

use super::{
    CallbackToken, DecoderEngine, DecoderEvent, DecoderFactory, EndFileReason, NotifyFn,
    SoftwareRenderContext,
};
use ffi::{MpvHandle, MpvLibrary};
use render::MpvSoftwareRender;

/// ### English
/// Creates libmpv engine instances from one loaded library.
///
/// ### 中文
/// 基于同一个已加载的库创建 libmpv 引擎实例。
pub struct MpvDecoderFactory {
    api: Arc<MpvLibrary>,
}

impl MpvDecoderFactory {
    /// ### English
    /// Loads libmpv from `path`, or from the platform search path when `None`.
    ///
    /// ### 中文
    /// 从 `path` 加载 libmpv；为 `None` 时从平台默认搜索路径加载。
    pub fn load(path: Option<&Path>) -> Result<Self, DecoderError> {
        let api = match path {
            Some(path) => MpvLibrary::load_from(path)?,
            None => MpvLibrary::load()?,
        };
        Ok(Self { api: Arc::new(api) })
    }
}

impl DecoderFactory for MpvDecoderFactory {
    fn create(&self) -> Result<Box<dyn DecoderEngine>, DecoderError> {
        let handle = unsafe { (self.api.mpv_create)() };
        if handle.is_null() {
            return Err(DecoderError::Api {
                call: "mpv_create",
                code: -1,
                message: "out of memory or invalid locale".to_string(),
            });
        }
        Ok(Box::new(MpvEngine {
            api: self.api.clone(),
            handle,
            wakeup: None,
        }))
    }
}

/// ### English
/// One `mpv_handle` created by `mpv_create`.
///
/// ### 中文
/// 由 `mpv_create` 创建的单个 `mpv_handle`。
struct MpvEngine {
    api: Arc<MpvLibrary>,
    /// ### English
    /// NULL after `destroy`.
    ///
    /// ### 中文
    /// `destroy` 之后为 NULL。
    handle: *mut MpvHandle,
    wakeup: Option<CallbackToken>,
}

// SAFETY: the libmpv client API may be called from any thread; the bridge serializes calls on one
// handle through its lock.
unsafe impl Send for MpvEngine {}

impl MpvEngine {
    fn live_handle(&self) -> Result<*mut MpvHandle, DecoderError> {
        if self.handle.is_null() {
            return Err(DecoderError::Destroyed);
        }
        Ok(self.handle)
    }
}

fn c_string(value: &str) -> Result<CString, DecoderError> {
    CString::new(value).map_err(|_| DecoderError::InvalidArgument(format!("{value:?} contains NUL")))
}

impl DecoderEngine for MpvEngine {
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), DecoderError> {
        let handle = self.live_handle()?;
        let name = c_string(name)?;
        let value = c_string(value)?;
        let code =
            unsafe { (self.api.mpv_set_option_string)(handle, name.as_ptr(), value.as_ptr()) };
        self.api.check("mpv_set_option_string", code)
    }

    fn request_log_messages(&mut self, min_level: &str) -> Result<(), DecoderError> {
        let handle = self.live_handle()?;
        let level = c_string(min_level)?;
        let code = unsafe { (self.api.mpv_request_log_messages)(handle, level.as_ptr()) };
        self.api.check("mpv_request_log_messages", code)
    }

    fn initialize(&mut self) -> Result<(), DecoderError> {
        let handle = self.live_handle()?;
        let code = unsafe { (self.api.mpv_initialize)(handle) };
        self.api.check("mpv_initialize", code)
    }

    fn command_async(&mut self, args: &[&str]) -> Result<(), DecoderError> {
        let handle = self.live_handle()?;
        let owned = args
            .iter()
            .map(|arg| c_string(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let mut argv: Vec<*const c_char> = owned.iter().map(|arg| arg.as_ptr()).collect();
        argv.push(std::ptr::null());

        // libmpv copies the arguments before returning.
        let code = unsafe { (self.api.mpv_command_async)(handle, 0, argv.as_mut_ptr()) };
        self.api.check("mpv_command_async", code)
    }

    fn set_wakeup_callback(&mut self, callback: Option<Box<NotifyFn>>) {
        let Ok(handle) = self.live_handle() else {
            return;
        };

        // Unregister before the previous token is released.
        unsafe { (self.api.mpv_set_wakeup_callback)(handle, None, std::ptr::null_mut()) };
        self.wakeup = None;

        if let Some(callback) = callback {
            let token = CallbackToken::new(callback);
            unsafe {
                (self.api.mpv_set_wakeup_callback)(
                    handle,
                    Some(CallbackToken::trampoline),
                    token.context(),
                )
            };
            self.wakeup = Some(token);
        }
    }

    fn next_event(&mut self) -> Option<DecoderEvent> {
        let handle = self.live_handle().ok()?;
        loop {
            let event = unsafe { (self.api.mpv_wait_event)(handle, 0.0) };
            if event.is_null() {
                return None;
            }
            let event = unsafe { &*event };
            match event.event_id {
                ffi::MPV_EVENT_NONE => return None,
                ffi::MPV_EVENT_SHUTDOWN => return Some(DecoderEvent::Shutdown),
                ffi::MPV_EVENT_FILE_LOADED => return Some(DecoderEvent::FileLoaded),
                ffi::MPV_EVENT_END_FILE if !event.data.is_null() => {
                    let end = unsafe { &*(event.data as *const ffi::MpvEventEndFile) };
                    let reason = match end.reason {
                        ffi::MPV_END_FILE_REASON_EOF => EndFileReason::Eof,
                        ffi::MPV_END_FILE_REASON_STOP => EndFileReason::Stop,
                        ffi::MPV_END_FILE_REASON_QUIT => EndFileReason::Quit,
                        ffi::MPV_END_FILE_REASON_ERROR => EndFileReason::Error,
                        ffi::MPV_END_FILE_REASON_REDIRECT => EndFileReason::Redirect,
                        other => EndFileReason::Unknown(other),
                    };
                    let detail = (end.error < 0).then(|| self.api.error_string(end.error));
                    return Some(DecoderEvent::EndFile {
                        reason,
                        code: end.error,
                        detail,
                    });
                }
                ffi::MPV_EVENT_LOG_MESSAGE if !event.data.is_null() => {
                    let log = unsafe { &*(event.data as *const ffi::MpvEventLogMessage) };
                    return Some(DecoderEvent::Log {
                        level: unsafe { ffi::lossy_string(log.level) },
                        prefix: unsafe { ffi::lossy_string(log.prefix) },
                        text: unsafe { ffi::lossy_string(log.text) },
                    });
                }
                ffi::MPV_EVENT_COMMAND_REPLY if event.error < 0 => {
                    return Some(DecoderEvent::CommandFailed {
                        code: event.error,
                        detail: Some(self.api.error_string(event.error)),
                    });
                }
                _ => continue,
            }
        }
    }

    fn create_render_context(&mut self) -> Result<Box<dyn SoftwareRenderContext>, DecoderError> {
        let handle = self.live_handle()?;
        let render = MpvSoftwareRender::create(self.api.clone(), handle)?;
        Ok(Box::new(render))
    }

    fn destroy(&mut self) {
        let Ok(handle) = self.live_handle() else {
            return;
        };
        unsafe { (self.api.mpv_set_wakeup_callback)(handle, None, std::ptr::null_mut()) };
        self.wakeup = None;
        unsafe { (self.api.mpv_terminate_destroy)(handle) };
        self.handle = std::ptr::null_mut();
    }
}

impl Drop for MpvEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}

//! ### English
//! libmpv software render context (`MPV_RENDER_API_TYPE_SW`).
//!
//! libmpv forbids calling render functions from inside the update callback, so the update
//! callback only signals a dedicated render-ready thread which then runs the bridge's callback.
//!
//! ### 中文
//! libmpv 软件渲染上下文（`MPV_RENDER_API_TYPE_SW`）。
//!
//! libmpv 禁止在更新回调内调用渲染函数，因此更新回调只唤醒一个专用 render-ready 线程，
//! 由该线程执行渲染桥的回调。

use std::ffi::{c_int, c_void};
use std::sync::Arc;
use std::thread;

use crossbeam_channel as channel;

use crate::engine::decoder::{CallbackToken, NotifyFn, SoftwareRenderContext};
use crate::engine::error::DecoderError;
use crate::engine::frame::{DECODER_PIXEL_FORMAT, FrameBuffer};

use super::ffi::{self, MpvHandle, MpvLibrary, MpvRenderContext, MpvRenderParam};

pub(super) struct MpvSoftwareRender {
    api: Arc<MpvLibrary>,
    /// ### English
    /// NULL after `free`.
    ///
    /// ### 中文
    /// `free` 之后为 NULL。
    context: *mut MpvRenderContext,
    update: Option<CallbackToken>,
    /// ### English
    /// Render-ready dispatch thread; exits once the token (which owns the only sender) is dropped.
    ///
    /// ### 中文
    /// render-ready 分发线程；持有唯一 sender 的令牌被 drop 后该线程退出。
    dispatch: Option<thread::JoinHandle<()>>,
}

// SAFETY: render context functions are called under the bridge lock only; libmpv allows that from
// any thread.
unsafe impl Send for MpvSoftwareRender {}

impl MpvSoftwareRender {
    pub(super) fn create(api: Arc<MpvLibrary>, handle: *mut MpvHandle) -> Result<Self, DecoderError> {
        let mut params = [
            MpvRenderParam::new(
                ffi::MPV_RENDER_PARAM_API_TYPE,
                ffi::MPV_RENDER_API_TYPE_SW.as_ptr(),
            ),
            MpvRenderParam::end(),
        ];
        let mut context: *mut MpvRenderContext = std::ptr::null_mut();
        let code =
            unsafe { (api.mpv_render_context_create)(&mut context, handle, params.as_mut_ptr()) };
        api.check("mpv_render_context_create", code)?;

        Ok(Self {
            api,
            context,
            update: None,
            dispatch: None,
        })
    }

    fn unregister(&mut self) {
        if !self.context.is_null() {
            unsafe {
                (self.api.mpv_render_context_set_update_callback)(
                    self.context,
                    None,
                    std::ptr::null_mut(),
                )
            };
        }
        self.update = None;
    }
}

impl SoftwareRenderContext for MpvSoftwareRender {
    fn set_update_callback(&mut self, callback: Option<Box<NotifyFn>>) {
        self.unregister();
        let Some(callback) = callback else {
            return;
        };
        if self.context.is_null() {
            return;
        }

        let (tx, rx) = channel::bounded::<()>(1);
        let spawned = thread::Builder::new()
            .name("camview-render-ready".to_string())
            .spawn(move || {
                while rx.recv().is_ok() {
                    callback();
                }
            });
        let dispatch = match spawned {
            Ok(dispatch) => dispatch,
            Err(err) => {
                tracing::error!(%err, "failed to spawn render-ready thread");
                return;
            }
        };

        // A full channel means a wake-up is already pending; the pending render picks up the
        // latest frame.
        let token = CallbackToken::new(Box::new(move || {
            let _ = tx.try_send(());
        }));
        unsafe {
            (self.api.mpv_render_context_set_update_callback)(
                self.context,
                Some(CallbackToken::trampoline),
                token.context(),
            )
        };
        self.update = Some(token);
        // A previous dispatch thread (if any) lost its sender in `unregister` and exits by itself.
        self.dispatch = Some(dispatch);
    }

    fn frame_ready(&mut self) -> bool {
        if self.context.is_null() {
            return false;
        }
        let flags = unsafe { (self.api.mpv_render_context_update)(self.context) };
        flags & ffi::MPV_RENDER_UPDATE_FRAME != 0
    }

    fn render(&mut self, frame: &mut FrameBuffer) -> Result<(), DecoderError> {
        if self.context.is_null() {
            return Err(DecoderError::Destroyed);
        }

        let size = frame.size();
        let sw_size: [c_int; 2] = [size.width as c_int, size.height as c_int];
        let stride: usize = frame.stride();
        let block_for_target_time: c_int = 0;
        let format = c"rgb0";
        debug_assert_eq!(format.to_bytes(), DECODER_PIXEL_FORMAT.as_bytes());
        let pixels = frame.pixels_mut().as_mut_ptr();

        let mut params = [
            MpvRenderParam::new(ffi::MPV_RENDER_PARAM_SW_SIZE, sw_size.as_ptr()),
            MpvRenderParam::new(ffi::MPV_RENDER_PARAM_SW_FORMAT, format.as_ptr()),
            MpvRenderParam::new(ffi::MPV_RENDER_PARAM_SW_STRIDE, &stride as *const usize),
            MpvRenderParam::new(ffi::MPV_RENDER_PARAM_SW_POINTER, pixels as *const c_void),
            MpvRenderParam::new(
                ffi::MPV_RENDER_PARAM_BLOCK_FOR_TARGET_TIME,
                &block_for_target_time as *const c_int,
            ),
            MpvRenderParam::end(),
        ];
        let code =
            unsafe { (self.api.mpv_render_context_render)(self.context, params.as_mut_ptr()) };
        self.api.check("mpv_render_context_render", code)
    }

    fn free(&mut self) {
        if self.context.is_null() {
            return;
        }
        self.unregister();
        unsafe { (self.api.mpv_render_context_free)(self.context) };
        self.context = std::ptr::null_mut();
    }
}

fn join_dispatch(dispatch: thread::JoinHandle<()>) {
    // The last owner may be the dispatch thread itself (its callback held the final reference).
    if dispatch.thread().id() == thread::current().id() {
        return;
    }
    if dispatch.join().is_err() {
        tracing::error!("render-ready thread panicked");
    }
}

impl Drop for MpvSoftwareRender {
    fn drop(&mut self) {
        self.free();
        if let Some(dispatch) = self.dispatch.take() {
            join_dispatch(dispatch);
        }
    }
}

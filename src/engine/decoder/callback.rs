//! ### English
//! Ownership token for a callback context handed to native code.
//!
//! The token holds one strong reference to the closure for as long as the native side may call
//! it. The owner unregisters the native callback first and drops the token afterwards, in the same
//! teardown step.
//!
//! ### 中文
//! 交给原生代码的回调上下文所有权令牌。
//!
//! 在原生侧可能调用闭包期间，令牌持有闭包的一个强引用。持有者先注销原生回调，
//! 再在同一个销毁步骤中 drop 令牌。

use std::ffi::c_void;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::NotifyFn;

type SharedNotify = Box<NotifyFn>;

pub(crate) struct CallbackToken {
    raw: *const SharedNotify,
}

// SAFETY: the pointee is `Send + Sync` and only read through `&`.
unsafe impl Send for CallbackToken {}
unsafe impl Sync for CallbackToken {}

impl CallbackToken {
    pub(crate) fn new(callback: Box<NotifyFn>) -> Self {
        Self {
            raw: Arc::into_raw(Arc::new(callback)),
        }
    }

    /// ### English
    /// Opaque context pointer to register alongside `CallbackToken::trampoline`.
    ///
    /// Valid until this token is dropped.
    ///
    /// ### 中文
    /// 与 `CallbackToken::trampoline` 一起注册的不透明上下文指针。
    ///
    /// 在令牌被 drop 之前一直有效。
    pub(crate) fn context(&self) -> *mut c_void {
        self.raw as *mut c_void
    }

    /// ### English
    /// C entry point invoked by native code with the context from `context()`.
    ///
    /// Panics are contained here and never unwind into the engine.
    ///
    /// ### 中文
    /// 原生代码以 `context()` 返回的上下文调用的 C 入口。
    ///
    /// panic 在此处被拦截，不会 unwind 进引擎。
    pub(crate) unsafe extern "C" fn trampoline(context: *mut c_void) {
        if context.is_null() {
            return;
        }
        let callback = unsafe { &*(context as *const SharedNotify) };
        if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
            tracing::error!("decoder callback panicked");
        }
    }
}

impl Drop for CallbackToken {
    fn drop(&mut self) {
        unsafe { drop(Arc::from_raw(self.raw)) };
    }
}

//! ### English
//! Error types for the decoder engine, the GPU backend and the bridge itself.
//!
//! ### 中文
//! 解码引擎、GPU 后端以及渲染桥本身的错误类型。

use thiserror::Error;

/// ### English
/// Failures reported by a decoder engine backend.
///
/// ### 中文
/// 解码引擎后端报告的错误。
#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("decoder library not found: {0}")]
    LibraryNotFound(String),

    #[error("required decoder symbol not found: {0}")]
    SymbolNotFound(String),

    /// ### English
    /// An engine API call returned a negative status code.
    ///
    /// ### 中文
    /// 引擎 API 调用返回了负的状态码。
    #[error("{call} failed: {message} (code {code})")]
    Api {
        call: &'static str,
        code: i32,
        message: String,
    },

    #[error("invalid decoder argument: {0}")]
    InvalidArgument(String),

    #[error("decoder handle already destroyed")]
    Destroyed,
}

/// ### English
/// Failures reported by a GPU backend.
///
/// ### 中文
/// GPU 后端报告的错误。
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("GL context unavailable: {0}")]
    Context(String),

    #[error("shader build failed: {0}")]
    Shader(String),

    #[error("GPU resource creation failed: {0}")]
    Resource(String),
}

/// ### English
/// Errors surfaced by the lifecycle controller and the runtime.
///
/// ### 中文
/// 生命周期控制器与运行时对外暴露的错误。
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid stream locator: {0}")]
    InvalidLocator(&'static str),

    #[error("render bridge is already attached")]
    AlreadyAttached,

    #[error("render bridge is shut down")]
    ShutDown,

    #[error(transparent)]
    Decoder(#[from] DecoderError),

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

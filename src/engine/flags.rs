//! ### English
//! Bitflags controlling optional surface behaviors.
//!
//! These are passed through the C ABI as a `u32` bitmask.
//!
//! ### 中文
//! 控制 surface 可选行为的位标志（bitflags）。
//!
//! 通过 C ABI 以 `u32` 位掩码传入。

/// ### English
/// Disable hardware decoding (force software decode on the engine side).
///
/// ### 中文
/// 禁用硬件解码（强制引擎使用软件解码）。
pub const CAMVIEW_SURFACE_FLAG_NO_HWDEC: u32 = 1 << 0;

/// ### English
/// Use UDP instead of TCP for RTSP transport (lower latency, but lossy networks will drop frames).
///
/// ### 中文
/// RTSP 使用 UDP 而非 TCP 传输（延迟更低，但在丢包网络下会丢帧）。
pub const CAMVIEW_SURFACE_FLAG_RTSP_UDP: u32 = 1 << 1;

/// ### English
/// Forward decoder log messages at `debug` level instead of `warn`.
///
/// ### 中文
/// 以 `debug` 级别（而非 `warn`）转发解码器日志。
pub const CAMVIEW_SURFACE_FLAG_VERBOSE_DECODER_LOG: u32 = 1 << 2;

/// ### English
/// Redraw synchronously from the render-ready thread instead of waiting for the next display tick.
///
/// The GL backend makes its own context current for the draw and restores the caller's afterwards.
///
/// ### 中文
/// 在 render-ready 线程上同步重绘，而不是等待下一次显示 tick。
///
/// GL 后端在绘制时切换到自身上下文，并在结束后恢复调用方原有的上下文。
pub const CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW: u32 = 1 << 3;

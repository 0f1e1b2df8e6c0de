//! ### English
//! ABI version, constant getters and logging setup.
//!
//! ### 中文
//! ABI 版本、常量获取函数与日志初始化。

use tracing::Level;

use crate::engine::flags;

#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn camview_bridge_abi_version() -> u32 {
    super::CAMVIEW_BRIDGE_ABI_VERSION
}

#[unsafe(no_mangle)]
/// ### English
/// Installs a `tracing` fmt subscriber writing to stderr.
///
/// Returns `false` if a global subscriber was already installed (by this call or by the host).
///
/// ### 中文
/// 安装输出到 stderr 的 `tracing` fmt subscriber。
///
/// 若已安装全局 subscriber（无论由本函数还是宿主安装），返回 `false`。
pub extern "C" fn camview_bridge_init_logging(verbose: u8) -> bool {
    let level = if verbose != 0 {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[unsafe(no_mangle)]
/// ### English
/// Returns `CAMVIEW_SURFACE_FLAG_NO_HWDEC`.
/// (FFI-friendly constant getter; avoids relying on C headers.)
///
/// ### 中文
/// 返回 `CAMVIEW_SURFACE_FLAG_NO_HWDEC`。
/// （FFI 友好的常量获取函数；避免依赖 C 头文件。）
pub extern "C" fn camview_bridge_surface_flag_no_hwdec() -> u32 {
    flags::CAMVIEW_SURFACE_FLAG_NO_HWDEC
}

#[unsafe(no_mangle)]
/// ### English
/// Returns `CAMVIEW_SURFACE_FLAG_RTSP_UDP`.
///
/// ### 中文
/// 返回 `CAMVIEW_SURFACE_FLAG_RTSP_UDP`。
pub extern "C" fn camview_bridge_surface_flag_rtsp_udp() -> u32 {
    flags::CAMVIEW_SURFACE_FLAG_RTSP_UDP
}

#[unsafe(no_mangle)]
/// ### English
/// Returns `CAMVIEW_SURFACE_FLAG_VERBOSE_DECODER_LOG`.
///
/// ### 中文
/// 返回 `CAMVIEW_SURFACE_FLAG_VERBOSE_DECODER_LOG`。
pub extern "C" fn camview_bridge_surface_flag_verbose_decoder_log() -> u32 {
    flags::CAMVIEW_SURFACE_FLAG_VERBOSE_DECODER_LOG
}

#[unsafe(no_mangle)]
/// ### English
/// Returns `CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW`.
///
/// ### 中文
/// 返回 `CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW`。
pub extern "C" fn camview_bridge_surface_flag_immediate_redraw() -> u32 {
    flags::CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW
}

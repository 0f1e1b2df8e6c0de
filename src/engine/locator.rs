//! ### English
//! Stream locator handling.
//!
//! The locator is an opaque string supplied by the session client (it may embed credentials).
//! The decoder receives it unchanged and reports unplayable input through its end-file error.
//! `url` is only used to derive a log-safe rendition.
//!
//! ### 中文
//! 流定位符处理。
//!
//! 定位符是会话客户端提供的不透明字符串（可能内嵌凭据）。解码器原样接收它，
//! 无法播放的输入由解码器的 end-file 错误上报。`url` 仅用于生成可安全写入日志的形式。

use url::Url;

use crate::engine::error::BridgeError;

/// ### English
/// Placeholder logged for locators that do not parse as URLs (plain paths, device names, ...).
///
/// ### 中文
/// 无法解析为 URL 的定位符（普通路径、设备名等）在日志中的占位符。
pub const OPAQUE_LOCATOR: &str = "<opaque>";

/// ### English
/// Trims `locator` and rejects input that cannot name a stream at all (empty, or containing NUL,
/// which cannot cross the decoder's C API). Everything else is passed through.
///
/// ### 中文
/// 去除 `locator` 首尾空白，并拒绝根本无法表示流的输入（为空，或包含无法穿过解码器 C API 的 NUL）。
/// 其余输入原样放行。
pub fn validate_locator(locator: &str) -> Result<&str, BridgeError> {
    let locator = locator.trim();
    if locator.is_empty() {
        return Err(BridgeError::InvalidLocator("empty locator"));
    }
    if locator.contains('\0') {
        return Err(BridgeError::InvalidLocator("locator contains NUL"));
    }
    Ok(locator)
}

/// ### English
/// Log-safe rendition of a locator: scheme, host and port only (no credentials, path or query).
/// Locators that are not URLs log as `<opaque>`.
///
/// ### 中文
/// 可安全写入日志的定位符形式：仅包含 scheme、host 与端口（不含凭据、路径或查询参数）。
/// 不是 URL 的定位符记为 `<opaque>`。
pub fn redacted(locator: &str) -> String {
    let Ok(url) = Url::parse(locator) else {
        return OPAQUE_LOCATOR.to_string();
    };
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}://{host}:{port}", url.scheme()),
        (Some(host), None) => format!("{}://{host}", url.scheme()),
        _ => format!("{}://", url.scheme()),
    }
}

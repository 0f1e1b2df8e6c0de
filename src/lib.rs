/// ### English
/// `camview_bridge` crate root.
/// Exposes the C ABI via `ffi`; the streaming render bridge lives under `engine`.
///
/// ### 中文
/// `camview_bridge` 的 crate 根。
/// 通过 `ffi` 导出 C ABI；流媒体渲染桥的核心实现位于 `engine` 模块。
pub mod engine;
mod ffi;

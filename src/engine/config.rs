//! ### English
//! Per-surface configuration applied to the decoder engine before it starts.
//!
//! ### 中文
//! 在解码引擎启动前应用的每 surface 配置。

use crate::engine::flags;

/// ### English
/// RTSP transport used by the decoder engine.
///
/// ### 中文
/// 解码引擎使用的 RTSP 传输方式。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RtspTransport {
    Tcp,
    Udp,
}

impl RtspTransport {
    pub fn as_option_value(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// ### English
/// Decoder configuration for one camera surface.
///
/// Audio is never configurable: the bridge always disables it.
///
/// ### 中文
/// 单个摄像头 surface 的解码配置。
///
/// 音频不可配置：渲染桥始终禁用音频。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// ### English
    /// Hardware decoding policy (`"auto-safe"` or `"no"`).
    ///
    /// ### 中文
    /// 硬件解码策略（`"auto-safe"` 或 `"no"`）。
    pub hwdec: &'static str,
    /// ### English
    /// Apply the engine's low-latency profile (no demuxer cache, untimed output).
    ///
    /// ### 中文
    /// 启用引擎的低延迟 profile（关闭 demuxer 缓存、非定时输出）。
    pub low_latency: bool,
    /// ### English
    /// Network timeout in seconds; stalls longer than this surface as an end-of-file error.
    ///
    /// ### 中文
    /// 网络超时（秒）；超过该时长的卡顿会以 end-of-file 错误上报。
    pub network_timeout_secs: u32,
    pub rtsp_transport: RtspTransport,
    /// ### English
    /// Minimum engine log level forwarded into `tracing`.
    ///
    /// ### 中文
    /// 转发到 `tracing` 的最低引擎日志级别。
    pub decoder_log_level: &'static str,
    /// ### English
    /// Draw synchronously from the render-ready thread (see `CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW`).
    ///
    /// ### 中文
    /// 在 render-ready 线程同步绘制（见 `CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW`）。
    pub immediate_redraw: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            hwdec: "auto-safe",
            low_latency: true,
            network_timeout_secs: 10,
            rtsp_transport: RtspTransport::Tcp,
            decoder_log_level: "warn",
            immediate_redraw: false,
        }
    }
}

impl BridgeConfig {
    /// ### English
    /// Builds a configuration from C ABI surface flags.
    ///
    /// #### Parameters
    /// - `surface_flags`: Bitmask of `CAMVIEW_SURFACE_FLAG_*` values.
    ///
    /// ### 中文
    /// 根据 C ABI 的 surface 标志构建配置。
    ///
    /// #### 参数
    /// - `surface_flags`：`CAMVIEW_SURFACE_FLAG_*` 组成的位掩码。
    pub fn from_flags(surface_flags: u32) -> Self {
        let mut config = Self::default();
        if surface_flags & flags::CAMVIEW_SURFACE_FLAG_NO_HWDEC != 0 {
            config.hwdec = "no";
        }
        if surface_flags & flags::CAMVIEW_SURFACE_FLAG_RTSP_UDP != 0 {
            config.rtsp_transport = RtspTransport::Udp;
        }
        if surface_flags & flags::CAMVIEW_SURFACE_FLAG_VERBOSE_DECODER_LOG != 0 {
            config.decoder_log_level = "debug";
        }
        config.immediate_redraw = surface_flags & flags::CAMVIEW_SURFACE_FLAG_IMMEDIATE_REDRAW != 0;
        config
    }

    /// ### English
    /// Returns the `(name, value)` engine options derived from this configuration, in the order
    /// they must be applied.
    ///
    /// ### 中文
    /// 返回由该配置推导出的引擎选项 `(name, value)`，顺序即应用顺序。
    pub fn decoder_options(&self) -> Vec<(&'static str, String)> {
        let mut options = vec![
            ("vo", "libmpv".to_string()),
            ("audio", "no".to_string()),
            ("hwdec", self.hwdec.to_string()),
            ("network-timeout", self.network_timeout_secs.to_string()),
            (
                "rtsp-transport",
                self.rtsp_transport.as_option_value().to_string(),
            ),
            ("keep-open", "no".to_string()),
            ("idle", "yes".to_string()),
            ("terminal", "no".to_string()),
        ];
        if self.low_latency {
            options.push(("profile", "low-latency".to_string()));
            options.push(("cache", "no".to_string()));
            options.push(("untimed", "yes".to_string()));
        }
        options
    }
}

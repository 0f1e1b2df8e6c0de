//! ### English
//! `DecoderHandle`: exclusive owner of one decoder engine instance.
//!
//! ### 中文
//! `DecoderHandle`：单个解码引擎实例的独占持有者。

use crate::engine::config::BridgeConfig;
use crate::engine::error::DecoderError;

use super::{DecoderEngine, DecoderEvent, DecoderFactory, NotifyFn, SoftwareRenderContext};

/// ### English
/// Upper bound of events drained per `poll_events` call, so a chatty engine cannot starve the UI
/// thread.
///
/// ### 中文
/// 每次 `poll_events` 最多 drain 的事件数，避免日志过多的引擎饿死 UI 线程。
const MAX_EVENTS_PER_POLL: usize = 256;

/// ### English
/// Owner of one decoder engine instance.
///
/// Created once per attach and destroyed exactly once by `shutdown`; a destroyed handle is never
/// reused (every later call is a no-op or returns `DecoderError::Destroyed`).
///
/// ### 中文
/// 单个解码引擎实例的持有者。
///
/// 每次 attach 创建一次，并由 `shutdown` 恰好销毁一次；销毁后的句柄不会被复用
/// （之后的调用均为 no-op 或返回 `DecoderError::Destroyed`）。
pub struct DecoderHandle {
    engine: Option<Box<dyn DecoderEngine>>,
    surface: u64,
}

impl DecoderHandle {
    /// ### English
    /// Creates an engine instance, applies `config` and initializes it.
    ///
    /// #### Parameters
    /// - `factory`: Engine factory.
    /// - `config`: Options applied before initialization.
    /// - `surface`: Surface id used in log fields.
    ///
    /// ### 中文
    /// 创建引擎实例，应用 `config` 并完成初始化。
    ///
    /// #### 参数
    /// - `factory`：引擎工厂。
    /// - `config`：初始化前应用的选项。
    /// - `surface`：日志字段中使用的 surface id。
    pub fn create(
        factory: &dyn DecoderFactory,
        config: &BridgeConfig,
        surface: u64,
    ) -> Result<Self, DecoderError> {
        let engine = factory.create()?;
        let mut handle = Self {
            engine: Some(engine),
            surface,
        };
        if let Err(err) = handle.configure(config).and_then(|()| handle.initialize()) {
            handle.shutdown();
            return Err(err);
        }
        Ok(handle)
    }

    fn engine_mut(&mut self) -> Result<&mut Box<dyn DecoderEngine>, DecoderError> {
        self.engine.as_mut().ok_or(DecoderError::Destroyed)
    }

    /// ### English
    /// Applies engine options derived from `config` (before initialization only).
    ///
    /// ### 中文
    /// 应用由 `config` 推导出的引擎选项（仅限初始化之前）。
    pub fn configure(&mut self, config: &BridgeConfig) -> Result<(), DecoderError> {
        let engine = self.engine_mut()?;
        for (name, value) in config.decoder_options() {
            engine.set_option(name, &value)?;
        }
        engine.request_log_messages(config.decoder_log_level)?;
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), DecoderError> {
        self.engine_mut()?.initialize()?;
        tracing::debug!(surface = self.surface, "decoder engine initialized");
        Ok(())
    }

    pub fn set_wakeup_callback(&mut self, callback: Box<NotifyFn>) -> Result<(), DecoderError> {
        self.engine_mut()?.set_wakeup_callback(Some(callback));
        Ok(())
    }

    pub fn create_render_context(
        &mut self,
    ) -> Result<Box<dyn SoftwareRenderContext>, DecoderError> {
        self.engine_mut()?.create_render_context()
    }

    /// ### English
    /// Starts loading `locator`. Failures to load are reported later as end-of-file events; an
    /// error here means the command itself was rejected.
    ///
    /// ### 中文
    /// 开始加载 `locator`。加载失败稍后以 end-of-file 事件上报；此处返回错误意味着命令本身被拒绝。
    pub fn open(&mut self, locator: &str) -> Result<(), DecoderError> {
        tracing::debug!(surface = self.surface, "issuing loadfile");
        self.engine_mut()?
            .command_async(&["loadfile", locator, "replace"])
    }

    /// ### English
    /// Fire-and-forget command. Rejections are logged, never returned.
    ///
    /// ### 中文
    /// 即发即弃命令；被拒绝时只记录日志，不返回错误。
    pub fn command(&mut self, name: &str, args: &[&str]) {
        let surface = self.surface;
        let Some(engine) = self.engine.as_mut() else {
            tracing::trace!(surface, name, "command after decoder shutdown dropped");
            return;
        };

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(name);
        argv.extend_from_slice(args);
        if let Err(err) = engine.command_async(&argv) {
            tracing::warn!(surface, name, %err, "decoder command rejected");
        }
    }

    pub fn set_pause(&mut self, paused: bool) {
        self.command("set", &["pause", if paused { "yes" } else { "no" }]);
    }

    pub fn stop(&mut self) {
        self.command("stop", &[]);
    }

    /// ### English
    /// Drains pending engine events without blocking.
    ///
    /// Engine log messages are forwarded into `tracing` here and not returned.
    ///
    /// ### 中文
    /// 非阻塞地 drain 待处理的引擎事件。
    ///
    /// 引擎日志消息在此转发到 `tracing`，不会返回给调用方。
    pub fn poll_events(&mut self) -> Vec<DecoderEvent> {
        let surface = self.surface;
        let Some(engine) = self.engine.as_mut() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        for _ in 0..MAX_EVENTS_PER_POLL {
            let Some(event) = engine.next_event() else {
                break;
            };
            match event {
                DecoderEvent::Log {
                    level,
                    prefix,
                    text,
                } => forward_engine_log(surface, &level, &prefix, text.trim_end()),
                other => events.push(other),
            }
        }
        events
    }

    /// ### English
    /// Unregisters the wake-up callback, then halts and releases the engine. Idempotent.
    ///
    /// ### 中文
    /// 先注销 wake-up 回调，再停止并释放引擎；幂等。
    pub fn shutdown(&mut self) {
        let Some(mut engine) = self.engine.take() else {
            return;
        };
        engine.set_wakeup_callback(None);
        engine.destroy();
        tracing::debug!(surface = self.surface, "decoder engine destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.engine.is_none()
    }
}

impl Drop for DecoderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn forward_engine_log(surface: u64, level: &str, prefix: &str, text: &str) {
    match level {
        "fatal" | "error" => tracing::error!(surface, prefix, "{text}"),
        "warn" => tracing::warn!(surface, prefix, "{text}"),
        "info" => tracing::info!(surface, prefix, "{text}"),
        "v" | "debug" => tracing::debug!(surface, prefix, "{text}"),
        _ => tracing::trace!(surface, prefix, "{text}"),
    }
}

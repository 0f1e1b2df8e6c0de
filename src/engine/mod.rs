//! ### English
//! Engine internal modules (decoder seam, render bridge, GPU presentation, UI-thread dispatch).
//!
//! ### 中文
//! 引擎内部模块（解码器接缝、渲染桥、GPU 呈现、UI 线程派发）。

pub mod bridge;
pub mod config;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod frame;
pub mod glfw;
pub mod locator;
pub mod rendering;
pub mod runtime;
pub mod state;
pub mod surface;
#[cfg(test)]
pub(crate) mod testing;
pub mod vsync;

pub use bridge::{BridgeServices, RenderBridge};
pub use config::BridgeConfig;
pub use error::{BridgeError, DecoderError, GpuError};
pub use rendering::PresentedFrame;
pub use runtime::BridgeRuntime;
pub use state::{LifecyclePhase, StreamState};
pub use surface::SurfaceAdapter;

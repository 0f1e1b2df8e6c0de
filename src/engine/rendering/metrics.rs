//! ### English
//! Live surface metrics (logical size + scale factor) shared between the UI and the render thread.
//!
//! ### 中文
//! UI 与渲染线程共享的实时 surface 度量（逻辑尺寸 + 缩放因子）。

use std::sync::atomic::{AtomicU64, Ordering};

use dpi::{LogicalSize, PhysicalSize};

/// ### English
/// Width and height are packed into one atomic word so a reader never sees a torn size; the scale
/// factor is stored separately (a mismatched scale only affects one frame).
///
/// ### 中文
/// 宽高打包进同一个原子字，读者不会看到撕裂的尺寸；缩放因子单独存储（不一致只影响单帧）。
#[derive(Debug)]
pub struct SurfaceMetrics {
    logical: AtomicU64,
    scale_bits: AtomicU64,
}

impl Default for SurfaceMetrics {
    fn default() -> Self {
        Self::new(LogicalSize::new(0, 0), 1.0)
    }
}

fn pack(size: LogicalSize<u32>) -> u64 {
    (u64::from(size.width) << 32) | u64::from(size.height)
}

impl SurfaceMetrics {
    pub fn new(size: LogicalSize<u32>, scale_factor: f64) -> Self {
        let scale_factor = if dpi::validate_scale_factor(scale_factor) {
            scale_factor
        } else {
            1.0
        };
        Self {
            logical: AtomicU64::new(pack(size)),
            scale_bits: AtomicU64::new(scale_factor.to_bits()),
        }
    }

    /// ### English
    /// Updates the live metrics. Returns `false` (and keeps the old scale) for an invalid scale
    /// factor.
    ///
    /// ### 中文
    /// 更新实时度量；缩放因子非法时返回 `false`（并保留旧的缩放因子）。
    pub fn set(&self, size: LogicalSize<u32>, scale_factor: f64) -> bool {
        self.logical.store(pack(size), Ordering::Release);
        if !dpi::validate_scale_factor(scale_factor) {
            return false;
        }
        self.scale_bits
            .store(scale_factor.to_bits(), Ordering::Release);
        true
    }

    pub fn logical_size(&self) -> LogicalSize<u32> {
        let packed = self.logical.load(Ordering::Acquire);
        LogicalSize::new((packed >> 32) as u32, packed as u32)
    }

    pub fn scale_factor(&self) -> f64 {
        f64::from_bits(self.scale_bits.load(Ordering::Acquire))
    }

    /// ### English
    /// Physical pixel size = logical size × scale factor (recomputed on every call).
    ///
    /// ### 中文
    /// 物理像素尺寸 = 逻辑尺寸 × 缩放因子（每次调用都重新计算）。
    pub fn pixel_size(&self) -> PhysicalSize<u32> {
        self.logical_size().to_physical(self.scale_factor())
    }
}

//! ### English
//! CPU-side frame buffer the decoder paints into (software rendering).
//!
//! The buffer only grows: surface resizes during animations would otherwise reallocate on every
//! frame.
//!
//! ### 中文
//! 解码器进行软件渲染时写入的 CPU 侧帧缓冲。
//!
//! 缓冲区只增不减：否则 surface 在动画中 resize 时会每帧重新分配。

use dpi::PhysicalSize;

/// ### English
/// Bytes per pixel of the fixed packed pixel format (`rgb0`: R, G, B, padding).
///
/// ### 中文
/// 固定打包像素格式（`rgb0`：R、G、B、填充字节）的每像素字节数。
pub const BYTES_PER_PIXEL: usize = 4;

/// ### English
/// Pixel format name understood by the decoder's software renderer.
///
/// ### 中文
/// 解码器软件渲染器可识别的像素格式名。
pub const DECODER_PIXEL_FORMAT: &str = "rgb0";

/// ### English
/// Reusable block of raw pixel memory plus its current `(width, height, stride)`.
///
/// ### 中文
/// 可复用的原始像素内存块，以及当前的 `(width, height, stride)`。
#[derive(Debug, Default)]
pub struct FrameBuffer {
    /// ### English
    /// Backing storage; `len()` is the capacity in bytes.
    ///
    /// ### 中文
    /// 底层存储；`len()` 即字节容量。
    bytes: Vec<u8>,
    size: PhysicalSize<u32>,
    stride: usize,
    /// ### English
    /// Number of reallocations performed so far.
    ///
    /// ### 中文
    /// 迄今为止发生的重新分配次数。
    reallocations: u64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// ### English
    /// Prepares the buffer for a frame of `size`, reallocating only if the required byte count
    /// exceeds the current capacity.
    ///
    /// Returns `true` if a reallocation happened.
    ///
    /// #### Parameters
    /// - `size`: Requested frame size in physical pixels (must be non-zero).
    ///
    /// ### 中文
    /// 为 `size` 尺寸的帧准备缓冲区；仅当所需字节数超过当前容量时才重新分配。
    ///
    /// 发生重新分配时返回 `true`。
    ///
    /// #### 参数
    /// - `size`：请求的帧尺寸（物理像素，必须非 0）。
    pub fn ensure(&mut self, size: PhysicalSize<u32>) -> bool {
        let stride = size.width as usize * BYTES_PER_PIXEL;
        let required = stride * size.height as usize;

        let reallocated = required > self.bytes.len();
        if reallocated {
            self.bytes = vec![0; required];
            self.reallocations += 1;
        }

        self.size = size;
        self.stride = stride;
        reallocated
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }

    /// ### English
    /// Pixels of the current frame (`stride * height` bytes, no padding).
    ///
    /// ### 中文
    /// 当前帧的像素数据（`stride * height` 字节，无填充）。
    pub fn pixels(&self) -> &[u8] {
        &self.bytes[..self.stride * self.size.height as usize]
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        let len = self.stride * self.size.height as usize;
        &mut self.bytes[..len]
    }
}

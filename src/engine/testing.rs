//! ### English
//! In-memory decoder and GPU backends for unit tests.
//!
//! Each fake shares its recorded state with a cloneable probe so tests can inspect calls and fire
//! callbacks after ownership moved into the bridge.
//!
//! ### 中文
//! 用于单元测试的内存版解码器与 GPU 后端。
//!
//! 每个 fake 与一个可 clone 的 probe 共享记录状态，测试可在所有权移交给渲染桥之后检查调用并触发回调。

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use dpi::PhysicalSize;
use parking_lot::Mutex;

use crate::engine::decoder::{
    DecoderEngine, DecoderEvent, DecoderFactory, NotifyFn, SoftwareRenderContext,
};
use crate::engine::error::{DecoderError, GpuError};
use crate::engine::frame::FrameBuffer;
use crate::engine::rendering::{
    GpuBackend, GpuFactory, PipelineHandle, PresentedFrame, SamplerHandle, TextureHandle,
};

type SharedNotify = Arc<Box<NotifyFn>>;
type DrawHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct DecoderRecord {
    options: Vec<(String, String)>,
    log_level: Option<String>,
    initialized: bool,
    commands: Vec<Vec<String>>,
    events: VecDeque<DecoderEvent>,
    wakeup: Option<SharedNotify>,
    wakeup_cleared_before_destroy: bool,
    destroy_count: usize,
    update: Option<SharedNotify>,
    update_cleared_before_free: bool,
    render_contexts_created: usize,
    render_context_frees: usize,
    frame_due: bool,
    render_sizes: Vec<PhysicalSize<u32>>,
    fail_render: bool,
}

/// ### English
/// Shared view of one fake engine instance.
///
/// ### 中文
/// 单个 fake 引擎实例的共享视图。
#[derive(Clone, Default)]
pub(crate) struct FakeDecoderProbe {
    record: Arc<Mutex<DecoderRecord>>,
}

impl FakeDecoderProbe {
    pub(crate) fn options(&self) -> Vec<(String, String)> {
        self.record.lock().options.clone()
    }

    pub(crate) fn initialized(&self) -> bool {
        self.record.lock().initialized
    }

    pub(crate) fn log_level(&self) -> Option<String> {
        self.record.lock().log_level.clone()
    }

    pub(crate) fn destroy_count(&self) -> usize {
        self.record.lock().destroy_count
    }

    pub(crate) fn has_wakeup_callback(&self) -> bool {
        self.record.lock().wakeup.is_some()
    }

    pub(crate) fn wakeup_cleared_before_destroy(&self) -> bool {
        self.record.lock().wakeup_cleared_before_destroy
    }

    pub(crate) fn commands(&self) -> Vec<Vec<String>> {
        self.record.lock().commands.clone()
    }

    /// ### English
    /// Number of commands whose first word is `name`.
    ///
    /// ### 中文
    /// 首个单词为 `name` 的命令数量。
    pub(crate) fn command_count(&self, name: &str) -> usize {
        self.record
            .lock()
            .commands
            .iter()
            .filter(|argv| argv.first().is_some_and(|first| first == name))
            .count()
    }

    pub(crate) fn push_event(&self, event: DecoderEvent) {
        self.record.lock().events.push_back(event);
    }

    /// ### English
    /// Invokes the registered wake-up callback on the calling thread (no-op when unregistered).
    ///
    /// ### 中文
    /// 在调用线程上调用已注册的 wake-up 回调（未注册时为 no-op）。
    pub(crate) fn fire_wakeup(&self) {
        let callback = self.record.lock().wakeup.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// ### English
    /// Marks a new frame as due and invokes the render-ready callback on the calling thread.
    ///
    /// ### 中文
    /// 标记有新帧待绘制，并在调用线程上调用 render-ready 回调。
    pub(crate) fn fire_frame(&self) {
        let callback = {
            let mut record = self.record.lock();
            record.frame_due = true;
            record.update.clone()
        };
        if let Some(callback) = callback {
            callback();
        }
    }

    /// ### English
    /// Clones of the currently registered `(wake-up, render-ready)` callbacks, for simulating
    /// invocations already in flight when they get unregistered.
    ///
    /// ### 中文
    /// 当前已注册的 `(wake-up, render-ready)` 回调的 clone，用于模拟注销时已在途的调用。
    pub(crate) fn retained_callbacks(&self) -> (Option<SharedNotify>, Option<SharedNotify>) {
        let record = self.record.lock();
        (record.wakeup.clone(), record.update.clone())
    }

    pub(crate) fn has_update_callback(&self) -> bool {
        self.record.lock().update.is_some()
    }

    pub(crate) fn update_cleared_before_free(&self) -> bool {
        self.record.lock().update_cleared_before_free
    }

    pub(crate) fn render_contexts_created(&self) -> usize {
        self.record.lock().render_contexts_created
    }

    pub(crate) fn render_context_frees(&self) -> usize {
        self.record.lock().render_context_frees
    }

    pub(crate) fn render_sizes(&self) -> Vec<PhysicalSize<u32>> {
        self.record.lock().render_sizes.clone()
    }

    pub(crate) fn fail_render(&self, fail: bool) {
        self.record.lock().fail_render = fail;
    }
}

struct FakeEngine {
    probe: FakeDecoderProbe,
    fail_initialize: bool,
}

impl DecoderEngine for FakeEngine {
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), DecoderError> {
        self.probe
            .record
            .lock()
            .options
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn request_log_messages(&mut self, min_level: &str) -> Result<(), DecoderError> {
        self.probe.record.lock().log_level = Some(min_level.to_string());
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), DecoderError> {
        if self.fail_initialize {
            return Err(DecoderError::Api {
                call: "initialize",
                code: -1,
                message: "fake initialization failure".to_string(),
            });
        }
        self.probe.record.lock().initialized = true;
        Ok(())
    }

    fn command_async(&mut self, args: &[&str]) -> Result<(), DecoderError> {
        if args.is_empty() {
            return Err(DecoderError::InvalidArgument("empty command".to_string()));
        }
        self.probe
            .record
            .lock()
            .commands
            .push(args.iter().map(|arg| arg.to_string()).collect());
        Ok(())
    }

    fn set_wakeup_callback(&mut self, callback: Option<Box<NotifyFn>>) {
        self.probe.record.lock().wakeup = callback.map(Arc::new);
    }

    fn next_event(&mut self) -> Option<DecoderEvent> {
        self.probe.record.lock().events.pop_front()
    }

    fn create_render_context(&mut self) -> Result<Box<dyn SoftwareRenderContext>, DecoderError> {
        self.probe.record.lock().render_contexts_created += 1;
        Ok(Box::new(FakeRenderContext {
            probe: self.probe.clone(),
            freed: false,
        }))
    }

    fn destroy(&mut self) {
        let mut record = self.probe.record.lock();
        record.wakeup_cleared_before_destroy = record.wakeup.is_none();
        record.destroy_count += 1;
    }
}

struct FakeRenderContext {
    probe: FakeDecoderProbe,
    freed: bool,
}

impl SoftwareRenderContext for FakeRenderContext {
    fn set_update_callback(&mut self, callback: Option<Box<NotifyFn>>) {
        self.probe.record.lock().update = callback.map(Arc::new);
    }

    fn frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.probe.record.lock().frame_due)
    }

    fn render(&mut self, frame: &mut FrameBuffer) -> Result<(), DecoderError> {
        assert!(!self.freed, "render after free");
        let mut record = self.probe.record.lock();
        if record.fail_render {
            return Err(DecoderError::Api {
                call: "render",
                code: -1,
                message: "fake render failure".to_string(),
            });
        }
        record.render_sizes.push(frame.size());
        frame.pixels_mut().fill(0x7f);
        Ok(())
    }

    fn free(&mut self) {
        if self.freed {
            return;
        }
        self.freed = true;
        let mut record = self.probe.record.lock();
        record.update_cleared_before_free = record.update.is_none();
        record.render_context_frees += 1;
    }
}

/// ### English
/// Factory producing fake engines; `last_probe` observes the most recent one.
///
/// ### 中文
/// 生产 fake 引擎的工厂；`last_probe` 用于观察最近创建的实例。
#[derive(Default)]
pub(crate) struct FakeDecoderFactory {
    probes: Mutex<Vec<FakeDecoderProbe>>,
    fail_initialize: Mutex<bool>,
    fail_create: Mutex<bool>,
}

impl FakeDecoderFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn last_probe(&self) -> Option<FakeDecoderProbe> {
        self.probes.lock().last().cloned()
    }

    pub(crate) fn created(&self) -> usize {
        self.probes.lock().len()
    }

    pub(crate) fn fail_initialize(&self, fail: bool) {
        *self.fail_initialize.lock() = fail;
    }

    pub(crate) fn fail_create(&self, fail: bool) {
        *self.fail_create.lock() = fail;
    }
}

impl DecoderFactory for FakeDecoderFactory {
    fn create(&self) -> Result<Box<dyn DecoderEngine>, DecoderError> {
        if *self.fail_create.lock() {
            return Err(DecoderError::LibraryNotFound("fake".to_string()));
        }
        let probe = FakeDecoderProbe::default();
        self.probes.lock().push(probe.clone());
        Ok(Box::new(FakeEngine {
            probe,
            fail_initialize: *self.fail_initialize.lock(),
        }))
    }
}

#[derive(Default)]
struct GpuRecord {
    next_id: u32,
    live_textures: HashSet<u32>,
    textures_created: usize,
    textures_destroyed: usize,
    uploads: usize,
    pipelines_destroyed: usize,
    samplers_destroyed: usize,
    draw_calls: usize,
    clears: usize,
    last_draw: Option<(PhysicalSize<u32>, u32)>,
    backends_dropped: usize,
    fail_uploads: bool,
    fail_pipeline: bool,
    fail_sampler: bool,
    on_draw: Option<DrawHook>,
}

/// ### English
/// Shared view of every `FakeGpu` created from the same probe.
///
/// ### 中文
/// 由同一 probe 创建的所有 `FakeGpu` 的共享视图。
#[derive(Clone, Default)]
pub(crate) struct FakeGpuProbe {
    record: Arc<Mutex<GpuRecord>>,
}

impl FakeGpuProbe {
    pub(crate) fn textures_created(&self) -> usize {
        self.record.lock().textures_created
    }

    pub(crate) fn textures_destroyed(&self) -> usize {
        self.record.lock().textures_destroyed
    }

    pub(crate) fn live_textures(&self) -> usize {
        self.record.lock().live_textures.len()
    }

    pub(crate) fn uploads(&self) -> usize {
        self.record.lock().uploads
    }

    pub(crate) fn pipelines_destroyed(&self) -> usize {
        self.record.lock().pipelines_destroyed
    }

    pub(crate) fn samplers_destroyed(&self) -> usize {
        self.record.lock().samplers_destroyed
    }

    pub(crate) fn draw_calls(&self) -> usize {
        self.record.lock().draw_calls
    }

    pub(crate) fn clears(&self) -> usize {
        self.record.lock().clears
    }

    pub(crate) fn last_draw(&self) -> Option<(PhysicalSize<u32>, u32)> {
        self.record.lock().last_draw
    }

    pub(crate) fn backends_dropped(&self) -> usize {
        self.record.lock().backends_dropped
    }

    pub(crate) fn fail_uploads(&self, fail: bool) {
        self.record.lock().fail_uploads = fail;
    }

    pub(crate) fn fail_pipeline(&self, fail: bool) {
        self.record.lock().fail_pipeline = fail;
    }

    pub(crate) fn fail_sampler(&self, fail: bool) {
        self.record.lock().fail_sampler = fail;
    }

    /// ### English
    /// Runs `hook` inside every clear or quad draw, after the call was recorded.
    ///
    /// ### 中文
    /// 在每次清屏或绘制四边形时（记录调用之后）执行 `hook`。
    pub(crate) fn on_draw(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.record.lock().on_draw = Some(Arc::new(hook));
    }
}

pub(crate) struct FakeGpu {
    probe: FakeGpuProbe,
    presented: Option<PresentedFrame>,
}

impl FakeGpu {
    pub(crate) fn new() -> (Self, FakeGpuProbe) {
        let probe = FakeGpuProbe::default();
        (Self::with_probe(probe.clone()), probe)
    }

    fn with_probe(probe: FakeGpuProbe) -> Self {
        Self {
            probe,
            presented: None,
        }
    }

    fn next_id(&self) -> u32 {
        let mut record = self.probe.record.lock();
        record.next_id += 1;
        record.next_id
    }

    fn present(&mut self, size: PhysicalSize<u32>) {
        let fence = self.presented.map_or(1, |frame| frame.fence + 1);
        self.presented = Some(PresentedFrame {
            texture_id: 900,
            fence,
            size,
        });
        let hook = self.probe.record.lock().on_draw.clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl GpuBackend for FakeGpu {
    fn create_pipeline(&mut self) -> Result<PipelineHandle, GpuError> {
        if self.probe.record.lock().fail_pipeline {
            return Err(GpuError::Shader("fake link failure".to_string()));
        }
        Ok(PipelineHandle(self.next_id()))
    }

    fn create_sampler(&mut self) -> Result<SamplerHandle, GpuError> {
        if self.probe.record.lock().fail_sampler {
            return Err(GpuError::Resource("fake sampler failure".to_string()));
        }
        Ok(SamplerHandle(self.next_id()))
    }

    fn create_texture(&mut self, size: PhysicalSize<u32>) -> Result<TextureHandle, GpuError> {
        let id = self.next_id();
        let mut record = self.probe.record.lock();
        record.textures_created += 1;
        record.live_textures.insert(id);
        Ok(TextureHandle { id, size })
    }

    fn upload_texture(&mut self, texture: &TextureHandle, pixels: &[u8]) -> Result<(), GpuError> {
        let mut record = self.probe.record.lock();
        if record.fail_uploads {
            return Err(GpuError::Resource("fake upload failure".to_string()));
        }
        assert!(record.live_textures.contains(&texture.id), "upload to dead texture");
        assert_eq!(
            pixels.len(),
            texture.size.width as usize * texture.size.height as usize * 4
        );
        record.uploads += 1;
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        let mut record = self.probe.record.lock();
        record.live_textures.remove(&texture.id);
        record.textures_destroyed += 1;
    }

    fn destroy_pipeline(&mut self, _pipeline: PipelineHandle) {
        self.probe.record.lock().pipelines_destroyed += 1;
    }

    fn destroy_sampler(&mut self, _sampler: SamplerHandle) {
        self.probe.record.lock().samplers_destroyed += 1;
    }

    fn clear_surface(&mut self, size: PhysicalSize<u32>) {
        self.probe.record.lock().clears += 1;
        self.present(size);
    }

    fn draw_quad(
        &mut self,
        size: PhysicalSize<u32>,
        _pipeline: PipelineHandle,
        _sampler: SamplerHandle,
        texture: &TextureHandle,
    ) {
        {
            let mut record = self.probe.record.lock();
            assert!(record.live_textures.contains(&texture.id), "draw of dead texture");
            record.draw_calls += 1;
            record.last_draw = Some((size, texture.id));
        }
        self.present(size);
    }

    fn presented_frame(&self) -> Option<PresentedFrame> {
        self.presented
    }
}

impl Drop for FakeGpu {
    fn drop(&mut self) {
        self.probe.record.lock().backends_dropped += 1;
    }
}

/// ### English
/// Factory whose backends all report into one shared probe.
///
/// ### 中文
/// 所有后端都向同一共享 probe 汇报的工厂。
#[derive(Default)]
pub(crate) struct FakeGpuFactory {
    probe: FakeGpuProbe,
    fail_create: Mutex<bool>,
}

impl FakeGpuFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn probe(&self) -> FakeGpuProbe {
        self.probe.clone()
    }

    pub(crate) fn fail_create(&self, fail: bool) {
        *self.fail_create.lock() = fail;
    }
}

impl GpuFactory for FakeGpuFactory {
    fn create(&self) -> Result<Box<dyn GpuBackend>, GpuError> {
        if *self.fail_create.lock() {
            return Err(GpuError::Context("fake context failure".to_string()));
        }
        Ok(Box::new(FakeGpu::with_probe(self.probe.clone())))
    }
}

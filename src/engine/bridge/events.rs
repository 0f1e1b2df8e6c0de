//! ### English
//! Decoder event handling on the UI thread.
//!
//! ### 中文
//! 在 UI 线程上处理解码器事件。

use std::sync::atomic::Ordering;

use crate::engine::decoder::{DecoderEvent, EndFileReason};
use crate::engine::state::StreamState;

use super::RenderBridge;

fn stream_error_message(code: i32, detail: Option<&str>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => {
            format!("stream ended with decoder error {code}: {detail}")
        }
        _ => format!("stream ended with decoder error {code}"),
    }
}

impl RenderBridge {
    /// ### English
    /// Drains pending decoder events and applies them to the stream state.
    ///
    /// Runs on the UI thread (posted by the wake-up callback).
    ///
    /// ### 中文
    /// drain 待处理的解码器事件并应用到流状态。
    ///
    /// 在 UI 线程执行（由 wake-up 回调投递）。
    pub(crate) fn drain_decoder_events(&self) {
        self.signals.wakeup_pending.store(false, Ordering::Release);
        if self.signals.shutdown.is_requested() {
            return;
        }

        let events = {
            let guard = self.lock.lock();
            let mut resources = guard.borrow_mut();
            match resources.decoder.as_mut() {
                Some(decoder) => decoder.poll_events(),
                None => Vec::new(),
            }
        };

        for event in events {
            self.apply_decoder_event(event);
        }
    }

    fn apply_decoder_event(&self, event: DecoderEvent) {
        let surface = self.id;
        match event {
            DecoderEvent::FileLoaded => {
                if self
                    .state
                    .transition(&StreamState::Connecting, StreamState::Playing)
                {
                    tracing::info!(surface, "stream playing");
                }
            }
            DecoderEvent::EndFile {
                reason: EndFileReason::Error,
                code,
                detail,
            } => {
                if matches!(
                    self.state.get(),
                    StreamState::Connecting | StreamState::Playing
                ) {
                    tracing::warn!(surface, code, detail = ?detail, "stream failed");
                    self.state
                        .set(StreamState::Error(stream_error_message(code, detail.as_deref())));
                }
            }
            DecoderEvent::EndFile {
                reason: EndFileReason::Eof | EndFileReason::Quit,
                ..
            } => {
                if !self.state.get().is_error() {
                    tracing::info!(surface, "stream ended");
                    self.state.set(StreamState::Idle);
                }
            }
            DecoderEvent::EndFile { reason, .. } => {
                tracing::debug!(surface, ?reason, "end-file ignored");
            }
            DecoderEvent::CommandFailed { code, detail } => {
                tracing::warn!(surface, code, detail = ?detail, "decoder command failed");
            }
            DecoderEvent::Shutdown => {
                tracing::debug!(surface, "decoder engine shut down");
            }
            DecoderEvent::Log { .. } => {}
        }
    }
}

//! Upload widget state
//!
//! `UploadWidget` owns everything the screen shows: the selected file, its
//! preview, the in-flight transfer, the result text and the notification.
//! It performs no I/O. Callers start async work from the requests it hands
//! out and feed the results back with the generation they were started
//! with; results from superseded work are dropped.

pub mod notification;
pub mod result;
pub mod state;

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{ClipboardError, UploadError, ValidationError};
use crate::preview::Preview;
use crate::transfer::TransferEvent;

pub use notification::{Notification, Notifier, Severity};
pub use state::{Generation, Phase, SelectedFile, TransferState};

pub const MSG_PROCESSED: &str = "Image processed successfully!";
pub const MSG_COPIED: &str = "Copied to clipboard!";

#[derive(Debug, Clone, Copy)]
pub struct WidgetOptions {
    pub notification_window: Duration,
    pub result_min_rows: u16,
    pub result_max_rows: u16,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            notification_window: notification::DEFAULT_VISIBLE_FOR,
            result_min_rows: result::DEFAULT_MIN_ROWS,
            result_max_rows: result::DEFAULT_MAX_ROWS,
        }
    }
}

/// Ask the caller to read and decode a preview for `path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    pub generation: Generation,
    pub path: PathBuf,
}

/// Ask the caller to upload `file`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTicket {
    pub generation: Generation,
    pub file: SelectedFile,
}

/// Ask the caller to put `text` on the clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub generation: Generation,
    pub text: String,
}

/// What the screen shows, without content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub drop_target_visible: bool,
    pub preview_visible: bool,
    pub convert_enabled: bool,
    pub progress_visible: bool,
    pub result_visible: bool,
    pub notification: Option<(String, Severity)>,
}

#[derive(Debug)]
pub struct UploadWidget {
    options: WidgetOptions,

    selected: Option<SelectedFile>,
    preview: Option<Preview>,
    drop_target_visible: bool,

    transfer: TransferState,
    result: Option<String>,
    result_scroll: u16,

    notifier: Notifier,

    preview_gen: Generation,
    transfer_gen: Generation,
    copy_gen: Generation,
}

impl Default for UploadWidget {
    fn default() -> Self {
        Self::new(WidgetOptions::default())
    }
}

impl UploadWidget {
    pub fn new(options: WidgetOptions) -> Self {
        Self {
            options,
            selected: None,
            preview: None,
            drop_target_visible: true,
            transfer: TransferState::default(),
            result: None,
            result_scroll: 0,
            notifier: Notifier::new(options.notification_window),
            preview_gen: Generation::default(),
            transfer_gen: Generation::default(),
            copy_gen: Generation::default(),
        }
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn preview_loading(&self) -> bool {
        self.selected.is_some() && self.preview.is_none()
    }

    pub fn drop_target_visible(&self) -> bool {
        self.drop_target_visible
    }

    pub fn transfer(&self) -> &TransferState {
        &self.transfer
    }

    pub fn progress_visible(&self) -> bool {
        self.transfer.is_active()
    }

    pub fn convert_enabled(&self) -> bool {
        self.selected.is_some() && !self.transfer.is_active()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn result_scroll(&self) -> u16 {
        self.result_scroll
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifier.current()
    }

    pub fn view(&self) -> WidgetView {
        WidgetView {
            drop_target_visible: self.drop_target_visible,
            preview_visible: self.preview.is_some(),
            convert_enabled: self.convert_enabled(),
            progress_visible: self.progress_visible(),
            result_visible: self.result.is_some(),
            notification: self
                .notifier
                .current()
                .map(|n| (n.message.clone(), n.severity)),
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        self.notifier.show(message, severity, now);
    }

    /// A file was picked, dropped, or the selection was cleared (`None`)
    pub fn select(&mut self, file: Option<SelectedFile>, now: Instant) -> Option<PreviewRequest> {
        // any preview read still running belongs to an older selection
        let generation = self.preview_gen.bump();
        self.preview = None;

        match file {
            None => {
                debug!("Selection cleared");
                self.selected = None;
                self.drop_target_visible = true;
                None
            }
            Some(file) if !file.is_image() => {
                let err = ValidationError::NotAnImage {
                    name: file.name.clone(),
                    media_type: file.media_type.clone(),
                };
                info!(error = %err, "Rejected selection");
                self.selected = None;
                self.drop_target_visible = true;
                self.notify(err.notification_text(), Severity::Error, now);
                None
            }
            Some(file) => {
                info!(
                    file_name = %file.name,
                    media_type = %file.media_type,
                    file_size = file.size,
                    "File selected"
                );
                let path = file.path.clone();
                self.selected = Some(file);
                Some(PreviewRequest { generation, path })
            }
        }
    }

    /// Apply a finished preview read. Returns false when it was stale.
    pub fn apply_preview(
        &mut self,
        generation: Generation,
        outcome: std::io::Result<Preview>,
        now: Instant,
    ) -> bool {
        if generation != self.preview_gen {
            debug!(?generation, current = ?self.preview_gen, "Dropping stale preview");
            return false;
        }

        match outcome {
            Ok(preview) => {
                self.preview = Some(preview);
                self.drop_target_visible = false;
            }
            Err(e) => {
                let name = self
                    .selected
                    .take()
                    .map(|f| f.name)
                    .unwrap_or_else(|| "file".to_string());
                let err = ValidationError::Unreadable {
                    name,
                    reason: e.to_string(),
                };
                warn!(error = %err, "Preview read failed");
                self.preview = None;
                self.drop_target_visible = true;
                self.notify(err.notification_text(), Severity::Error, now);
            }
        }
        true
    }

    /// Start a transfer of the selected file
    pub fn submit(&mut self, now: Instant) -> Result<TransferTicket, ValidationError> {
        let Some(file) = self.selected.clone() else {
            let err = ValidationError::NoFileSelected;
            self.notify(err.notification_text(), Severity::Error, now);
            return Err(err);
        };

        if self.transfer.is_active() {
            warn!("Submitting while a transfer is in flight; the earlier one will be ignored");
        }

        self.result = None;
        self.result_scroll = 0;
        self.transfer = TransferState::started();
        let generation = self.transfer_gen.bump();

        info!(?generation, file_name = %file.name, "Transfer started");
        Ok(TransferTicket { generation, file })
    }

    pub fn apply_transfer(&mut self, generation: Generation, event: TransferEvent) -> bool {
        if generation != self.transfer_gen || !self.transfer.is_active() {
            return false;
        }
        match event {
            TransferEvent::Progress { sent, total } => self.transfer.record_progress(sent, total),
            TransferEvent::BodySent => {
                debug!(?generation, "Request body sent, waiting for server");
                self.transfer.body_sent();
            }
        }
        true
    }

    /// The request settled. Returns the final phase, or `None` when stale.
    pub fn settle(
        &mut self,
        generation: Generation,
        outcome: Result<String, UploadError>,
        now: Instant,
    ) -> Option<Phase> {
        if generation != self.transfer_gen || !self.transfer.is_active() {
            debug!(?generation, "Dropping stale transfer outcome");
            return None;
        }

        self.transfer = TransferState::default();

        let phase = match outcome {
            Ok(body) => {
                self.result = Some(result::display_text(&body));
                self.result_scroll = 0;
                self.notify(MSG_PROCESSED, Severity::Success, now);
                Phase::Done
            }
            Err(e) => {
                warn!(error = %e, transport = e.is_transport(), "Transfer failed");
                self.result = None;
                self.notify(e.notification_text(), Severity::Error, now);
                Phase::Failed
            }
        };
        info!(?generation, ?phase, "Transfer settled");
        Some(phase)
    }

    /// Copy is only offered while a result is shown
    pub fn copy_request(&mut self) -> Option<CopyRequest> {
        let text = self.result.clone()?;
        let generation = self.copy_gen.bump();
        Some(CopyRequest { generation, text })
    }

    pub fn apply_copy(
        &mut self,
        generation: Generation,
        outcome: Result<(), ClipboardError>,
        now: Instant,
    ) -> bool {
        if generation != self.copy_gen {
            return false;
        }
        match outcome {
            Ok(()) => self.notify(MSG_COPIED, Severity::Success, now),
            Err(e) => {
                warn!(error = %e, "Clipboard write failed");
                self.notify(e.notification_text(), Severity::Error, now);
            }
        }
        true
    }

    /// Back to a fresh widget; everything still running becomes stale
    pub fn reset(&mut self) {
        let mut fresh = Self::new(self.options);
        fresh.preview_gen = Generation(self.preview_gen.0 + 1);
        fresh.transfer_gen = Generation(self.transfer_gen.0 + 1);
        fresh.copy_gen = Generation(self.copy_gen.0 + 1);
        *self = fresh;
        info!("Widget reset");
    }

    pub fn tick(&mut self, now: Instant) {
        self.notifier.tick(now);
    }

    /// Rows the bordered result pane should take at the given inner width
    pub fn result_rows(&self, inner_width: u16) -> u16 {
        let text = self.result.as_deref().unwrap_or("");
        result::fitted_rows(
            text,
            inner_width,
            self.options.result_min_rows,
            self.options.result_max_rows,
        )
    }

    pub fn scroll_result(&mut self, delta: i32, inner_width: u16, visible_rows: u16) {
        let Some(text) = self.result.as_deref() else {
            return;
        };
        let lines = result::wrapped_lines(text, inner_width);
        let max_scroll = lines.saturating_sub(visible_rows);
        let next = (self.result_scroll as i32 + delta).clamp(0, max_scroll as i32);
        self.result_scroll = next as u16;
    }
}

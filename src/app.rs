use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::clipboard::ClipboardSink;
use crate::config::AppConfig;
use crate::error::{ClipboardError, UploadError, ValidationError};
use crate::preview::Preview;
use crate::transfer::{ProgressSink, TransferEvent, Uploader};
use crate::widget::{Generation, SelectedFile, Severity, UploadWidget};

/// Image extensions the file browser lists
const BROWSABLE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "ico", "pnm", "tga",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    FileBrowser,
    Help,
}

/// Completion of async work started by the app
#[derive(Debug)]
pub enum AppEvent {
    Preview {
        generation: Generation,
        outcome: std::io::Result<Preview>,
    },
    Transfer {
        generation: Generation,
        event: TransferEvent,
    },
    Settled {
        generation: Generation,
        outcome: Result<String, UploadError>,
    },
    Copied {
        generation: Generation,
        outcome: Result<(), ClipboardError>,
    },
}

#[derive(Debug, Clone)]
pub struct BrowserEntry {
    pub name: String,
    pub is_dir: bool,
    pub path: PathBuf,
}

pub struct App {
    pub widget: UploadWidget,
    pub popup: Popup,
    pub config: AppConfig,

    // File browser state
    pub browser_path: PathBuf,
    pub browser_entries: Vec<BrowserEntry>,
    pub browser_selected: usize,

    // Result pane geometry from the last draw (inner width, visible rows)
    pub result_area: Cell<(u16, u16)>,

    uploader: Uploader,
    clipboard: Arc<dyn ClipboardSink>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(config: AppConfig, uploader: Uploader, clipboard: Arc<dyn ClipboardSink>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let browser_path = config
            .browser_start_dir
            .clone()
            .filter(|p| p.is_dir())
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"));

        Self {
            widget: UploadWidget::new(config.widget_options()),
            popup: Popup::None,
            config,
            browser_path,
            browser_entries: Vec::new(),
            browser_selected: 0,
            result_area: Cell::new((0, 0)),
            uploader,
            clipboard,
            events_tx,
            events_rx,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.uploader.endpoint()
    }

    /// The config file was unusable and defaults are in effect
    pub fn report_config_error(&mut self, err: &anyhow::Error) {
        self.widget
            .notify(format!("Config ignored: {:#}", err), Severity::Error, Instant::now());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }

        match key.code {
            // Open the file browser (the drop target's click)
            KeyCode::Char('o') => self.start_file_browser(),

            // Convert
            KeyCode::Enter | KeyCode::Char('c') if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.convert()
            }

            // Copy result
            KeyCode::Char('y') => self.copy_result(),

            // Clear everything
            KeyCode::Char('x') => self.reset(),

            // Drop the current selection
            KeyCode::Char('d') | KeyCode::Delete => {
                self.widget.select(None, Instant::now());
            }

            // Result scrolling
            KeyCode::Char('j') | KeyCode::Down => self.scroll_result(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_result(-1),
            KeyCode::PageDown => self.scroll_result(self.page_rows()),
            KeyCode::PageUp => self.scroll_result(-self.page_rows()),

            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::FileBrowser => self.handle_browser_key(key),
            Popup::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')
                ) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::None => Ok(()),
        }
    }

    /// Text pasted into the terminal, which is how a dropped file arrives
    pub fn handle_paste(&mut self, text: &str) {
        if self.popup == Popup::FileBrowser {
            self.popup = Popup::None;
        }
        match crate::drop::first_dropped_path(text) {
            Some(path) => self.select_path(&path),
            None => {
                self.widget.select(None, Instant::now());
            }
        }
    }

    /// Select a file from disk and start reading its preview
    pub fn select_path(&mut self, path: &Path) {
        let now = Instant::now();
        let file = match SelectedFile::from_path(path) {
            Ok(file) => file,
            Err(e) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                let err = ValidationError::Unreadable {
                    name,
                    reason: e.to_string(),
                };
                tracing::warn!(error = %err, "Cannot select file");
                self.widget.select(None, now);
                self.widget.notify(err.notification_text(), Severity::Error, now);
                return;
            }
        };

        if let Some(request) = self.widget.select(Some(file), now) {
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let outcome = crate::preview::load(request.path).await;
                let _ = tx.send(AppEvent::Preview {
                    generation: request.generation,
                    outcome,
                });
            });
        }
    }

    fn convert(&mut self) {
        // the convert control is disabled while a request is in flight
        if self.widget.progress_visible() {
            return;
        }
        let Ok(ticket) = self.widget.submit(Instant::now()) else {
            return;
        };

        let uploader = self.uploader.clone();
        let tx = self.events_tx.clone();
        let generation = ticket.generation;
        let progress_tx = tx.clone();
        let sink: ProgressSink = Arc::new(move |event| {
            let _ = progress_tx.send(AppEvent::Transfer { generation, event });
        });

        tokio::spawn(async move {
            let outcome = uploader.upload(&ticket.file, sink).await;
            let _ = tx.send(AppEvent::Settled { generation, outcome });
        });
    }

    fn copy_result(&mut self) {
        let Some(request) = self.widget.copy_request() else {
            return;
        };
        let clipboard = self.clipboard.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = crate::clipboard::copy_text(clipboard, request.text).await;
            let _ = tx.send(AppEvent::Copied {
                generation: request.generation,
                outcome,
            });
        });
    }

    /// Back to the initial screen; pending work is discarded when it lands
    pub fn reset(&mut self) {
        self.widget.reset();
        self.popup = Popup::None;
    }

    fn page_rows(&self) -> i32 {
        (self.result_area.get().1 as i32 - 1).max(1)
    }

    fn scroll_result(&mut self, delta: i32) {
        let (width, rows) = self.result_area.get();
        self.widget.scroll_result(delta, width, rows);
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        let now = Instant::now();
        match event {
            AppEvent::Preview { generation, outcome } => {
                self.widget.apply_preview(generation, outcome, now);
            }
            AppEvent::Transfer { generation, event } => {
                self.widget.apply_transfer(generation, event);
            }
            AppEvent::Settled { generation, outcome } => {
                self.widget.settle(generation, outcome, now);
            }
            AppEvent::Copied { generation, outcome } => {
                self.widget.apply_copy(generation, outcome, now);
            }
        }
    }

    /// Apply everything async work has finished since the last frame
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Wait for the next completion; used where there is no frame loop
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    pub fn tick(&mut self) {
        self.drain_events();
        self.widget.tick(Instant::now());
    }

    fn start_file_browser(&mut self) {
        self.popup = Popup::FileBrowser;
        self.browser_selected = 0;
        self.refresh_browser();
    }

    fn refresh_browser(&mut self) {
        self.browser_entries.clear();

        // Add parent directory entry if not at root
        if let Some(parent) = self.browser_path.parent() {
            self.browser_entries.push(BrowserEntry {
                name: "..".to_string(),
                is_dir: true,
                path: parent.to_path_buf(),
            });
        }

        match std::fs::read_dir(&self.browser_path) {
            Ok(entries) => {
                let mut dirs: Vec<BrowserEntry> = Vec::new();
                let mut files: Vec<BrowserEntry> = Vec::new();

                for entry in entries.flatten() {
                    let path = entry.path();
                    let name = entry.file_name().to_string_lossy().to_string();

                    // Skip hidden files
                    if name.starts_with('.') {
                        continue;
                    }

                    if path.is_dir() {
                        dirs.push(BrowserEntry { name, is_dir: true, path });
                    } else if is_browsable_image(&path) {
                        files.push(BrowserEntry { name, is_dir: false, path });
                    }
                }

                dirs.sort_by_key(|a| a.name.to_lowercase());
                files.sort_by_key(|a| a.name.to_lowercase());

                self.browser_entries.extend(dirs);
                self.browser_entries.extend(files);
            }
            Err(e) => tracing::warn!(path = %self.browser_path.display(), "Cannot list directory: {}", e),
        }

        if self.browser_selected >= self.browser_entries.len() {
            self.browser_selected = 0;
        }
    }

    fn handle_browser_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.popup = Popup::None;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.browser_entries.is_empty() {
                    self.browser_selected = (self.browser_selected + 1) % self.browser_entries.len();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if !self.browser_entries.is_empty() {
                    self.browser_selected = self
                        .browser_selected
                        .checked_sub(1)
                        .unwrap_or(self.browser_entries.len() - 1);
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(entry) = self.browser_entries.get(self.browser_selected).cloned() {
                    if entry.is_dir {
                        self.browser_path = entry.path;
                        self.browser_selected = 0;
                        self.refresh_browser();
                    } else {
                        self.popup = Popup::None;
                        self.select_path(&entry.path);
                    }
                }
            }
            KeyCode::Backspace => {
                if let Some(parent) = self.browser_path.parent() {
                    self.browser_path = parent.to_path_buf();
                    self.browser_selected = 0;
                    self.refresh_browser();
                }
            }
            KeyCode::Char('~') => {
                if let Some(home) = dirs::home_dir() {
                    self.browser_path = home;
                    self.browser_selected = 0;
                    self.refresh_browser();
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn is_browsable_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| BROWSABLE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

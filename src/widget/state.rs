use std::path::{Path, PathBuf};

pub const MEDIA_TYPE_UNKNOWN: &str = "application/octet-stream";

/// The file currently chosen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub path: PathBuf,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let media_type = declared_media_type(&path);
        Self {
            name,
            media_type,
            path,
            size,
        }
    }

    /// Build from a path on disk, reading only its metadata
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let meta = std::fs::metadata(&path)?;
        if meta.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            ));
        }
        Ok(Self::new(path, meta.len()))
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Media type as a browser would declare it: from the extension, not the bytes
pub fn declared_media_type(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| MEDIA_TYPE_UNKNOWN.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Processing,
    Done,
    Failed,
}

/// Percentage the indicator is parked at while the server works
pub const PROCESSING_PERCENT: u16 = 95;
pub const PROCESSING_LABEL: &str = "Processing…";

/// Progress of the one in-flight request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferState {
    pub sent: u64,
    pub total: u64,
    pub phase: Phase,
    pub percent: u16,
}

impl TransferState {
    pub fn started() -> Self {
        Self {
            phase: Phase::Uploading,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Uploading | Phase::Processing)
    }

    /// Record bytes handed to the transport. Percent never goes down and
    /// stays put while the total is unknown.
    pub fn record_progress(&mut self, sent: u64, total: u64) {
        if self.phase != Phase::Uploading {
            return;
        }
        self.sent = sent;
        self.total = total;
        if total == 0 {
            return;
        }
        let percent = ((sent as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u16;
        self.percent = self.percent.max(percent);
    }

    pub fn body_sent(&mut self) {
        if self.is_active() {
            self.phase = Phase::Processing;
            self.percent = PROCESSING_PERCENT;
        }
    }

    pub fn label(&self) -> String {
        match self.phase {
            Phase::Processing => PROCESSING_LABEL.to_string(),
            _ => format!("{}%", self.percent),
        }
    }
}

/// Counter handed to async work; results carrying a stale value are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    pub fn bump(&mut self) -> Generation {
        self.0 += 1;
        *self
    }
}

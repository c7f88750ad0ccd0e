use std::path::PathBuf;
use thiserror::Error;

pub const MSG_NOT_AN_IMAGE: &str = "Please select an image file.";
pub const MSG_NO_FILE: &str = "Please upload an image first.";
pub const MSG_CONVERSION_FAILED: &str = "Conversion failed.";
pub const MSG_NETWORK_ERROR: &str = "Network error. Please try again.";
pub const MSG_COPY_FAILED: &str = "Copy failed. Please copy manually.";

/// Rejected before any network call is made
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("{name} is not an image ({media_type})")]
    NotAnImage { name: String, media_type: String },

    #[error("could not read {name}: {reason}")]
    Unreadable { name: String, reason: String },
}

impl ValidationError {
    pub fn notification_text(&self) -> String {
        match self {
            ValidationError::NoFileSelected => MSG_NO_FILE.to_string(),
            ValidationError::NotAnImage { .. } => MSG_NOT_AN_IMAGE.to_string(),
            ValidationError::Unreadable { name, .. } => format!("Could not read {}.", name),
        }
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid upload request: {0}")]
    Request(String),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {status}")]
    Server { status: u16, body: String },
}

impl UploadError {
    /// Text for the notification area. Server bodies are shown verbatim.
    pub fn notification_text(&self) -> String {
        match self {
            UploadError::Server { body, .. } if !body.trim().is_empty() => body.clone(),
            UploadError::Server { .. } | UploadError::Read { .. } | UploadError::Request(_) => {
                MSG_CONVERSION_FAILED.to_string()
            }
            UploadError::Transport(_) => MSG_NETWORK_ERROR.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, UploadError::Transport(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write failed: {0}")]
    Write(String),
}

impl ClipboardError {
    pub fn notification_text(&self) -> String {
        MSG_COPY_FAILED.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_body_shown_verbatim() {
        let err = UploadError::Server {
            status: 413,
            body: "File too large".to_string(),
        };
        assert_eq!(err.notification_text(), "File too large");
    }

    #[test]
    fn test_blank_server_body_falls_back() {
        for body in ["", "  \n"] {
            let err = UploadError::Server {
                status: 500,
                body: body.to_string(),
            };
            assert_eq!(err.notification_text(), MSG_CONVERSION_FAILED);
        }
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(ValidationError::NoFileSelected.notification_text(), MSG_NO_FILE);
        let err = ValidationError::NotAnImage {
            name: "notes.txt".to_string(),
            media_type: "application/octet-stream".to_string(),
        };
        assert_eq!(err.notification_text(), MSG_NOT_AN_IMAGE);
    }

    #[test]
    fn test_clipboard_message() {
        let err = ClipboardError::Unavailable("no display".to_string());
        assert_eq!(err.notification_text(), MSG_COPY_FAILED);
    }
}

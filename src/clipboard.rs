use std::sync::Arc;

use crate::error::ClipboardError;

/// Where copied result text goes
pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard via arboard
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// Write on a blocking thread; clipboard backends may talk to the display server
pub async fn copy_text(sink: Arc<dyn ClipboardSink>, text: String) -> Result<(), ClipboardError> {
    tokio::task::spawn_blocking(move || sink.set_text(&text))
        .await
        .map_err(|e| ClipboardError::Write(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    impl ClipboardSink for Recording {
        fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Denied;

    impl ClipboardSink for Denied {
        fn set_text(&self, _text: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError::Unavailable("permission denied".to_string()))
        }
    }

    #[tokio::test]
    async fn test_copy_text_reaches_sink() {
        let sink = Arc::new(Recording::default());
        copy_text(sink.clone(), "hello world".to_string()).await.unwrap();
        assert_eq!(*sink.0.lock().unwrap(), vec!["hello world".to_string()]);
    }

    #[tokio::test]
    async fn test_copy_text_error_is_returned() {
        let err = copy_text(Arc::new(Denied), "x".to_string()).await.unwrap_err();
        assert!(matches!(err, ClipboardError::Unavailable(_)));
    }
}

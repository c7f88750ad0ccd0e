//! End-to-end tests against an in-process `/upload` endpoint

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Router,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ocrdrop::app::{App, AppEvent};
use ocrdrop::clipboard::ClipboardSink;
use ocrdrop::config::AppConfig;
use ocrdrop::error::{ClipboardError, UploadError, MSG_CONVERSION_FAILED, MSG_NETWORK_ERROR};
use ocrdrop::transfer::{ProgressSink, TransferEvent, Uploader};
use ocrdrop::widget::{Phase, SelectedFile, Severity, MSG_COPIED, MSG_PROCESSED};

/// What the mock endpoint answers once it has found the `image` field.
/// `body: None` echoes `file_name|content_type|length`.
#[derive(Clone)]
struct Reply {
    status: StatusCode,
    body: Option<&'static str>,
}

async fn upload_handler(State(reply): State<Reply>, mut multipart: Multipart) -> (StatusCode, String) {
    let mut seen = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            let name = field.file_name().unwrap_or("").to_string();
            let content_type = field.content_type().unwrap_or("").to_string();
            let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            seen = Some(format!("{}|{}|{}", name, content_type, len));
        }
    }

    match (seen, reply.body) {
        (None, _) => (StatusCode::BAD_REQUEST, "No file selected.".to_string()),
        (Some(echo), None) => (reply.status, echo),
        (Some(_), Some(body)) => (reply.status, body.to_string()),
    }
}

async fn spawn_server(reply: Reply) -> String {
    let app = Router::new()
        .route("/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .with_state(reply);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/upload", addr)
}

/// An endpoint nothing listens on
async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/upload", addr)
}

#[derive(Default)]
struct RecordingClipboard(Mutex<Vec<String>>);

impl ClipboardSink for RecordingClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn write_noise_jpeg(path: &Path) {
    let mut seed: u32 = 0x2545_f491;
    let img = image::RgbImage::from_fn(1024, 768, |_, _| {
        let mut px = [0u8; 3];
        for c in px.iter_mut() {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            *c = (seed & 0xff) as u8;
        }
        image::Rgb(px)
    });
    let mut out = std::fs::File::create(path).unwrap();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 100);
    encoder.encode_image(&img).unwrap();
}

fn write_small_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_pixel(16, 16, image::Rgb([200, 200, 200]))
        .save(&path)
        .unwrap();
    path
}

fn test_app(endpoint: &str, clipboard: Arc<RecordingClipboard>) -> App {
    let config = AppConfig {
        endpoint: endpoint.to_string(),
        ..Default::default()
    };
    let uploader = Uploader::new(&config.endpoint, &config.field_name, Duration::from_secs(10)).unwrap();
    App::new(config, uploader, clipboard)
}

async fn next(app: &mut App) -> AppEvent {
    tokio::time::timeout(Duration::from_secs(20), app.next_event())
        .await
        .expect("async work finished in time")
        .expect("event channel open")
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
}

/// Select `path`, wait for its preview, press convert and run the transfer
/// to completion. Returns the percent/label seen after each transfer event.
async fn convert(app: &mut App, path: &Path) -> Vec<(Phase, u16, String)> {
    app.select_path(path);
    let preview = next(app).await;
    assert!(matches!(preview, AppEvent::Preview { .. }));
    app.handle_event(preview);

    press(app, KeyCode::Enter);
    assert!(app.widget.progress_visible());

    let mut seen = Vec::new();
    while app.widget.progress_visible() {
        let event = next(app).await;
        let is_transfer = matches!(event, AppEvent::Transfer { .. });
        app.handle_event(event);
        if is_transfer {
            let t = app.widget.transfer();
            seen.push((t.phase, t.percent, t.label()));
        }
    }
    seen
}

#[tokio::test]
async fn test_end_to_end_success() {
    let endpoint = spawn_server(Reply {
        status: StatusCode::OK,
        body: Some(" hello world \n"),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.jpg");
    write_noise_jpeg(&path);
    assert!(std::fs::metadata(&path).unwrap().len() > 1024 * 1024);

    let clipboard = Arc::new(RecordingClipboard::default());
    let mut app = test_app(&endpoint, clipboard.clone());

    app.select_path(&path);
    assert!(app.widget.convert_enabled());
    let preview = next(&mut app).await;
    app.handle_event(preview);
    assert!(app.widget.preview().unwrap().is_renderable());
    assert!(!app.widget.drop_target_visible());

    press(&mut app, KeyCode::Enter);
    assert!(!app.widget.convert_enabled());
    assert_eq!(app.widget.transfer().label(), "0%");

    let mut seen = Vec::new();
    while app.widget.progress_visible() {
        let event = next(&mut app).await;
        let is_transfer = matches!(event, AppEvent::Transfer { .. });
        app.handle_event(event);
        if is_transfer && app.widget.progress_visible() {
            let t = app.widget.transfer();
            seen.push((t.phase, t.percent, t.label()));
        }
    }

    // uploading percentages rise monotonically to 100
    let uploading: Vec<u16> = seen
        .iter()
        .filter(|(phase, _, _)| *phase == Phase::Uploading)
        .map(|(_, p, _)| *p)
        .collect();
    assert!(uploading.len() > 1);
    assert!(uploading.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*uploading.last().unwrap(), 100);

    // then pinned at 95 while the server works
    let (phase, percent, label) = seen.last().unwrap().clone();
    assert_eq!(phase, Phase::Processing);
    assert_eq!(percent, 95);
    assert_eq!(label, "Processing…");

    assert_eq!(app.widget.result(), Some("hello world"));
    let note = app.widget.notification().unwrap();
    assert_eq!((note.message.as_str(), note.severity), (MSG_PROCESSED, Severity::Success));
    assert!(!app.widget.progress_visible());
    assert!(app.widget.convert_enabled());

    // copy the result
    press(&mut app, KeyCode::Char('y'));
    let copied = next(&mut app).await;
    app.handle_event(copied);
    assert_eq!(app.widget.notification().unwrap().message, MSG_COPIED);
    assert_eq!(*clipboard.0.lock().unwrap(), vec!["hello world".to_string()]);
}

#[tokio::test]
async fn test_server_error_body_shown() {
    let endpoint = spawn_server(Reply {
        status: StatusCode::PAYLOAD_TOO_LARGE,
        body: Some("File too large"),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_small_png(dir.path(), "page.png");
    let mut app = test_app(&endpoint, Arc::new(RecordingClipboard::default()));

    convert(&mut app, &path).await;

    let note = app.widget.notification().unwrap();
    assert_eq!(note.message, "File too large");
    assert_eq!(note.severity, Severity::Error);
    assert!(app.widget.result().is_none());
    assert!(app.widget.convert_enabled());
}

#[tokio::test]
async fn test_server_error_without_body_uses_fallback() {
    let endpoint = spawn_server(Reply {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: Some(""),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_small_png(dir.path(), "page.png");
    let mut app = test_app(&endpoint, Arc::new(RecordingClipboard::default()));

    convert(&mut app, &path).await;

    assert_eq!(app.widget.notification().unwrap().message, MSG_CONVERSION_FAILED);
    assert!(app.widget.result().is_none());
}

#[tokio::test]
async fn test_blank_success_shows_placeholder() {
    let endpoint = spawn_server(Reply {
        status: StatusCode::OK,
        body: Some("  \n "),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_small_png(dir.path(), "blank.png");
    let mut app = test_app(&endpoint, Arc::new(RecordingClipboard::default()));

    let seen = convert(&mut app, &path).await;

    assert!(!seen.is_empty());
    assert_eq!(app.widget.result(), Some("(No text detected)"));
}

#[tokio::test]
async fn test_transport_failure() {
    let endpoint = dead_endpoint().await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_small_png(dir.path(), "page.png");
    let mut app = test_app(&endpoint, Arc::new(RecordingClipboard::default()));

    convert(&mut app, &path).await;

    assert_eq!(app.widget.notification().unwrap().message, MSG_NETWORK_ERROR);
    assert!(app.widget.convert_enabled());
    assert!(!app.widget.progress_visible());
}

#[tokio::test]
async fn test_multipart_part_carries_name_and_type() {
    let endpoint = spawn_server(Reply {
        status: StatusCode::OK,
        body: None,
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_small_png(dir.path(), "receipt.png");
    let size = std::fs::metadata(&path).unwrap().len();

    let uploader = Uploader::new(&endpoint, "image", Duration::from_secs(10)).unwrap();
    let file = SelectedFile::from_path(&path).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    let sink: ProgressSink = Arc::new(move |ev| captured.lock().unwrap().push(ev));

    let body = uploader.upload(&file, sink).await.unwrap();
    assert_eq!(body, format!("receipt.png|image/png|{}", size));

    let events = events.lock().unwrap().clone();
    assert_eq!(events.last(), Some(&TransferEvent::BodySent));
    assert!(events.contains(&TransferEvent::Progress { sent: size, total: size }));
}

#[tokio::test]
async fn test_wrong_field_name_reports_server_message() {
    let endpoint = spawn_server(Reply {
        status: StatusCode::OK,
        body: Some("unused"),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_small_png(dir.path(), "page.png");

    let uploader = Uploader::new(&endpoint, "file", Duration::from_secs(10)).unwrap();
    let file = SelectedFile::from_path(&path).unwrap();
    let err = uploader.upload(&file, Arc::new(|_| {})).await.unwrap_err();

    match err {
        UploadError::Server { status, ref body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "No file selected.");
        }
        other => panic!("Expected server error, got {:?}", other),
    }
    assert_eq!(err.notification_text(), "No file selected.");
}

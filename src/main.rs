use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ocrdrop::app::{App, Popup};
use ocrdrop::clipboard::SystemClipboard;
use ocrdrop::config::AppConfig;
use ocrdrop::error::ValidationError;
use ocrdrop::theme::Theme;
use ocrdrop::transfer::{ProgressSink, TransferEvent, Uploader};
use ocrdrop::ui;
use ocrdrop::widget::{result, SelectedFile, Severity, TransferState};

#[derive(Parser, Debug)]
#[command(name = "ocrdrop")]
#[command(version)]
#[command(about = "Drop an image in the terminal, get its text back")]
struct Args {
    /// Text-extraction endpoint, e.g. http://127.0.0.1:5000/upload
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Multipart field the image is sent under
    #[arg(long)]
    field: Option<String>,

    /// Start the TUI with this image selected
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Upload an image without the TUI and print the extracted text
    #[arg(short, long, value_name = "IMAGE")]
    upload: Option<PathBuf>,

    /// Print the headless result as JSON
    #[arg(long, requires = "upload")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let headless = args.upload.is_some();

    init_logging(headless);

    let (mut config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            tracing::warn!("Using default config: {:#}", e);
            (AppConfig::default(), Some(e))
        }
    };
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(field) = args.field {
        config.field_name = field;
    }
    config.validate().context("Invalid configuration")?;

    if let Some(path) = args.upload {
        return run_headless(&config, &path, args.json).await;
    }

    run_tui(config, args.file, config_error).await
}

/// The TUI owns the terminal, so it logs to a file; headless logs to stderr
fn init_logging(headless: bool) {
    let default_filter = if headless { "ocrdrop=warn" } else { "ocrdrop=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if headless {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
        return;
    }

    match open_log_file() {
        Some(file) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init(),
        None => tracing_subscriber::registry()
            .with(EnvFilter::new("off"))
            .init(),
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join("ocrdrop");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("ocrdrop.log"))
        .ok()
}

async fn run_headless(config: &AppConfig, path: &Path, json: bool) -> Result<()> {
    let file = SelectedFile::from_path(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    if !file.is_image() {
        let err = ValidationError::NotAnImage {
            name: file.name.clone(),
            media_type: file.media_type.clone(),
        };
        anyhow::bail!(err.notification_text());
    }

    let uploader = Uploader::new(&config.endpoint, &config.field_name, config.request_timeout())?;

    let state = Arc::new(Mutex::new(TransferState::started()));
    let show_progress = !json;
    let sink: ProgressSink = Arc::new(move |event| {
        let Ok(mut state) = state.lock() else {
            return;
        };
        match event {
            TransferEvent::Progress { sent, total } => state.record_progress(sent, total),
            TransferEvent::BodySent => state.body_sent(),
        }
        if show_progress {
            eprint!("\r\x1b[2K{}", state.label());
        }
    });

    let outcome = uploader.upload(&file, sink).await;
    if show_progress {
        eprint!("\r\x1b[2K");
    }

    match outcome {
        Ok(body) => {
            let text = result::display_text(&body);
            if json {
                let output = serde_json::json!({
                    "status": "done",
                    "file": file.name,
                    "bytes": file.size,
                    "text": text,
                });
                println!("{}", serde_json::to_string(&output)?);
            } else {
                println!("{}", text);
            }
            if config.desktop_notifications {
                notify("ocrdrop", ocrdrop::widget::MSG_PROCESSED, Severity::Success);
            }
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Headless upload failed");
            let message = e.notification_text();
            if json {
                let output = serde_json::json!({
                    "status": "failed",
                    "file": file.name,
                    "bytes": file.size,
                    "error": message,
                });
                println!("{}", serde_json::to_string(&output)?);
            }
            if config.desktop_notifications {
                notify("ocrdrop", &message, Severity::Error);
            }
            Err(anyhow::anyhow!(message))
        }
    }
}

async fn run_tui(
    config: AppConfig,
    initial_file: Option<PathBuf>,
    config_error: Option<anyhow::Error>,
) -> Result<()> {
    ui::init_theme(Theme::from_overrides(&config.theme));

    let uploader = Uploader::new(&config.endpoint, &config.field_name, config.request_timeout())?;
    let mut app = App::new(config, uploader, Arc::new(SystemClipboard));
    if let Some(e) = &config_error {
        app.report_config_error(e);
    }
    if let Some(path) = initial_file {
        app.select_path(&path);
    }
    tracing::info!(endpoint = %app.endpoint(), "Starting ocrdrop");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    _ => {
                        // Handle key and catch any errors to prevent crashes
                        if let Err(e) = app.handle_key(key) {
                            app.widget
                                .notify(format!("Error: {}", e), Severity::Error, Instant::now());
                        }
                    }
                },
                Event::Paste(text) => app.handle_paste(&text),
                _ => {}
            }
        }

        // Apply finished async work and expire notifications
        app.tick();
    }
}

fn notify(summary: &str, body: &str, severity: Severity) {
    let icon = match severity {
        Severity::Success => "dialog-information",
        Severity::Error => "dialog-error",
    };
    if let Err(e) = notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon(icon)
        .show()
    {
        tracing::warn!("Desktop notification failed: {}", e);
    }
}

mod components;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};
use std::sync::OnceLock;

use crate::app::{App, Popup};
use crate::theme::Theme;
use crate::widget::{Phase, Severity};

// Set once from config at startup; falls back to the built-in palette
static THEME: OnceLock<Theme> = OnceLock::new();

pub fn init_theme(theme: Theme) {
    if THEME.set(theme).is_err() {
        tracing::debug!("Theme already initialised");
    }
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn success() -> Color { theme().success }
fn error() -> Color { theme().error }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn inactive() -> Color { theme().inactive }
fn bg_selected() -> Color { theme().bg_selected }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let widget = &app.widget;

    let result_rows = if widget.result().is_some() {
        // inner width excludes the two border columns
        widget.result_rows(area.width.saturating_sub(2))
    } else {
        0
    };
    let progress_rows = if widget.progress_visible() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Notification line
            Constraint::Min(6),                // Drop target / preview
            Constraint::Length(3),             // Convert control
            Constraint::Length(progress_rows), // Progress bar
            Constraint::Length(result_rows),   // Result
            Constraint::Length(1),             // Footer
        ])
        .split(area);

    draw_notification(f, app, chunks[0]);
    if widget.drop_target_visible() {
        draw_drop_target(f, app, chunks[1]);
    } else {
        draw_preview(f, app, chunks[1]);
    }
    draw_convert_control(f, app, chunks[2]);
    if progress_rows > 0 {
        draw_progress(f, app, chunks[3]);
    }
    if result_rows > 0 {
        draw_result(f, app, chunks[4]);
    }
    draw_footer(f, app, chunks[5]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::FileBrowser => draw_file_browser(f, app),
        Popup::Help => draw_help_popup(f, app),
    }
}

fn draw_notification(f: &mut Frame, app: &App, area: Rect) {
    let line = match app.widget.notification() {
        Some(n) => {
            let (icon, color) = match n.severity {
                Severity::Success => ("✔ ", success()),
                Severity::Error => ("✘ ", error()),
            };
            Line::from(vec![
                Span::styled(icon, Style::default().fg(color)),
                Span::styled(n.message.as_str(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            ])
        }
        None => Line::from(Span::styled(
            format!("→ {}", app.endpoint()),
            Style::default().fg(text_dim()),
        )),
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_drop_target(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Image ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(inactive()));

    let lines = if let Some(file) = app.widget.selected().filter(|_| app.widget.preview_loading()) {
        vec![
            Line::from(""),
            Line::from(Span::styled(format!("Loading preview of {}…", file.name), Style::default().fg(text()))),
        ]
    } else {
        vec![
            Line::from(""),
            Line::from(Span::styled("Drop an image here", Style::default().fg(text()).add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(vec![
                Span::styled("or press ", Style::default().fg(text_dim())),
                Span::styled("o", Style::default().fg(accent())),
                Span::styled(" to browse", Style::default().fg(text_dim())),
            ]),
        ]
    };

    let inner_height = area.height.saturating_sub(2);
    let pad = inner_height.saturating_sub(lines.len() as u16) / 2;
    let mut padded = vec![Line::from(""); pad as usize];
    padded.extend(lines);

    let content = Paragraph::new(padded).alignment(Alignment::Center).block(block);
    f.render_widget(content, area);
}

fn draw_preview(f: &mut Frame, app: &App, area: Rect) {
    let title = app
        .widget
        .selected()
        .map(|file| format!(" {} ", file.name))
        .unwrap_or_else(|| " Preview ".to_string());

    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(preview) = app.widget.preview() else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let details = format!(
        "{}×{} │ {}",
        preview.width,
        preview.height,
        components::format_bytes(preview.bytes)
    );

    match &preview.thumbnail {
        Some(thumb) => {
            let cells = crate::preview::half_blocks(thumb, rows[0].width, rows[0].height);
            let lines: Vec<Line> = cells
                .into_iter()
                .map(|row| {
                    Line::from(
                        row.into_iter()
                            .map(|(top, bottom)| {
                                let mut style = Style::default().fg(Color::Rgb(top[0], top[1], top[2]));
                                if let Some(b) = bottom {
                                    style = style.bg(Color::Rgb(b[0], b[1], b[2]));
                                }
                                Span::styled("▀", style)
                            })
                            .collect::<Vec<_>>(),
                    )
                })
                .collect();
            f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), rows[0]);
        }
        None => {
            let msg = Paragraph::new(Span::styled("Preview unavailable", Style::default().fg(text_dim())))
                .alignment(Alignment::Center);
            f.render_widget(msg, components::vertical_center(rows[0], 1));
        }
    }

    let details = Paragraph::new(Span::styled(details, Style::default().fg(text_dim())))
        .alignment(Alignment::Center);
    f.render_widget(details, rows[1]);
}

fn draw_convert_control(f: &mut Frame, app: &App, area: Rect) {
    let enabled = app.widget.convert_enabled();
    let (label_style, border) = if enabled {
        (Style::default().fg(accent()).add_modifier(Modifier::BOLD), accent())
    } else {
        (Style::default().fg(inactive()), inactive())
    };

    let file_hint = match app.widget.selected() {
        Some(file) => Span::styled(
            format!("  {} ({})", file.name, file.media_type),
            Style::default().fg(text_dim()),
        ),
        None => Span::styled("  no file selected", Style::default().fg(text_dim())),
    };

    let button = Paragraph::new(Line::from(vec![
        Span::styled("[ ", Style::default().fg(border)),
        Span::styled("Enter", label_style),
        Span::styled(" Convert to text ", label_style),
        Span::styled("]", Style::default().fg(border)),
        file_hint,
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );

    f.render_widget(button, area);
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let transfer = app.widget.transfer();
    let color = if transfer.phase == Phase::Processing { success() } else { accent() };
    let title = match components::byte_progress(transfer.sent, transfer.total) {
        Some(bytes) => format!(" Upload · {} ", bytes),
        None => " Upload ".to_string(),
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(title, Style::default().fg(text_dim())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(inactive())),
        )
        .gauge_style(Style::default().fg(color).bg(bg_selected()))
        .percent(transfer.percent.min(100))
        .label(Span::styled(transfer.label(), Style::default().fg(text()).add_modifier(Modifier::BOLD)));

    f.render_widget(gauge, area);
}

fn draw_result(f: &mut Frame, app: &App, area: Rect) {
    let Some(result) = app.widget.result() else {
        return;
    };

    let block = Block::default()
        .title(Span::styled(" Extracted text ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .title_bottom(Line::from(vec![
            Span::styled(" y", Style::default().fg(accent())),
            Span::styled(" copy │ ", Style::default().fg(text_dim())),
            Span::styled("x", Style::default().fg(accent())),
            Span::styled(" clear ", Style::default().fg(text_dim())),
        ]))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let inner = block.inner(area);
    app.result_area.set((inner.width, inner.height));

    let paragraph = Paragraph::new(result)
        .style(Style::default().fg(text()))
        .wrap(Wrap { trim: false })
        .scroll((app.widget.result_scroll(), 0))
        .block(block);

    f.render_widget(paragraph, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut hints: Vec<(&str, &str)> = vec![("o", "browse"), ("Enter", "convert")];
    if app.widget.result().is_some() {
        hints.push(("y", "copy"));
        hints.push(("↑↓", "scroll"));
    }
    hints.extend([("d", "deselect"), ("x", "clear"), ("?", "help"), ("q", "quit")]);

    let hint_spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_file_browser(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = components::centered_rect(
        if area.width < 80 { 90 } else { 70 },
        if area.height < 30 { 85 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(" Select an image ", Style::default().fg(accent())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    f.render_widget(block, popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(popup_area);

    let path_str = app.browser_path.to_string_lossy();
    let path_display = Paragraph::new(Line::from(vec![
        Span::styled("▸ ", Style::default().fg(accent())),
        Span::styled(path_str.to_string(), Style::default().fg(text())),
    ]))
    .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(inactive())));
    f.render_widget(path_display, inner[0]);

    let rows: Vec<Row> = if app.browser_entries.is_empty() {
        vec![Row::new(vec![Span::styled(
            "  No images in this directory",
            Style::default().fg(text_dim()),
        )])]
    } else {
        // keep the selection on screen
        let visible = inner[1].height.max(1) as usize;
        let offset = app.browser_selected.saturating_sub(visible - 1);

        app.browser_entries
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(i, entry)| {
                let icon = if entry.is_dir { "▸" } else { "▪" };
                let icon_color = if entry.is_dir { accent() } else { success() };

                let row_style = if i == app.browser_selected {
                    Style::default().bg(bg_selected()).fg(text())
                } else {
                    Style::default()
                };

                Row::new(vec![
                    Span::styled(format!("  {} ", icon), Style::default().fg(icon_color)),
                    Span::styled(entry.name.as_str(), Style::default().fg(text())),
                ])
                .style(row_style)
            })
            .collect()
    };

    let widths = [Constraint::Length(5), Constraint::Percentage(90)];
    f.render_widget(Table::new(rows, widths), inner[1]);

    let hint = Paragraph::new(Line::from(vec![
        Span::styled("j/k", Style::default().fg(accent())),
        Span::raw(" nav │ "),
        Span::styled("Enter", Style::default().fg(accent())),
        Span::raw(" select │ "),
        Span::styled("Backspace", Style::default().fg(accent())),
        Span::raw(" up │ "),
        Span::styled("~", Style::default().fg(accent())),
        Span::raw(" home │ "),
        Span::styled("Esc", Style::default().fg(accent())),
        Span::raw(" cancel"),
    ]))
    .alignment(Alignment::Center)
    .style(Style::default().fg(text_dim()));
    f.render_widget(hint, inner[2]);
}

fn draw_help_popup(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = components::centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 30 { 95 } else { 80 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            format!("═══ {} ═══", title),
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
    };
    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section("Select"),
        entry("drop", "Drag an image onto the terminal window"),
        entry("o", "Browse for an image"),
        entry("d", "Deselect the current file"),
        Line::from(""),
        section("Convert"),
        entry("Enter/c", "Upload the image and extract its text"),
        entry("y", "Copy the extracted text"),
        entry("↑↓ PgUp/Dn", "Scroll the extracted text"),
        entry("x", "Clear everything and start over"),
        Line::from(""),
        section("Server"),
        Line::from(vec![
            Span::styled("  endpoint  ", Style::default().fg(accent())),
            Span::styled(app.endpoint(), Style::default().fg(text_dim())),
        ]),
        Line::from(vec![
            Span::styled("  field     ", Style::default().fg(accent())),
            Span::styled(app.config.field_name.as_str(), Style::default().fg(text_dim())),
        ]),
        Line::from(""),
        section("Headless"),
        entry("ocrdrop --upload scan.png", ""),
        entry("ocrdrop --upload scan.png --json", ""),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" ocrdrop Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

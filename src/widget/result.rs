pub const NO_TEXT_PLACEHOLDER: &str = "(No text detected)";

pub const DEFAULT_MIN_ROWS: u16 = 8;
pub const DEFAULT_MAX_ROWS: u16 = 30;

/// Text shown in the result area for a successful response body
pub fn display_text(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        NO_TEXT_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Number of terminal rows `text` needs when wrapped at `width` columns
pub fn wrapped_lines(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    let count: usize = text
        .lines()
        .map(|line| line.chars().count().div_ceil(width).max(1))
        .sum();
    count.max(1).min(u16::MAX as usize) as u16
}

/// Height of the bordered result pane, clamped to `[min, max]`
pub fn fitted_rows(text: &str, inner_width: u16, min: u16, max: u16) -> u16 {
    let wanted = wrapped_lines(text, inner_width).saturating_add(2);
    wanted.clamp(min, max.max(min))
}

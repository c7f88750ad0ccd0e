//! Layout and formatting helpers shared by the draw functions

use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// A `height`-row strip in the vertical middle of `r`
pub fn vertical_center(r: Rect, height: u16) -> Rect {
    let height = height.min(r.height);
    Rect {
        x: r.x,
        y: r.y + (r.height - height) / 2,
        width: r.width,
        height,
    }
}

/// Format bytes to human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// "sent / total" for the upload gauge; nothing while the total is unknown
pub fn byte_progress(sent: u64, total: u64) -> Option<String> {
    (total > 0).then(|| format!("{} / {}", format_bytes(sent.min(total)), format_bytes(total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2.00 MiB");
    }

    #[test]
    fn test_byte_progress() {
        assert_eq!(
            byte_progress(512 * 1024, 2 * 1024 * 1024).as_deref(),
            Some("512.0 KiB / 2.00 MiB")
        );
        assert_eq!(byte_progress(300, 0), None);
    }

    #[test]
    fn test_vertical_center() {
        let r = Rect::new(2, 4, 10, 9);
        assert_eq!(vertical_center(r, 1), Rect::new(2, 8, 10, 1));
        assert_eq!(vertical_center(r, 20), r);
    }
}

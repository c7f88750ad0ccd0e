//! UI palette, with optional hex overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeOverrides;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,      // Active borders, enabled controls, progress fill
    pub success: Color,     // Success notifications
    pub error: Color,       // Error notifications
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Hints, placeholders, disabled controls
    pub inactive: Color,    // Idle borders
    pub bg_selected: Color, // File browser selection
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(137, 180, 250),
            success: Color::Rgb(166, 218, 149),
            error: Color::Rgb(243, 139, 168),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            bg_selected: Color::Rgb(69, 71, 90),
        }
    }
}

impl Theme {
    pub fn from_overrides(overrides: &ThemeOverrides) -> Self {
        let base = Self::default();
        let pick = |value: &Option<String>, fallback: Color| {
            match value.as_deref().map(|v| (v, Self::parse_hex_color(v))) {
                Some((_, Some(color))) => color,
                Some((raw, None)) => {
                    tracing::warn!("Ignoring invalid theme colour {:?}", raw);
                    fallback
                }
                None => fallback,
            }
        };

        Self {
            accent: pick(&overrides.accent, base.accent),
            success: pick(&overrides.success, base.success),
            error: pick(&overrides.error, base.error),
            text: pick(&overrides.text, base.text),
            text_dim: pick(&overrides.text_dim, base.text_dim),
            inactive: pick(&overrides.inactive, base.inactive),
            bg_selected: base.bg_selected,
        }
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    pub fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}

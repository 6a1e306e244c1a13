//! Calculator colours
//! Taken from the user's kitty theme when one exists (~/.config/kitty/current-theme.conf
//! or ~/.config/kitty/kitty.conf), otherwise a built-in palette.

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,   // Focused input border, key hints
    pub danger: Color,   // Invalid input border and error text
    pub success: Color,  // Computed volume, copy confirmation
    pub text: Color,     // Input text, labels
    pub text_dim: Color, // Placeholders, helper text, disclaimer
    pub inactive: Color, // Unfocused borders, disabled copy button
    pub header: Color,   // Card title
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(137, 180, 250),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(250, 179, 135),
        }
    }
}

impl Theme {
    pub fn load() -> Self {
        let Some(home) = dirs::home_dir() else {
            return Self::default();
        };

        [".config/kitty/current-theme.conf", ".config/kitty/kitty.conf"]
            .iter()
            .filter_map(|rel| fs::read_to_string(home.join(rel)).ok())
            .find_map(|content| Self::from_kitty_conf(&content))
            .unwrap_or_default()
    }

    /// Build a theme from kitty.conf colour entries, `None` if the file
    /// defines no colours at all
    pub fn from_kitty_conf(content: &str) -> Option<Self> {
        let colors = parse_kitty_conf(content);
        if colors.is_empty() {
            return None;
        }

        let fallback = Self::default();
        let pick = |keys: &[&str], default: Color| {
            keys.iter()
                .find_map(|k| colors.get(*k).copied())
                .unwrap_or(default)
        };

        Some(Self {
            accent: pick(&["color4", "color12"], fallback.accent),
            danger: pick(&["color1", "color9"], fallback.danger),
            success: pick(&["color2", "color10"], fallback.success),
            text: pick(&["foreground"], fallback.text),
            text_dim: pick(&["color8"], fallback.text_dim),
            inactive: pick(&["inactive_border_color", "color8"], fallback.inactive),
            header: pick(&["color3", "color11"], fallback.header),
        })
    }
}

/// `key value` lines whose value is a hex colour
fn parse_kitty_conf(content: &str) -> HashMap<String, Color> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once(char::is_whitespace)?;
            Some((key.to_string(), parse_hex_color(value)?))
        })
        .collect()
}

/// `#RRGGBB` or `#RGB`
fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().strip_prefix('#')?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(s.get(range)?, 16).ok();

    match s.len() {
        6 => Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Some(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => None,
    }
}

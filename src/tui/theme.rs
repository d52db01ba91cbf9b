use crate::core::models::RiskLevel;
use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

/// Color scheme for the dashboard
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // General UI colors
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub backdrop: Color,

    // Chrome
    pub chrome_fg: Color,
    pub chrome_bg: Color,

    // Table colors
    pub header_fg: Color,
    pub header_bg: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
    pub row_alt_bg: Color,

    // Risk badges
    pub risk_high: Color,
    pub risk_medium: Color,
    pub risk_low: Color,
    pub risk_unknown: Color,

    // Status/feedback colors
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "Dark".to_string(),
            background: Color::Reset,
            foreground: Color::Gray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            backdrop: Color::Rgb(10, 10, 14),
            chrome_fg: Color::White,
            chrome_bg: Color::Rgb(30, 41, 59),
            header_fg: Color::Cyan,
            header_bg: Color::Rgb(20, 24, 32),
            selected_fg: Color::Black,
            selected_bg: Color::Cyan,
            row_alt_bg: Color::Rgb(25, 25, 35),
            risk_high: Color::Rgb(220, 38, 38),
            risk_medium: Color::Rgb(217, 119, 6),
            risk_low: Color::Rgb(22, 163, 74),
            risk_unknown: Color::DarkGray,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Blue,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            background: Color::White,
            foreground: Color::Black,
            border: Color::Gray,
            border_focused: Color::Blue,
            backdrop: Color::Rgb(200, 200, 205),
            chrome_fg: Color::White,
            chrome_bg: Color::Rgb(37, 99, 235),
            header_fg: Color::Blue,
            header_bg: Color::Rgb(240, 240, 240),
            selected_fg: Color::White,
            selected_bg: Color::Blue,
            row_alt_bg: Color::Rgb(250, 250, 250),
            risk_high: Color::Rgb(185, 28, 28),
            risk_medium: Color::Rgb(180, 83, 9),
            risk_low: Color::Rgb(21, 128, 61),
            risk_unknown: Color::Gray,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Rgb(200, 150, 0),
            info: Color::Blue,
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header_fg)
            .bg(self.header_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(self.selected_fg)
            .bg(self.selected_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn alt_row_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.row_alt_bg)
    }

    pub fn chrome_style(&self) -> Style {
        Style::default().fg(self.chrome_fg).bg(self.chrome_bg)
    }

    pub fn backdrop_style(&self) -> Style {
        Style::default().bg(self.backdrop)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn focused_border_style(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    /// Style of the element holding keyboard focus inside an overlay
    pub fn focus_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn risk_badge_style(&self, level: RiskLevel) -> Style {
        let bg = match level {
            RiskLevel::High => self.risk_high,
            RiskLevel::Medium => self.risk_medium,
            RiskLevel::Low => self.risk_low,
            RiskLevel::Unknown => self.risk_unknown,
        };
        Style::default()
            .fg(Color::White)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_by_name() {
        assert_eq!(Theme::from_name(ThemeName::Dark).name, "Dark");
        let light = Theme::from_name(ThemeName::Light);
        assert_eq!(light.background, Color::White);
        assert_eq!(light.foreground, Color::Black);
    }

    #[test]
    fn test_risk_badges_are_distinct() {
        let theme = Theme::default();
        let high = theme.risk_badge_style(RiskLevel::High);
        let low = theme.risk_badge_style(RiskLevel::Low);
        assert_ne!(high.bg, low.bg);
        assert!(high.add_modifier.contains(Modifier::BOLD));
        assert_eq!(
            theme.risk_badge_style(RiskLevel::Unknown).bg,
            Some(theme.risk_unknown)
        );
    }

    #[test]
    fn test_theme_name_serde() {
        let name: ThemeName = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(name, ThemeName::Light);
    }
}

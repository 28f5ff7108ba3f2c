//! Colors and styles for the results browser

use ratatui::prelude::*;

use crate::risk::RiskLevel;

#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Risk levels (traffic light)
    pub risk_high: Color,
    pub risk_medium: Color,
    pub risk_low: Color,
    pub risk_unrecognized: Color,

    // Table
    pub row_alt_bg: Color,
    pub index_color: Color,
    pub header_style: Style,
    pub row_selected: Style,
    pub delinquent: Color,

    pub muted: Color,
    pub title_color: Color,

    // Filter tabs
    pub tab_active_style: Style,
    pub tab_inactive_style: Style,

    // Status bar
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,
    pub flash_info: Color,

    // Popups
    pub popup_border: Color,
    pub popup_title: Style,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            risk_high: Color::Red,
            risk_medium: Color::Yellow,
            risk_low: Color::Green,
            risk_unrecognized: Color::Gray,
            row_alt_bg: Color::Indexed(235),
            index_color: Color::DarkGray,
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            delinquent: Color::LightRed,
            muted: Color::Gray,
            title_color: Color::Cyan,
            tab_active_style: Style::new().fg(Color::Cyan).bold(),
            tab_inactive_style: Style::new().fg(Color::DarkGray),
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            flash_info: Color::White,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
        }
    }

    pub fn risk_color(&self, level: &RiskLevel) -> Color {
        match level {
            RiskLevel::High => self.risk_high,
            RiskLevel::Medium => self.risk_medium,
            RiskLevel::Low => self.risk_low,
            RiskLevel::Unrecognized(_) => self.risk_unrecognized,
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self::dark()
    }
}

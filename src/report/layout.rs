use chrono::{DateTime, Local};

use super::metrics::{line_height_mm, text_width_mm, wrap_text};
use crate::config::Config;
use crate::output::{format_trimmed, CurrencyFormat, NO_REASONS_PLACEHOLDER};
use crate::risk::{CustomerRiskRecord, RiskLevel};

pub type Rgb = (u8, u8, u8);

pub const PRIMARY: Rgb = (25, 118, 210);
pub const DANGER: Rgb = (211, 47, 47);
pub const WARNING: Rgb = (245, 124, 0);
pub const SUCCESS: Rgb = (46, 125, 50);
pub const WHITE: Rgb = (255, 255, 255);
pub const BLACK: Rgb = (0, 0, 0);
const GRID: Rgb = (200, 200, 200);

/// A4 portrait, millimetres
pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 14.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const NARRATIVE_WIDTH: f32 = 180.0;
const CELL_PADDING: f32 = 1.76;
const FIELD_COLUMN_WIDTH: f32 = 62.0;
const TABLE_FONT_SIZE: f32 = 10.0;
const HEADING_FONT_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One drawing instruction. Coordinates are millimetres from the top-left
/// corner; text `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Text {
        x: f32,
        y: f32,
        size: f32,
        color: Rgb,
        bold: bool,
        align: Align,
        text: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub label: String,
    pub fill: Rgb,
}

/// A laid-out report, ready for a backend to serialize
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub customer_id: String,
    pub badge: Badge,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text run, in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|page| {
            page.elements.iter().filter_map(|el| match el {
                Element::Text { text, .. } => Some(text.as_str()),
                Element::Rect { .. } => None,
            })
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t == needle)
    }
}

/// Presentation inputs that do not come from the record
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    pub subtitle: String,
    pub prepared_by: String,
    pub generated_at: DateTime<Local>,
    pub currency: CurrencyFormat,
}

impl ReportOptions {
    pub fn from_config(config: &Config, generated_at: DateTime<Local>) -> Self {
        Self {
            title: config.report.title.clone(),
            subtitle: config.report.subtitle.clone(),
            prepared_by: config.report.prepared_by.clone(),
            generated_at,
            currency: CurrencyFormat::report(&config.currency),
        }
    }
}

/// Badge fill: High is red, Medium orange, anything else green
pub fn badge_color(level: &RiskLevel) -> Rgb {
    match level {
        RiskLevel::High => DANGER,
        RiskLevel::Medium => WARNING,
        _ => SUCCESS,
    }
}

fn badge_label(level: &RiskLevel) -> String {
    let name = match level.as_str().trim() {
        "" => "Low",
        name => name,
    };
    format!("{} Risk", name)
}

struct PageBuilder {
    pages: Vec<Page>,
}

impl PageBuilder {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
        }
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn new_page(&mut self) -> f32 {
        self.pages.push(Page::default());
        MARGIN
    }

    /// Start a new page when `height` more millimetres will not fit below `y`
    fn ensure_room(&mut self, y: f32, height: f32) -> f32 {
        if y + height > PAGE_HEIGHT - MARGIN {
            self.new_page()
        } else {
            y
        }
    }

    fn text(&mut self, x: f32, y: f32, size: f32, color: Rgb, text: impl Into<String>) {
        self.push(Element::Text {
            x,
            y,
            size,
            color,
            bold: false,
            align: Align::Left,
            text: text.into(),
        });
    }

    fn heading(&mut self, y: f32, text: &str) -> f32 {
        let y = self.ensure_room(y, line_height_mm(HEADING_FONT_SIZE) + 8.0);
        self.text(MARGIN, y, HEADING_FONT_SIZE, BLACK, text);
        y
    }

    fn table_row(&mut self, y: f32, cells: [&str; 2], head: bool) -> f32 {
        let widths = [FIELD_COLUMN_WIDTH, CONTENT_WIDTH - FIELD_COLUMN_WIDTH];
        let line_height = line_height_mm(TABLE_FONT_SIZE);

        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| wrap_text(cell, TABLE_FONT_SIZE, width - 2.0 * CELL_PADDING))
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = lines as f32 * line_height + 2.0 * CELL_PADDING;

        let mut x = MARGIN;
        for (cell_lines, width) in wrapped.iter().zip(widths) {
            self.push(Element::Rect {
                x,
                y,
                width,
                height,
                radius: 0.0,
                fill: head.then_some(PRIMARY),
                stroke: Some(GRID),
            });
            for (i, line) in cell_lines.iter().enumerate() {
                self.push(Element::Text {
                    x: x + CELL_PADDING,
                    y: y + CELL_PADDING + (i as f32 + 0.8) * line_height,
                    size: TABLE_FONT_SIZE,
                    color: if head { WHITE } else { BLACK },
                    bold: head,
                    align: Align::Left,
                    text: line.clone(),
                });
            }
            x += width;
        }
        y + height
    }

    /// Grid table with a coloured head row repeated on every page. Returns
    /// the y just below the last row.
    fn table(&mut self, start_y: f32, head: [&str; 2], rows: &[(&str, String)]) -> f32 {
        let head_height = line_height_mm(TABLE_FONT_SIZE) + 2.0 * CELL_PADDING;
        let mut y = self.ensure_room(start_y, 2.0 * head_height);
        y = self.table_row(y, head, true);

        for (field, value) in rows {
            let value_lines = wrap_text(
                value,
                TABLE_FONT_SIZE,
                CONTENT_WIDTH - FIELD_COLUMN_WIDTH - 2.0 * CELL_PADDING,
            )
            .len();
            let height = value_lines as f32 * line_height_mm(TABLE_FONT_SIZE) + 2.0 * CELL_PADDING;
            if y + height > PAGE_HEIGHT - MARGIN {
                y = self.new_page();
                y = self.table_row(y, head, true);
            }
            y = self.table_row(y, [*field, value.as_str()], false);
        }
        y
    }
}

/// Lay out the one-customer risk report.
pub fn render_report(record: &CustomerRiskRecord, options: &ReportOptions) -> ReportDocument {
    let mut builder = PageBuilder::new();

    // Header band
    builder.push(Element::Rect {
        x: 0.0,
        y: 0.0,
        width: PAGE_WIDTH,
        height: 20.0,
        radius: 0.0,
        fill: Some(PRIMARY),
        stroke: None,
    });
    builder.text(14.0, 8.0, 14.0, WHITE, options.title.as_str());
    builder.text(14.0, 14.0, 11.0, WHITE, options.subtitle.as_str());

    builder.text(
        14.0,
        26.0,
        10.0,
        BLACK,
        format!(
            "Generated on: {}",
            options.generated_at.format("%d/%m/%Y, %H:%M:%S")
        ),
    );
    builder.text(14.0, 32.0, 10.0, BLACK, format!("Prepared by: {}", options.prepared_by));

    let badge = Badge {
        label: badge_label(&record.risk_level),
        fill: badge_color(&record.risk_level),
    };
    builder.push(Element::Rect {
        x: 145.0,
        y: 24.0,
        width: 50.0,
        height: 12.0,
        radius: 2.0,
        fill: Some(badge.fill),
        stroke: None,
    });
    builder.push(Element::Text {
        x: 170.0,
        y: 32.0,
        size: 11.0,
        color: WHITE,
        bold: false,
        align: Align::Center,
        text: badge.label.clone(),
    });

    builder.text(MARGIN, 44.0, HEADING_FONT_SIZE, BLACK, "Customer Overview");
    let overview = [
        ("Customer ID", record.customer_id.clone()),
        ("Risk Level", record.risk_level.to_string()),
        ("Behaviour Risk Score", format_trimmed(record.behaviour_risk_score, 2)),
        ("Payment Stress Score", format_trimmed(record.payment_stress_score, 2)),
        ("Total Risk Flags", record.total_risk_flags.to_string()),
        (
            "Next Month DPD Bucket",
            record.dpd_bucket_next_month.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ];
    let after_overview = builder.table(48.0, ["Field", "Value"], &overview);

    let pct = |v: f64| format!("{}%", format_trimmed(v, 2));
    let metrics_y = builder.heading(after_overview + 8.0, "Behaviour & Usage Metrics");
    let metrics = [
        ("Credit Limit", options.currency.format(record.credit_limit)),
        ("Utilisation %", pct(record.utilisation_pct)),
        ("Avg Payment Ratio", pct(record.avg_payment_ratio)),
        ("Min Due Paid Frequency", pct(record.min_due_paid_frequency)),
        ("Recent Spend Change %", pct(record.recent_spend_change_pct)),
        ("Cash Withdrawal %", pct(record.cash_withdrawal_pct)),
        ("Merchant Mix Index", format_trimmed(record.merchant_mix_index, 3)),
    ];
    let after_metrics = builder.table(metrics_y + 4.0, ["Metric", "Value"], &metrics);

    let summary_y = builder.heading(after_metrics + 8.0, "Risk Assessment Summary");
    let narrative = record
        .risk_reasons_text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(NO_REASONS_PLACEHOLDER);

    let line_height = line_height_mm(TABLE_FONT_SIZE);
    let mut y = summary_y + 6.0;
    for line in wrap_text(narrative, TABLE_FONT_SIZE, NARRATIVE_WIDTH) {
        if y > PAGE_HEIGHT - MARGIN {
            y = builder.new_page() + line_height;
        }
        builder.text(MARGIN, y, TABLE_FONT_SIZE, BLACK, line);
        y += line_height;
    }

    ReportDocument {
        customer_id: record.customer_id.clone(),
        badge,
        pages: builder.pages,
    }
}

/// Horizontal start of a text run once alignment is applied
pub fn aligned_x(x: f32, size: f32, align: Align, text: &str) -> f32 {
    match align {
        Align::Left => x,
        Align::Center => x - text_width_mm(text, size) / 2.0,
    }
}

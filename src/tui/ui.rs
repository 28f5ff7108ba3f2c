use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::output::formatter::{EMPTY_RESULTS_HINT, EMPTY_RESULTS_TITLE};
use crate::output::{format_customer_detail, level_hint};
use crate::risk::{DelinquencyFilter, RiskFilter, RiskLevel};
use crate::tui::app::{App, FlashKind, InputMode};

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 8 || area.width < 40 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Summary(1) + Filters(1) + Table(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_summary(frame, chunks[1], app);
    render_filters(frame, chunks[2], app);
    render_table(frame, chunks[3], app);
    render_status_bar(frame, chunks[4], app);

    match app.input_mode {
        InputMode::Detail => render_detail_popup(frame, app),
        InputMode::Help => render_help_popup(frame, app),
        InputMode::Normal => {}
    }

    if app.is_loading {
        render_loading_overlay(frame, app);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let title = app.config.report.title.clone();
    let mut spans = vec![Span::styled(
        title.clone(),
        Style::default().fg(app.theme.title_color).bold(),
    )];

    if let Some(session) = &app.session {
        let source = format!("{}  ({} records)", session.source, session.len());
        let padding = (area.width as usize).saturating_sub(title.chars().count() + source.chars().count());
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(source, Style::default().fg(app.theme.muted)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_summary(frame: &mut Frame, area: Rect, app: &App) {
    let counts = app.summary();
    let mut spans = Vec::new();
    for level in &RiskLevel::KNOWN {
        if !spans.is_empty() {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(
            format!("{} Risk: {}", level, counts.count(level)),
            Style::default().fg(app.theme.risk_color(level)).bold(),
        ));
        spans.push(Span::styled(
            format!(" ({})", level_hint(level)),
            Style::default().fg(app.theme.muted),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_filters(frame: &mut Frame, area: Rect, app: &App) {
    let risk_options = [RiskFilter::All, RiskFilter::High, RiskFilter::Medium, RiskFilter::Low];
    let delinquency_options = [
        DelinquencyFilter::All,
        DelinquencyFilter::Yes,
        DelinquencyFilter::No,
    ];

    let tab = |label: &'static str, active: bool| {
        let style = if active {
            app.theme.tab_active_style.reversed()
        } else {
            app.theme.tab_inactive_style
        };
        Span::styled(format!(" {} ", label), style)
    };

    let mut spans = vec![Span::styled("Risk ", Style::default().fg(app.theme.muted))];
    spans.extend(
        risk_options
            .iter()
            .map(|option| tab(option.label(), *option == app.filter.risk)),
    );
    spans.push(Span::styled("   Delinquency ", Style::default().fg(app.theme.muted)));
    spans.extend(
        delinquency_options
            .iter()
            .map(|option| tab(option.label(), *option == app.filter.delinquency)),
    );

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(frame: &mut Frame, area: Rect, app: &mut App) {
    if !app.has_session() {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(EMPTY_RESULTS_TITLE, Style::default().bold())),
            Line::from(Span::styled(EMPTY_RESULTS_HINT, Style::default().fg(app.theme.muted))),
        ];
        let empty = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    let currency = app.currency();
    let theme = &app.theme;
    let records = app.visible_records();

    if records.is_empty() {
        let empty = Paragraph::new("No customers match the current filters")
            .alignment(Alignment::Center)
            .block(Block::default());
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let row_style = if idx % 2 == 1 {
                Style::default().bg(theme.row_alt_bg)
            } else {
                Style::default()
            };
            let delinquent = if record.delinquent_next_month {
                Cell::from("Yes").style(Style::default().fg(theme.delinquent))
            } else {
                Cell::from("No")
            };

            Row::new(vec![
                Cell::from(format!("{}.", idx + 1)).style(Style::default().fg(theme.index_color)),
                Cell::from(record.customer_id.clone()),
                Cell::from(record.risk_level.to_string())
                    .style(Style::default().fg(theme.risk_color(&record.risk_level))),
                Cell::from(format!("{:>6.1}", record.behaviour_risk_score)),
                delinquent,
                Cell::from(format!("{:>14}", currency.format(record.credit_limit))),
                Cell::from(format!("{:>5}", record.total_risk_flags)),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(1),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(15),
        Constraint::Length(6),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec![
                "#",
                "Customer ID",
                "Risk",
                "Behaviour",
                "Delinquent",
                "  Credit Limit",
                "Flags",
            ])
            .style(theme.header_style)
            .bottom_margin(1),
        )
        .row_highlight_style(theme.row_selected);

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let text = if let Some((msg, kind, _)) = &app.flash_message {
        let color = match kind {
            FlashKind::Success => app.theme.flash_success,
            FlashKind::Error => app.theme.flash_error,
            FlashKind::Info => app.theme.flash_info,
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(color)))
    } else {
        let count = format!("{}/{} customers", app.visible.len(), app.total_records());
        let hints = [
            ("j/k", ":nav "),
            ("f", ":risk "),
            ("d", ":delinquency "),
            ("Enter", ":detail "),
            ("e", ":export "),
            ("p", ":report "),
            ("?", ":help "),
            ("q", ":quit"),
        ];

        let mut spans = vec![
            Span::styled(count, Style::default().fg(app.theme.muted)),
            Span::raw("  "),
        ];
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(app.theme.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(app.theme.status_bar_bg)),
        area,
    );
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn render_detail_popup(frame: &mut Frame, app: &App) {
    let Some(record) = app.selected_record() else {
        return;
    };

    let popup_area = centered_rect_fixed(76, 30, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(Span::styled(" Customer Detail ", app.theme.popup_title))
        .border_style(Style::default().fg(app.theme.popup_border))
        .title_bottom(Line::from(" u:refresh  p:report  Esc:close ").right_aligned());
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = format_customer_detail(
        record,
        &app.currency(),
        false,
        Some(inner.width as usize),
    );
    let lines: Vec<Line> = text
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(app.theme.risk_color(&record.risk_level)).bold(),
                ))
            } else {
                Line::from(line.to_string())
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_help_popup(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(54, 18, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered().title(" Keyboard Shortcuts ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(Color::Cyan).bold();
    let entries = [
        ("j / Down      ", "Move down"),
        ("k / Up        ", "Move up"),
        ("f             ", "Cycle risk filter"),
        ("d             ", "Cycle delinquency filter"),
        ("Enter         ", "Show customer detail"),
        ("u             ", "Refresh customer from service"),
        ("Esc           ", "Close detail / abandon refresh"),
        ("e             ", "Export filtered rows to CSV"),
        ("p             ", "Save PDF report for customer"),
        ("R             ", "Reload stored results"),
        ("?             ", "Show/hide this help"),
        ("q / Ctrl-c    ", "Quit"),
    ];

    let mut help_lines: Vec<Line> = entries
        .iter()
        .map(|(key, action)| Line::from(vec![Span::styled(*key, key_style), Span::raw(*action)]))
        .collect();
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(app.theme.muted),
    )));

    frame.render_widget(Paragraph::new(help_lines), inner);
}

fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(34, 3, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered();
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Braille spinner animation
    let spinner_chars = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];

    let loading_text = Paragraph::new(format!("{} Refreshing customer...", spinner))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(loading_text, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::risk::fixtures::six_record_cohort;
    use crate::risk::{aggregate, RecordFilter, ScoringSession, SessionSource};
    use crate::session::{MemorySessionStore, SessionStore};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_empty_state_is_rendered() {
        let mut app = App::new(
            Arc::new(MemorySessionStore::new()),
            Config::default(),
            PathBuf::from("."),
            RecordFilter::default(),
        );
        let screen = render(&mut app);
        assert!(screen.contains("No results available"));
    }

    #[test]
    fn test_results_and_summary_are_rendered() {
        let store = MemorySessionStore::new();
        let customers = six_record_cohort();
        let counts = aggregate(&customers);
        store
            .save(&ScoringSession::new(SessionSource::Manual, customers, counts))
            .unwrap();
        let mut app = App::new(
            Arc::new(store),
            Config::default(),
            PathBuf::from("."),
            RecordFilter::default(),
        );

        let screen = render(&mut app);
        assert!(screen.contains("High Risk: 3"));
        assert!(screen.contains("Medium Risk: 2"));
        assert!(screen.contains("Low Risk: 1"));
        assert!(screen.contains("C006"));
        assert!(screen.contains("6/6 customers"));

        app.open_detail();
        let screen = render(&mut app);
        assert!(screen.contains("Customer Detail"));
        assert!(screen.contains("Behaviour & Usage Metrics"));
    }
}

use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::export::write_csv;
use crate::output::CurrencyFormat;
use crate::report::{write_report, ReportOptions};
use crate::risk::{aggregate, CustomerRiskRecord, RecordFilter, RiskCountsSummary, ScoringSession};
use crate::session::{SessionStore, SubmissionGate};
use crate::tui::theme::ThemeColors;

const FLASH_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Detail,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Info,
    Success,
    Error,
}

pub struct App {
    pub session: Option<ScoringSession>,
    pub filter: RecordFilter,
    /// Indices into `session.customers` that pass the filter, in session order
    pub visible: Vec<usize>,
    pub table_state: ratatui::widgets::TableState,
    pub input_mode: InputMode,
    pub flash_message: Option<(String, FlashKind, Instant)>,
    pub should_quit: bool,
    pub is_loading: bool,
    pub spinner_frame: usize,
    /// Customer id waiting to be re-fetched by the event loop
    pub refresh_requested: Option<String>,
    pub config: Config,
    pub store: Arc<dyn SessionStore>,
    pub gate: Arc<SubmissionGate>,
    pub output_dir: PathBuf,
    pub theme: ThemeColors,
}

impl App {
    pub fn new(
        store: Arc<dyn SessionStore>,
        config: Config,
        output_dir: PathBuf,
        filter: RecordFilter,
    ) -> Self {
        let mut app = Self {
            session: store.load(),
            filter,
            visible: Vec::new(),
            table_state: ratatui::widgets::TableState::default(),
            input_mode: InputMode::Normal,
            flash_message: None,
            should_quit: false,
            is_loading: false,
            spinner_frame: 0,
            refresh_requested: None,
            config,
            store,
            gate: Arc::new(SubmissionGate::new()),
            output_dir,
            theme: ThemeColors::dark(),
        };
        app.apply_filter();
        app
    }

    pub fn has_session(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Counts over the whole session, whatever the filter
    pub fn summary(&self) -> RiskCountsSummary {
        self.session
            .as_ref()
            .map(|s| aggregate(&s.customers))
            .unwrap_or_default()
    }

    pub fn total_records(&self) -> usize {
        self.session.as_ref().map_or(0, ScoringSession::len)
    }

    pub fn visible_records(&self) -> Vec<&CustomerRiskRecord> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        self.visible
            .iter()
            .filter_map(|&i| session.customers.get(i))
            .collect()
    }

    pub fn currency(&self) -> CurrencyFormat {
        CurrencyFormat::terminal(&self.config.currency)
    }

    /// Recompute the visible rows, keeping the selected customer when it
    /// is still visible
    fn apply_filter(&mut self) {
        let selected_id = self.selected_record().map(|r| r.customer_id.clone());

        self.visible = match &self.session {
            Some(session) => session
                .customers
                .iter()
                .enumerate()
                .filter(|(_, record)| self.filter.matches(record))
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        };

        let position = selected_id.and_then(|id| {
            self.visible_records()
                .iter()
                .position(|r| r.customer_id == id)
        });
        let selection = match position {
            Some(i) => Some(i),
            None if self.visible.is_empty() => None,
            None => Some(0),
        };
        self.table_state.select(selection);
    }

    pub fn cycle_risk_filter(&mut self) {
        self.filter.risk = self.filter.risk.cycle();
        self.apply_filter();
    }

    pub fn cycle_delinquency_filter(&mut self) {
        self.filter.delinquency = self.filter.delinquency.cycle();
        self.apply_filter();
    }

    pub fn next_row(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn selected_record(&self) -> Option<&CustomerRiskRecord> {
        let session = self.session.as_ref()?;
        let row = self.table_state.selected()?;
        let index = *self.visible.get(row)?;
        session.customers.get(index)
    }

    /// Re-read the stored session (another process may have replaced it)
    pub fn reload(&mut self) {
        self.session = self.store.load();
        self.apply_filter();
        match &self.session {
            Some(session) => {
                let msg = format!("Reloaded {} records", session.len());
                self.show_flash(msg, FlashKind::Success);
            }
            None => self.show_flash("No stored results".to_string(), FlashKind::Info),
        }
    }

    pub fn open_detail(&mut self) {
        if self.selected_record().is_some() {
            self.input_mode = InputMode::Detail;
        }
    }

    pub fn close_detail(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Ask the event loop to re-fetch the selected customer
    pub fn request_refresh(&mut self) {
        if self.is_loading || self.gate.is_submitting() {
            self.show_flash(
                "A refresh is already in progress".to_string(),
                FlashKind::Info,
            );
            return;
        }
        if let Some(record) = self.selected_record() {
            self.refresh_requested = Some(record.customer_id.clone());
        }
    }

    /// Abandon an in-flight refresh; its response will be discarded
    pub fn cancel_refresh(&mut self) {
        if self.is_loading {
            self.gate.invalidate();
            self.show_flash("Refresh abandoned".to_string(), FlashKind::Info);
        }
    }

    /// Apply a refreshed record that the workflow already stored
    pub fn finish_refresh(&mut self, record: &CustomerRiskRecord) {
        self.session = self.store.load();
        self.apply_filter();
        self.show_flash(
            format!("Refreshed {} ({} Risk)", record.customer_id, record.risk_level),
            FlashKind::Success,
        );
    }

    /// Export the filtered rows to CSV
    pub fn export_visible(&mut self) {
        let records = self.visible_records();
        if records.is_empty() {
            self.show_flash("Nothing to export".to_string(), FlashKind::Info);
            return;
        }
        let count = records.len();
        let result = write_csv(&self.output_dir, &records);
        match result {
            Ok(path) => self.show_flash(
                format!("Exported {} rows to {}", count, path.display()),
                FlashKind::Success,
            ),
            Err(e) => self.show_flash(format!("Export failed: {:#}", e), FlashKind::Error),
        }
    }

    /// Write the PDF report for the selected customer
    pub fn report_selected(&mut self) {
        let Some(record) = self.selected_record() else {
            return;
        };
        let options = ReportOptions::from_config(&self.config, Local::now());
        let result = write_report(&self.output_dir, record, &options);
        match result {
            Ok(path) => self.show_flash(format!("Saved {}", path.display()), FlashKind::Success),
            Err(e) => self.show_flash(format!("Report failed: {:#}", e), FlashKind::Error),
        }
    }

    pub fn update_flash(&mut self) {
        if let Some((_, _, timestamp)) = &self.flash_message {
            if timestamp.elapsed().as_secs() >= FLASH_SECS {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String, kind: FlashKind) {
        self.flash_message = Some((msg, kind, Instant::now()));
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}

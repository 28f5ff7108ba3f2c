pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::ThemeColors;

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler, TICK_RATE};

use crate::api::ScoringClient;
use crate::risk::CustomerRiskRecord;
use crate::workflow::{self, Outcome, WorkflowError};

const REFRESH_TIMEOUT_SECS: u64 = 20;

type RefreshResult =
    Result<Result<Outcome<CustomerRiskRecord>, WorkflowError>, tokio::time::error::Elapsed>;

pub async fn run_tui(mut app: App, client: ScoringClient) -> anyhow::Result<()> {
    // Buffer stderr while TUI is active to prevent output corrupting the display
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();
    let mut events = EventHandler::new(TICK_RATE);

    let mut pending_refresh: Option<tokio::task::JoinHandle<RefreshResult>> = None;

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        match events.next().await {
            Event::Key(key) => handle_key_event(&mut app, key),
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Resize => {}
            Event::InputClosed => app.should_quit = true,
        }

        // Check if the background refresh has completed
        if pending_refresh.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = pending_refresh.take() {
                handle_refresh_result(&mut app, handle.await);
            }
        }

        // Spawn a refresh if one was requested and none is pending
        if pending_refresh.is_none() {
            if let Some(customer_id) = app.refresh_requested.take() {
                let client = client.clone();
                let store = app.store.clone();
                let gate = app.gate.clone();

                pending_refresh = Some(tokio::spawn(async move {
                    tokio::time::timeout(
                        Duration::from_secs(REFRESH_TIMEOUT_SECS),
                        workflow::refresh_customer(&client, &*store, &gate, &customer_id),
                    )
                    .await
                }));
                app.is_loading = true;
            }
        }

        if app.should_quit {
            break;
        }
    }

    ratatui::restore();

    // Flush buffered stderr messages now that the terminal is restored
    for msg in crate::stderr_buffer::drain() {
        eprintln!("{}", msg);
    }

    Ok(())
}

fn handle_refresh_result(
    app: &mut App,
    result: Result<RefreshResult, tokio::task::JoinError>,
) {
    app.is_loading = false;
    match result {
        Ok(Ok(Ok(Outcome::Applied(record)))) => app.finish_refresh(&record),
        Ok(Ok(Ok(Outcome::Stale))) => {
            tracing::debug!("refresh response arrived after it was abandoned");
        }
        Ok(Ok(Err(e))) => app.show_flash(format!("Refresh failed: {}", e), app::FlashKind::Error),
        Ok(Err(_elapsed)) => app.show_flash(
            format!("Refresh timed out ({}s)", REFRESH_TIMEOUT_SECS),
            app::FlashKind::Error,
        ),
        Err(e) => app.show_flash(
            format!("Refresh task panicked: {}", e),
            app::FlashKind::Error,
        ),
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        app::InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.should_quit = true,

            // Navigation
            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),

            // Filters
            KeyCode::Char('f') => app.cycle_risk_filter(),
            KeyCode::Char('d') => app.cycle_delinquency_filter(),

            KeyCode::Enter => app.open_detail(),
            KeyCode::Char('u') => app.request_refresh(),
            KeyCode::Esc => app.cancel_refresh(),
            KeyCode::Char('e') => app.export_visible(),
            KeyCode::Char('p') => app.report_selected(),
            KeyCode::Char('R') => app.reload(),
            KeyCode::Char('?') => app.show_help(),
            _ => {}
        },
        app::InputMode::Detail => match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                app.cancel_refresh();
                app.close_detail();
            }
            KeyCode::Char('q') => app.close_detail(),
            KeyCode::Char('u') => app.request_refresh(),
            KeyCode::Char('p') => app.report_selected(),
            _ => {}
        },
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::risk::fixtures::six_record_cohort;
    use crate::risk::{aggregate, RecordFilter, RiskFilter, ScoringSession, SessionSource};
    use crate::session::{MemorySessionStore, SessionStore};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn loaded_app() -> App {
        let store = MemorySessionStore::new();
        let customers = six_record_cohort();
        let counts = aggregate(&customers);
        store
            .save(&ScoringSession::new(SessionSource::Manual, customers, counts))
            .unwrap();
        App::new(
            Arc::new(store),
            Config::default(),
            PathBuf::from("."),
            RecordFilter::default(),
        )
    }

    #[test]
    fn test_filter_and_navigation_keys() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.filter.risk, RiskFilter::High);
        assert_eq!(app.visible.len(), 3);

        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_record().unwrap().customer_id, "C003");
    }

    #[test]
    fn test_detail_and_help_modes() {
        let mut app = loaded_app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, app::InputMode::Detail);
        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.refresh_requested.as_deref(), Some("C001"));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, app::InputMode::Normal);

        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.input_mode, app::InputMode::Help);
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.input_mode, app::InputMode::Normal);
    }

    #[test]
    fn test_ctrl_c_quits_from_any_mode() {
        let mut app = loaded_app();
        app.show_help();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn test_stale_refresh_clears_loading_without_flash() {
        let mut app = loaded_app();
        app.is_loading = true;
        handle_refresh_result(&mut app, Ok(Ok(Ok(Outcome::Stale))));
        assert!(!app.is_loading);
        assert!(app.flash_message.is_none());
    }
}

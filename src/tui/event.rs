use std::time::Duration;

use crossterm::event::{Event as TerminalEvent, KeyEvent, KeyEventKind};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Drives the flash timeout and the loading spinner
pub const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    /// Terminal size changed; the next draw picks up the new area
    Resize,
    Tick,
    /// The terminal stopped delivering input
    InputClosed,
}

/// Keep key presses and resizes; drop releases, repeats, mouse and focus.
fn translate(event: TerminalEvent) -> Option<Event> {
    match event {
        // Windows reports both press and release
        TerminalEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        TerminalEvent::Resize(..) => Some(Event::Resize),
        _ => None,
    }
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self::with_input(crossterm::event::EventStream::new(), tick_rate)
    }

    fn with_input<S>(input: S, tick_rate: Duration) -> Self
    where
        S: Stream<Item = std::io::Result<TerminalEvent>> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut input = Box::pin(input);
            let mut ticks = tokio::time::interval(tick_rate);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    biased;
                    next = input.next() => match next {
                        Some(Ok(raw)) => match translate(raw) {
                            Some(event) => event,
                            None => continue,
                        },
                        Some(Err(e)) => {
                            tracing::debug!(error = %e, "terminal input failed");
                            Event::InputClosed
                        }
                        None => Event::InputClosed,
                    },
                    _ = ticks.tick() => Event::Tick,
                };

                let closed = event == Event::InputClosed;
                if tx.send(event).is_err() || closed {
                    break;
                }
            }
        });

        EventHandler { rx }
    }

    pub async fn next(&mut self) -> Event {
        self.rx.recv().await.unwrap_or(Event::InputClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    async fn drain_without_ticks(handler: &mut EventHandler) -> Vec<Event> {
        let mut seen = Vec::new();
        loop {
            match handler.next().await {
                Event::Tick => {}
                Event::InputClosed => {
                    seen.push(Event::InputClosed);
                    return seen;
                }
                other => seen.push(other),
            }
        }
    }

    #[test]
    fn test_translate_filters_releases() {
        let release = KeyEvent::new_with_kind(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert_eq!(translate(TerminalEvent::Key(press('q'))), Some(Event::Key(press('q'))));
        assert_eq!(translate(TerminalEvent::Key(release)), None);
        assert_eq!(translate(TerminalEvent::Resize(120, 40)), Some(Event::Resize));
        assert_eq!(translate(TerminalEvent::FocusGained), None);
    }

    #[tokio::test]
    async fn test_input_order_and_close() {
        let input = futures::stream::iter(vec![
            Ok(TerminalEvent::Key(press('j'))),
            Ok(TerminalEvent::FocusLost),
            Ok(TerminalEvent::Resize(80, 24)),
            Ok(TerminalEvent::Key(press('k'))),
        ]);
        let mut handler = EventHandler::with_input(input, Duration::from_secs(3600));

        assert_eq!(
            drain_without_ticks(&mut handler).await,
            vec![
                Event::Key(press('j')),
                Event::Resize,
                Event::Key(press('k')),
                Event::InputClosed,
            ]
        );
        // The pump has stopped; later reads still report a closed terminal
        assert_eq!(handler.next().await, Event::InputClosed);
    }

    #[tokio::test]
    async fn test_read_error_closes_input() {
        let input = futures::stream::iter(vec![
            Err(std::io::Error::other("tty gone")),
            Ok(TerminalEvent::Key(press('x'))),
        ]);
        let mut handler = EventHandler::with_input(input, Duration::from_secs(3600));
        assert_eq!(drain_without_ticks(&mut handler).await, vec![Event::InputClosed]);
    }

    #[tokio::test]
    async fn test_ticks_while_idle() {
        let idle = futures::stream::pending::<std::io::Result<TerminalEvent>>();
        let mut handler = EventHandler::with_input(idle, Duration::from_millis(5));
        for _ in 0..3 {
            assert_eq!(handler.next().await, Event::Tick);
        }
    }
}

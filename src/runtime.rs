use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyModifiers};

use crate::engine::Command;
use crate::variant::GameVariant;

/// Unified event type consumed by the game loop
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// What a key press means to the front end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Engine(Command),
    Quit,
}

/// Maps a key to a front-end input for `variant`. Digits `1..=n` pick answer
/// `0..n-1` (or tap that cell on the mole board).
pub fn map_key(key: &KeyEvent, variant: GameVariant) -> Option<Input> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Input::Quit);
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Input::Quit),
        KeyCode::Char('s') | KeyCode::Enter => Some(Input::Engine(Command::Start)),
        KeyCode::Char('r') => Some(Input::Engine(Command::Reset)),
        KeyCode::Char(c) => {
            let digit = c.to_digit(10)? as u8;
            if digit == 0 || digit > variant.choice_count() {
                return None;
            }
            let choice = digit - 1;
            Some(Input::Engine(if variant.is_mole() {
                Command::Tap(choice)
            } else {
                Command::Answer(choice)
            }))
        }
        _ => None,
    }
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(GameEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(GameEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the game one event/tick at a time
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> GameEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        let ev = runner.step();
        match ev {
            GameEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            GameEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn digits_map_to_answers() {
        let variant = GameVariant::WordColor;
        assert_eq!(
            map_key(&key(KeyCode::Char('1')), variant),
            Some(Input::Engine(Command::Answer(0)))
        );
        assert_eq!(
            map_key(&key(KeyCode::Char('4')), variant),
            Some(Input::Engine(Command::Answer(3)))
        );
        assert_eq!(map_key(&key(KeyCode::Char('5')), variant), None);
        assert_eq!(map_key(&key(KeyCode::Char('0')), variant), None);
    }

    #[test]
    fn digits_map_to_taps_on_mole_board() {
        assert_eq!(
            map_key(&key(KeyCode::Char('9')), GameVariant::WhackAMole),
            Some(Input::Engine(Command::Tap(8)))
        );
        assert_eq!(
            map_key(&key(KeyCode::Char('4')), GameVariant::RockPaperScissors),
            None
        );
    }

    #[test]
    fn control_keys() {
        let variant = GameVariant::RockPaperScissors;
        assert_eq!(
            map_key(&key(KeyCode::Char('s')), variant),
            Some(Input::Engine(Command::Start))
        );
        assert_eq!(
            map_key(&key(KeyCode::Char('r')), variant),
            Some(Input::Engine(Command::Reset))
        );
        assert_eq!(map_key(&key(KeyCode::Esc), variant), Some(Input::Quit));
        assert_eq!(
            map_key(
                &KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                variant
            ),
            Some(Input::Quit)
        );
        assert_eq!(map_key(&key(KeyCode::Char('x')), variant), None);
    }
}

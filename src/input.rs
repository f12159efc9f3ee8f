use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

/// Key events the session understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Rune(char),
    Backspace,
    Enter,
    Escape,
    /// Explicit cancel (Ctrl+C)
    Abort,
    Unknown,
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read terminal input")]
    Read(#[from] io::Error),
    #[error("input stream closed")]
    Closed,
}

pub type InputMessage = Result<Key, InputError>;

/// Map a crossterm key event onto a session key
pub fn decode_key(key: KeyEvent) -> Key {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Key::Abort,
            _ => Key::Unknown,
        };
    }

    match key.code {
        KeyCode::Char(c) => Key::Rune(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        _ => Key::Unknown,
    }
}

/// Asynchronous producer of decoded keys.
///
/// Implementations push into a channel from their own thread; the event loop
/// only ever holds the receiving end.
pub trait InputSource: Send + 'static {
    fn receiver(&self) -> &Receiver<InputMessage>;
}

/// Production source: a thread blocking on crossterm reads
pub struct CrosstermInputSource {
    rx: Receiver<InputMessage>,
}

impl CrosstermInputSource {
    /// The reader thread cannot be interrupted while blocked on a read, so it
    /// exits lazily: on the next event after the receiver is dropped.
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = unbounded();

        thread::Builder::new()
            .name("mtype-input".to_string())
            .spawn(move || Self::read_loop(&tx))?;

        Ok(Self { rx })
    }

    fn read_loop(tx: &Sender<InputMessage>) {
        loop {
            let message = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Ok(decode_key(key)),
                Ok(_) => continue,
                Err(err) => {
                    warn!(target: "input", error = %err, "terminal_read_failed");
                    let _ = tx.send(Err(InputError::Read(err)));
                    break;
                }
            };

            if tx.send(message).is_err() {
                debug!(target: "input", "receiver_dropped");
                break;
            }
        }
    }
}

impl InputSource for CrosstermInputSource {
    fn receiver(&self) -> &Receiver<InputMessage> {
        &self.rx
    }
}

/// Source fed by hand, for headless runs and tests
pub struct ChannelInputSource {
    rx: Receiver<InputMessage>,
}

impl ChannelInputSource {
    pub fn new(rx: Receiver<InputMessage>) -> Self {
        Self { rx }
    }

    pub fn pair() -> (Sender<InputMessage>, Self) {
        let (tx, rx) = unbounded();
        (tx, Self::new(rx))
    }
}

impl InputSource for ChannelInputSource {
    fn receiver(&self) -> &Receiver<InputMessage> {
        &self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn decodes_printable_characters() {
        assert_eq!(
            decode_key(press(KeyCode::Char('a'), KeyModifiers::NONE)),
            Key::Rune('a')
        );
        assert_eq!(
            decode_key(press(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Key::Rune('A')
        );
        assert_eq!(
            decode_key(press(KeyCode::Char('é'), KeyModifiers::NONE)),
            Key::Rune('é')
        );
    }

    #[test]
    fn decodes_control_keys() {
        assert_eq!(
            decode_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Key::Abort
        );
        assert_eq!(
            decode_key(press(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            Key::Unknown
        );
        assert_eq!(
            decode_key(press(KeyCode::Backspace, KeyModifiers::NONE)),
            Key::Backspace
        );
        assert_eq!(
            decode_key(press(KeyCode::Enter, KeyModifiers::NONE)),
            Key::Enter
        );
        assert_eq!(decode_key(press(KeyCode::Esc, KeyModifiers::NONE)), Key::Escape);
    }

    #[test]
    fn unhandled_keys_are_unknown() {
        assert_eq!(decode_key(press(KeyCode::Left, KeyModifiers::NONE)), Key::Unknown);
        assert_eq!(decode_key(press(KeyCode::Tab, KeyModifiers::NONE)), Key::Unknown);
        assert_eq!(decode_key(press(KeyCode::F(1), KeyModifiers::NONE)), Key::Unknown);
    }

    #[test]
    fn channel_source_delivers_in_order() {
        let (tx, source) = ChannelInputSource::pair();
        tx.send(Ok(Key::Rune('a'))).unwrap();
        tx.send(Ok(Key::Backspace)).unwrap();

        let rx = source.receiver();
        assert_eq!(rx.recv().unwrap().unwrap(), Key::Rune('a'));
        assert_eq!(rx.recv().unwrap().unwrap(), Key::Backspace);
    }
}

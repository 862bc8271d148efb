//! Handle all the raw input directly from the end user.

use std::io::Read as _;

use color_eyre::eyre::Result;
use termwiz::input::{InputEvent, KeyCode, KeyEvent, Modifiers};

/// Bytes from STDIN
pub type BytesFromSTDIN = [u8; 128];

/// The things a user can ask for with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Action {
    /// Exit Particle Term
    Quit,
    /// Pause a running animation or resume a paused one
    TogglePause,
    /// Turn the lines between particles on or off
    ToggleLines,
    /// Turn the slow curving of particle paths on or off
    ToggleRotation,
}

impl Action {
    /// The action bound to an input event, if there is one.
    #[must_use]
    pub fn from_event(event: &InputEvent) -> Option<Self> {
        let InputEvent::Key(KeyEvent { key, modifiers }) = event else {
            return None;
        };

        let is_ctrl = modifiers.contains(Modifiers::CTRL);
        #[expect(clippy::wildcard_enum_match_arm, reason = "Only a few keys are bound")]
        let action = match key {
            KeyCode::Escape => Some(Self::Quit),
            KeyCode::Char('c' | 'C') if is_ctrl => Some(Self::Quit),
            KeyCode::Char(_) if is_ctrl => None,
            KeyCode::Char('q' | 'Q') => Some(Self::Quit),
            KeyCode::Char('p' | 'P') => Some(Self::TogglePause),
            KeyCode::Char('l' | 'L') => Some(Self::ToggleLines),
            KeyCode::Char('r' | 'R') => Some(Self::ToggleRotation),
            _ => None,
        };
        action
    }
}

/// Handle input from the user
pub(crate) struct Input {
    /// The main Particle Term protocol channel.
    protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
}

impl Input {
    /// Start a thread to listen and parse the end user's STDIN and forward any bound key presses
    /// to the rest of the application.
    pub fn start(
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> std::thread::JoinHandle<Result<()>> {
        // Blocking reads on STDIN are best kept off the async runtime.
        std::thread::spawn(move || -> Result<()> {
            let protocol_for_shutdown = protocol_tx.clone();
            let input = Self { protocol_tx };
            let result = input.consume_stdin();
            if let Err(error) = result {
                crate::run::broadcast_protocol_end(&protocol_for_shutdown);
                return Err(error);
            }
            Ok(())
        })
    }

    /// Listen to the end user's STDIN and try to parse all the bytes.
    fn consume_stdin(&self) -> Result<()> {
        tracing::debug!("Starting to listen on STDIN");

        let stdin = std::io::stdin();
        let mut reader = std::io::BufReader::new(stdin);
        let mut parser = termwiz::input::InputParser::new();

        loop {
            let mut buffer: BytesFromSTDIN = [0; 128];
            let count = reader.read(&mut buffer[..])?;
            if count == 0 {
                tracing::debug!("STDIN closed");
                return Ok(());
            }

            if let Some(bytes) = buffer.get(0..count) {
                tracing::trace!("Received STDIN input: {bytes:x?}");
                parser.parse(bytes, |event| self.parsed_event_callback(&event), false);
            } else {
                tracing::warn!("Couldn't get bytes from STDIN input buffer");
            }
        }
    }

    /// The callback for when the input parser detects known keyboard/mouse events.
    fn parsed_event_callback(&self, event: &InputEvent) {
        tracing::trace!("Parsed input event: {event:?}");
        let Some(action) = Action::from_event(event) else {
            return;
        };

        tracing::debug!("Key press triggered: {action:?}");
        let result = self.protocol_tx.send(crate::run::Protocol::Input(action));
        if let Err(error) = result {
            tracing::error!("Error sending input event from thread to task: {error:?}");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(key: KeyCode, modifiers: Modifiers) -> InputEvent {
        InputEvent::Key(KeyEvent { key, modifiers })
    }

    #[test]
    fn bound_keys() {
        assert_eq!(
            Action::from_event(&key(KeyCode::Char('q'), Modifiers::NONE)),
            Some(Action::Quit)
        );
        assert_eq!(
            Action::from_event(&key(KeyCode::Escape, Modifiers::NONE)),
            Some(Action::Quit)
        );
        assert_eq!(
            Action::from_event(&key(KeyCode::Char('c'), Modifiers::CTRL)),
            Some(Action::Quit)
        );
        assert_eq!(
            Action::from_event(&key(KeyCode::Char('p'), Modifiers::NONE)),
            Some(Action::TogglePause)
        );
        assert_eq!(
            Action::from_event(&key(KeyCode::Char('L'), Modifiers::SHIFT)),
            Some(Action::ToggleLines)
        );
        assert_eq!(
            Action::from_event(&key(KeyCode::Char('r'), Modifiers::NONE)),
            Some(Action::ToggleRotation)
        );
    }

    #[test]
    fn unbound_keys() {
        assert_eq!(
            Action::from_event(&key(KeyCode::Char('x'), Modifiers::NONE)),
            None
        );
        assert_eq!(
            Action::from_event(&key(KeyCode::Char('p'), Modifiers::CTRL)),
            None
        );
        assert_eq!(Action::from_event(&InputEvent::Wake), None);
    }
}

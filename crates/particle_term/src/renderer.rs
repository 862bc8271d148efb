//! Render particle frames to the user's terminal

use color_eyre::eyre::Result;
use tokio::sync::mpsc;

use termwiz::surface::Change as TermwizChange;
use termwiz::terminal::buffered::BufferedTerminal;
use termwiz::terminal::{ScreenSize, Terminal as TermwizTerminal};

use crate::run::Protocol;

/// How often to check for the terminal being resized when no frames are arriving.
const RESIZE_POLL: std::time::Duration = std::time::Duration::from_millis(250);

/// `Render`
pub(crate) struct Renderer {
    /// The terminal's width
    pub width: u16,
    /// The terminal's height
    pub height: u16,
}

impl Renderer {
    /// Create a renderer to render to a user's terminal
    pub fn new() -> Result<Self> {
        let size = Self::get_users_tty_size()?;
        Ok(Self {
            width: size.cols.try_into()?,
            height: size.rows.try_into()?,
        })
    }

    /// Instantiate and run
    pub fn start(
        frames_rx: mpsc::Receiver<termwiz::surface::Surface>,
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let protocol_rx = protocol_tx.subscribe();
        tokio::spawn(async move {
            let result = match Self::new() {
                Ok(mut renderer) => renderer.run(frames_rx, protocol_rx, &protocol_tx).await,
                Err(error) => Err(error),
            };

            if let Err(error) = result {
                crate::run::broadcast_protocol_end(&protocol_tx);
                return Err(error);
            }

            Ok(())
        })
    }

    /// We need this just because I can't figure out how to pass `Box<dyn Terminal>` to
    /// `BufferedTerminal::new()`
    fn get_termwiz_terminal() -> Result<impl TermwizTerminal> {
        let capabilities = termwiz::caps::Capabilities::new_from_env()?;
        Ok(termwiz::terminal::new_terminal(capabilities)?)
    }

    /// Just for initialisation
    pub fn get_users_tty_size() -> Result<ScreenSize> {
        let mut terminal = Self::get_termwiz_terminal()?;
        Ok(terminal.get_screen_size()?)
    }

    /// Get the user's current terminal size and propogate it
    fn handle_resize<T: TermwizTerminal>(
        &mut self,
        terminal: &mut BufferedTerminal<T>,
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
    ) -> Result<()> {
        let is_resized = terminal.check_for_resize()?;
        if !is_resized {
            return Ok(());
        }

        terminal.repaint()?;

        let (width, height) = terminal.dimensions();
        self.width = width.try_into()?;
        self.height = height.try_into()?;
        tracing::debug!("Terminal resized to {}x{}", self.width, self.height);
        protocol_tx.send(Protocol::Resize {
            width: self.width,
            height: self.height,
        })?;

        Ok(())
    }

    /// Draw frames as they arrive until the protocol says to end. It lives in its own method so
    /// that errors can be caught and the user's terminal always returned to how it was.
    async fn run(
        &mut self,
        frames_rx: mpsc::Receiver<termwiz::surface::Surface>,
        protocol_rx: tokio::sync::broadcast::Receiver<Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
    ) -> Result<()> {
        tracing::debug!("Putting user's terminal into raw mode");
        let mut users_terminal = Self::get_termwiz_terminal()?;
        users_terminal.set_raw_mode()?;
        users_terminal.enter_alternate_screen()?;
        let mut terminal = BufferedTerminal::new(users_terminal)?;
        Self::cursor_visibility(&mut terminal, false)?;

        let result = self
            .render_loop(&mut terminal, frames_rx, protocol_rx, protocol_tx)
            .await;

        tracing::debug!("Returning user's terminal to how it was");
        Self::cursor_visibility(&mut terminal, true)?;
        terminal.terminal().exit_alternate_screen()?;
        terminal.terminal().set_cooked_mode()?;

        result
    }

    /// The render loop itself.
    async fn render_loop<T: TermwizTerminal + Send>(
        &mut self,
        terminal: &mut BufferedTerminal<T>,
        mut frames_rx: mpsc::Receiver<termwiz::surface::Surface>,
        mut protocol_rx: tokio::sync::broadcast::Receiver<Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
    ) -> Result<()> {
        let mut resize_poll = tokio::time::interval(RESIZE_POLL);

        tracing::debug!("Starting render loop");
        #[expect(
            clippy::integer_division_remainder_used,
            reason = "`tokio::select! generates this.`"
        )]
        loop {
            tokio::select! {
                Some(frame) = frames_rx.recv() => {
                    self.handle_resize(terminal, protocol_tx)?;
                    Self::render(&frame, terminal)?;
                }
                _ = resize_poll.tick() => {
                    self.handle_resize(terminal, protocol_tx)?;
                }
                Ok(message) = protocol_rx.recv() => {
                    if matches!(message, Protocol::End) {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Exited render loop");

        Ok(())
    }

    /// Hide/show the cursor in the end user's terminal.
    fn cursor_visibility(
        terminal: &mut BufferedTerminal<impl TermwizTerminal>,
        is_visible: bool,
    ) -> Result<()> {
        let cursor_visibility = if is_visible {
            termwiz::surface::CursorVisibility::Visible
        } else {
            termwiz::surface::CursorVisibility::Hidden
        };
        terminal.add_change(TermwizChange::CursorVisibility(cursor_visibility));
        terminal.flush()?;

        Ok(())
    }

    /// Do a single render to the user's actual terminal. It uses a diffing algorithm to make
    /// the minimum number of changes.
    fn render(
        frame: &termwiz::surface::Surface,
        terminal: &mut BufferedTerminal<impl TermwizTerminal>,
    ) -> Result<()> {
        tracing::trace!("Rendering frame of size {:?}", frame.dimensions());
        terminal.draw_from_screen(frame, 0, 0);
        terminal.flush()?;
        Ok(())
    }
}

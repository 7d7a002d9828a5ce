use std::io::{self, Write};
use std::panic;
use std::sync::Once;

use crossterm::cursor;
use tf_core::cell::RESET;
use tf_core::traits::GridProbe;

use crate::compose::FrameBuffer;

/// Curseur en haut à gauche, sans effacer l'écran.
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

/// Émet les frames composées sur la sortie.
///
/// # Example
/// ```
/// use tf_render::screen::ScreenWriter;
/// let mut screen = ScreenWriter::new(Vec::new());
/// screen.cursor_home().unwrap();
/// assert_eq!(screen.get_ref(), b"\x1b[H");
/// ```
pub struct ScreenWriter<W: Write> {
    out: W,
}

impl<W: Write> ScreenWriter<W> {
    /// Wrap an output stream.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Move the cursor to row 1, column 1 (`ESC[H`).
    ///
    /// # Errors
    /// Propagates write or flush failures.
    pub fn cursor_home(&mut self) -> io::Result<()> {
        self.out.write_all(CURSOR_HOME)?;
        self.out.flush()
    }

    /// Write the whole buffer in one call and flush immediately.
    ///
    /// # Errors
    /// Propagates write or flush failures (e.g. broken pipe).
    pub fn paint(&mut self, buffer: &FrameBuffer) -> io::Result<()> {
        self.out.write_all(buffer.as_bytes())?;
        self.out.flush()
    }

    /// Underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Unwrap the stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Taille du terminal via crossterm. `None` hors TTY ou en cas d'échec.
pub struct TerminalProbe;

impl GridProbe for TerminalProbe {
    fn current_size(&self) -> Option<(u16, u16)> {
        match crossterm::terminal::size() {
            Ok(size) => Some(size),
            Err(e) => {
                log::debug!("Taille terminal indisponible : {e}");
                None
            }
        }
    }
}

static PANIC_HOOK: Once = Once::new();

/// Restauration best-effort sur stdout, partagée par le guard et le panic hook.
fn restore_stdout() {
    let mut out = io::stdout();
    let _ = out.write_all(RESET.as_bytes());
    let _ = crossterm::execute!(out, cursor::Show);
}

/// Installe (une seule fois) un hook qui restaure le terminal avant le message de panic.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_stdout();
            default_hook(info);
        }));
    });
}

/// Cache le curseur pendant la lecture et restaure l'état au drop.
///
/// Restoration writes a formatting reset and shows the cursor again, on
/// normal exit, error return, or interrupt.
///
/// # Example
/// ```
/// use tf_render::screen::TerminalGuard;
/// let mut out = Vec::new();
/// {
///     let _guard = TerminalGuard::enter(&mut out).unwrap();
/// }
/// assert!(out.ends_with(b"\x1b[?25h"));
/// ```
pub struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> TerminalGuard<W> {
    /// Hide the cursor on `out`.
    ///
    /// # Errors
    /// Returns an error if the escape sequence cannot be written.
    pub fn enter(mut out: W) -> io::Result<Self> {
        crossterm::execute!(out, cursor::Hide)?;
        Ok(Self { out })
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        // Best-effort : ignorer les erreurs pendant le drop.
        let _ = self.out.write_all(RESET.as_bytes());
        let _ = crossterm::execute!(self.out, cursor::Show);
    }
}

//! Raw-mode terminal backend and the blocking single-byte read loop
//! (§4.6 edge cases, §5 suspension points).
//!
//! Grounded directly on `core-terminal`'s `TerminalBackend` trait plus its
//! RAII `TerminalGuard`: raw mode and the alternate screen are scoped to
//! program lifetime and restored on every exit path, including panics,
//! because `Drop` runs regardless of how the scope is left.

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{stdin, stdout, Read};

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
}

pub struct CrosstermBackend {
    entered: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard {
            backend: self,
            active: true,
        })
    }

    /// Leave raw mode/alt-screen for the duration of `f` (used to hand the
    /// real terminal to a spawned editor/build/clipboard child), then
    /// restore it. §5: the only suspension points are blocking reads and
    /// spawn-and-wait; this brackets the latter.
    pub fn suspend<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        self.leave()?;
        let result = f();
        self.enter()?;
        Ok(result)
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(stdout(), LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
        }
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// RAII guard ensuring terminal state restoration even if the caller
/// early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
    active: bool,
}

impl<'a> Drop for TerminalGuard<'a> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}

impl<'a> TerminalGuard<'a> {
    /// Forward to the backend's own `suspend` (hand the real terminal to a
    /// child process for the duration of `f`) without re-borrowing it
    /// separately from the guard.
    pub fn suspend<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        self.backend.suspend(f)
    }
}

/// Current terminal size as `(cols, rows)`, queried once at startup — the
/// tool does not react to `SIGWINCH` (§5: no signal handling beyond OS
/// defaults).
pub fn terminal_size() -> Result<(usize, usize)> {
    let (cols, rows) = crossterm::terminal::size()?;
    Ok((cols as usize, rows as usize))
}

/// Block for exactly one byte from stdin. With raw mode enabled this is the
/// tool's only input primitive (§5: "the main loop reads exactly one byte
/// from the terminal, dispatches, then redraws" — no echo, no canonical
/// buffering).
pub fn read_byte() -> std::io::Result<u8> {
    let mut buf = [0u8; 1];
    stdin().read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Logical key read off the wire: either a plain byte or one of the
/// recognized arrow keys (decoded from the three-byte `ESC [ A/B/C/D`
/// sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Byte(u8),
    Up,
    Down,
    Right,
    Left,
}

/// Small explicit state machine for decoding arrow-key escape sequences
/// (§4.6 edge cases: "handlers must track a small state machine rather
/// than embedding literal multi-byte characters").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeState {
    Idle,
    SawEsc,
    SawBracket,
}

pub struct KeyReader {
    state: EscapeState,
}

impl Default for KeyReader {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyReader {
    pub fn new() -> Self {
        Self {
            state: EscapeState::Idle,
        }
    }

    /// Feed one raw byte; returns `Some(KeyInput)` once a complete logical
    /// key is known, or `None` while still the middle of an escape
    /// sequence (caller should read another byte and feed it in).
    pub fn feed(&mut self, byte: u8) -> Option<KeyInput> {
        match self.state {
            EscapeState::Idle => {
                if byte == 0x1b {
                    self.state = EscapeState::SawEsc;
                    None
                } else {
                    Some(KeyInput::Byte(byte))
                }
            }
            EscapeState::SawEsc => {
                if byte == b'[' {
                    self.state = EscapeState::SawBracket;
                    None
                } else {
                    // Bare Esc followed by an unrelated byte: surface the
                    // Esc itself and let the next feed re-process `byte`
                    // from Idle by treating it literally.
                    self.state = EscapeState::Idle;
                    Some(KeyInput::Byte(0x1b))
                }
            }
            EscapeState::SawBracket => {
                self.state = EscapeState::Idle;
                match byte {
                    b'A' => Some(KeyInput::Up),
                    b'B' => Some(KeyInput::Down),
                    b'C' => Some(KeyInput::Right),
                    b'D' => Some(KeyInput::Left),
                    other => Some(KeyInput::Byte(other)),
                }
            }
        }
    }
}

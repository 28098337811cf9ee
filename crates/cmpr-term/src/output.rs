//! Arena-backed output buffering and the redirect stack (§4.1: input,
//! output, and scratch regions share one arena so redirected output can be
//! captured without a second allocator).
//!
//! Normally output goes straight to the real terminal. Pushing a redirect
//! diverts subsequent writes into an arena span instead, which is how build
//! output and LLM scratch text get captured for later display or re-parsing
//! without shelling out to a temp file.

use cmpr_arena::{Arena, ArenaId, Span};
use std::io::{self, Write};

/// One level of output redirection: writes append to `arena` instead of
/// going to the terminal until this entry is popped.
struct Redirect {
    arena_id: ArenaId,
    start: usize,
}

/// Sink that writes to the real terminal unless a redirect is active, in
/// which case writes append to the top redirect's arena.
pub struct OutputSink<W: Write> {
    terminal: W,
    arena: Arena,
    stack: Vec<Redirect>,
}

impl<W: Write> OutputSink<W> {
    pub fn new(terminal: W) -> Self {
        Self {
            terminal,
            arena: Arena::new(),
            stack: Vec::new(),
        }
    }

    /// Begin capturing subsequent `write` calls into a fresh arena region
    /// instead of the terminal.
    pub fn push_redirect(&mut self) {
        self.stack.push(Redirect {
            arena_id: self.arena.id(),
            start: self.arena.len(),
        });
    }

    /// Stop capturing and return the span covering everything written since
    /// the matching `push_redirect`.
    pub fn pop_redirect(&mut self) -> Option<Span> {
        let redirect = self.stack.pop()?;
        Some(Span::new(redirect.arena_id, redirect.start, self.arena.len()))
    }

    pub fn redirect_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn captured(&self, span: Span) -> Option<&[u8]> {
        Some(self.arena.get(span))
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_all(s.as_bytes())
    }

    /// Unwrap the sink, discarding any still-open redirects, to recover the
    /// underlying writer (used by callers that buffer a full frame in memory
    /// before handing it to the real terminal, and by tests).
    pub fn into_inner(self) -> W {
        self.terminal
    }
}

impl<W: Write> Write for OutputSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.stack.is_empty() {
            self.terminal.write(buf)
        } else {
            self.arena.append(buf);
            Ok(buf.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.stack.is_empty() {
            self.terminal.flush()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_go_to_terminal_when_no_redirect_active() {
        let mut sink = OutputSink::new(Vec::new());
        sink.write_str("hello").unwrap();
        assert_eq!(sink.terminal, b"hello");
    }

    #[test]
    fn redirected_writes_are_captured_not_sent_to_terminal() {
        let mut sink = OutputSink::new(Vec::new());
        sink.push_redirect();
        sink.write_str("captured").unwrap();
        let span = sink.pop_redirect().unwrap();
        assert!(sink.terminal.is_empty());
        assert_eq!(sink.captured(span).unwrap(), b"captured");
    }

    #[test]
    fn nested_redirects_each_capture_their_own_span() {
        let mut sink = OutputSink::new(Vec::new());
        sink.push_redirect();
        sink.write_str("outer-").unwrap();
        sink.push_redirect();
        sink.write_str("inner").unwrap();
        let inner = sink.pop_redirect().unwrap();
        sink.write_str("outer-end").unwrap();
        let outer = sink.pop_redirect().unwrap();
        assert_eq!(sink.captured(inner).unwrap(), b"inner");
        assert_eq!(sink.captured(outer).unwrap(), b"outer-inner-outer-end");
    }

    #[test]
    fn pop_without_push_returns_none() {
        let mut sink = OutputSink::new(Vec::new());
        assert!(sink.pop_redirect().is_none());
    }
}

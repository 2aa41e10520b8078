//! Output sinks for `print` and `println`.
//!
//! - `Stdout`: the default for hosts running real programs
//! - `Buffer`: captures output for tests and embedding hosts
//! - `Silent`: discards everything
//!
//! Enum dispatch instead of trait objects; the set of sinks is closed.
//! Handlers are shared by every spawned task, so writes take a lock and a
//! single `print` call is never interleaved with another task's output.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Print handler selected at interpreter construction.
pub enum PrintHandlerImpl {
    Stdout,
    Buffer(Mutex<String>),
    Silent,
}

impl PrintHandlerImpl {
    /// Print a line (with newline).
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => {
                let mut out = std::io::stdout().lock();
                // A closed stdout is not the program's failure.
                let _ = writeln!(out, "{msg}");
            }
            Self::Buffer(buf) => {
                let mut buf = buf.lock();
                buf.push_str(msg);
                buf.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Print without newline. Stdout is flushed so prompts show up.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout => {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(msg.as_bytes());
                let _ = out.flush();
            }
            Self::Buffer(buf) => buf.lock().push_str(msg),
            Self::Silent => {}
        }
    }

    /// Captured output. Empty for handlers that don't capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(buf) => buf.lock().clone(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    /// Drain captured output.
    pub fn take_output(&self) -> String {
        match self {
            Self::Buffer(buf) => std::mem::take(&mut *buf.lock()),
            Self::Stdout | Self::Silent => String::new(),
        }
    }
}

/// Shared print handler, cloned into every spawned task.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

/// Buffer handler for capturing output.
pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn buffer_handler_captures_lines_and_fragments() {
        let handler = buffer_handler();
        handler.print("hello");
        handler.print(" ");
        handler.println("world");
        assert_eq!(handler.get_output(), "hello world\n");
    }

    #[test]
    fn take_output_drains() {
        let handler = buffer_handler();
        handler.println("a");
        assert_eq!(handler.take_output(), "a\n");
        assert_eq!(handler.get_output(), "");
    }

    #[test]
    fn silent_handler_discards_output() {
        let handler = silent_handler();
        handler.println("hello");
        assert_eq!(handler.get_output(), "");
    }

    #[test]
    fn buffer_handler_is_thread_safe() {
        let handler = buffer_handler();
        let threads: Vec<_> = (0..2)
            .map(|_| {
                let handler = Arc::clone(&handler);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        handler.println("x");
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(handler.get_output().lines().count(), 200);
    }
}

//! Input sources for `input()` and `key()`.
//!
//! Reads block only the calling task. Tests and embedding hosts use a
//! scripted source instead of stdin.

use std::collections::VecDeque;
use std::io::{BufRead, Read};
use std::sync::Arc;

use parking_lot::Mutex;

pub enum InputHandlerImpl {
    Stdin,
    /// Pre-recorded lines. `key()` consumes one character at a time.
    Scripted(Mutex<VecDeque<String>>),
}

impl InputHandlerImpl {
    /// Read one line without its terminator. `None` at end of input.
    pub fn read_line(&self) -> Option<String> {
        match self {
            Self::Stdin => {
                let mut line = String::new();
                match std::io::stdin().lock().read_line(&mut line) {
                    Ok(0) | Err(_) => None,
                    Ok(_) => {
                        let trimmed = line.trim_end_matches(['\n', '\r']).len();
                        line.truncate(trimmed);
                        Some(line)
                    }
                }
            }
            Self::Scripted(lines) => lines.lock().pop_front(),
        }
    }

    /// Read a single character.
    ///
    /// Stdin is not switched to raw mode, so on a terminal the character
    /// arrives once the line is submitted.
    pub fn read_key(&self) -> Option<char> {
        match self {
            Self::Stdin => {
                let mut bytes = Vec::with_capacity(4);
                let stdin = std::io::stdin();
                let mut handle = stdin.lock();
                let mut byte = [0u8; 1];
                while bytes.len() < 4 {
                    match handle.read(&mut byte) {
                        Ok(1) => bytes.push(byte[0]),
                        _ => return None,
                    }
                    if let Ok(s) = std::str::from_utf8(&bytes) {
                        return s.chars().next();
                    }
                }
                None
            }
            Self::Scripted(lines) => {
                let mut lines = lines.lock();
                loop {
                    let front = lines.front_mut()?;
                    let mut chars = front.chars();
                    if let Some(c) = chars.next() {
                        *front = chars.as_str().to_string();
                        return Some(c);
                    }
                    lines.pop_front();
                }
            }
        }
    }
}

pub type SharedInputHandler = Arc<InputHandlerImpl>;

pub fn stdin_handler() -> SharedInputHandler {
    Arc::new(InputHandlerImpl::Stdin)
}

/// Scripted input, one entry per line.
pub fn scripted_handler<I, S>(lines: I) -> SharedInputHandler
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arc::new(InputHandlerImpl::Scripted(Mutex::new(
        lines.into_iter().map(Into::into).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scripted_lines_in_order() {
        let input = scripted_handler(["first", "second"]);
        assert_eq!(input.read_line().as_deref(), Some("first"));
        assert_eq!(input.read_line().as_deref(), Some("second"));
        assert_eq!(input.read_line(), None);
    }

    #[test]
    fn scripted_keys_walk_characters_then_lines() {
        let input = scripted_handler(["ab", "", "c"]);
        assert_eq!(input.read_key(), Some('a'));
        assert_eq!(input.read_key(), Some('b'));
        assert_eq!(input.read_key(), Some('c'));
        assert_eq!(input.read_key(), None);
    }
}

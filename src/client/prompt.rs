//! Interactive request builder
//!
//! Menu-driven prompt used by the CLI when no subcommand is given.
//!
//! Answers are whitespace-separated words, so a key or value cannot contain
//! spaces. Several answers may share one line (`1 name alice`) and blank
//! lines are skipped.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::Result;
use crate::protocol::Request;

/// Ask for a request kind, a key and (SET only) a value
///
/// Returns `Ok(None)` when the choice is not 1, 2 or 3, or when input ends
/// before the request is complete. Words left over after the request are
/// discarded.
pub fn read_request<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<Request>> {
    let mut input = Words::new(input);

    write!(output, "1. SET\n2. GET\n3. STATS\n")?;
    output.flush()?;

    let choice = match input.next_word()? {
        Some(word) => word.parse::<u8>().ok(),
        None => return Ok(None),
    };
    if !matches!(choice, Some(1..=3)) {
        return Ok(None);
    }

    writeln!(output, "Key:")?;
    output.flush()?;
    let Some(key) = input.next_word()? else {
        return Ok(None);
    };

    let request = match choice {
        Some(1) => {
            writeln!(output, "Value:")?;
            output.flush()?;
            let Some(value) = input.next_word()? else {
                return Ok(None);
            };
            Request::set(key, value)
        }
        Some(2) => Request::get(key),
        // STATS still asks for a key, which it ignores
        _ => Request::stats(),
    };
    Ok(Some(request))
}

/// Whitespace-separated words pulled from a line reader
struct Words<'a, R> {
    input: &'a mut R,
    pending: VecDeque<String>,
}

impl<'a, R: BufRead> Words<'a, R> {
    fn new(input: &'a mut R) -> Self {
        Self {
            input,
            pending: VecDeque::new(),
        }
    }

    /// Next word, reading more lines as needed; `None` at end of input
    fn next_word(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        while self.pending.is_empty() {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.pending.pop_front())
    }
}

//! Where input lines come from.
//!
//! The REPL only needs "one line, or end of input". A terminal gets a
//! `rustyline` editor; anything else is read as plain lines.

use std::io::{self, BufRead, Write};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub trait LineSource {
	/// Reads the next line without its line terminator.
	///
	/// `prompt` is displayed first when given. `Ok(None)` means end of input.
	fn read_line(&mut self, prompt: Option<&str>) -> io::Result<Option<String>>;
}

/// Plain line reader over any buffered input, e.g. a locked stdin.
pub struct Reader<R: BufRead> {
	inner: R,
}

impl<R: BufRead> Reader<R> {
	pub fn new(inner: R) -> Reader<R> {
		Reader { inner: inner }
	}
}

impl<R: BufRead> LineSource for Reader<R> {
	fn read_line(&mut self, prompt: Option<&str>) -> io::Result<Option<String>> {
		if let Some(prompt) = prompt {
			let mut stdout = io::stdout();
			stdout.write_all(prompt.as_bytes())?;
			stdout.flush()?;
		}
		let mut buf: Vec<u8> = vec![];
		if self.inner.read_until(b'\n', &mut buf)? == 0 {
			return Ok(None);
		}
		if buf.last() == Some(&b'\n') {
			buf.pop();
			if buf.last() == Some(&b'\r') {
				buf.pop();
			}
		}
		Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
	}
}

/// Interactive line editor with in-memory history.
pub struct Editor {
	inner: DefaultEditor,
}

impl Editor {
	pub fn new() -> rustyline::Result<Editor> {
		Ok(Editor { inner: DefaultEditor::new()? })
	}
}

impl LineSource for Editor {
	fn read_line(&mut self, prompt: Option<&str>) -> io::Result<Option<String>> {
		match self.inner.readline(prompt.unwrap_or("")) {
			Ok(line) => {
				if !line.trim().is_empty() {
					let _ = self.inner.add_history_entry(line.as_str());
				}
				Ok(Some(line))
			},
			// ^C drops the line being edited
			Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
			Err(ReadlineError::Eof) => Ok(None),
			Err(ReadlineError::Io(e)) => Err(e),
			Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
		}
	}
}

use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State { Normal, InSingleQuote, InDoubleQuote }

/// A single field produced by the tokenizer.
///
/// `quoted` is set when any part of the field came from inside quotes, so
/// the parser can tell an operator such as `>` from a quoted `">"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
	pub text: String,
	pub quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
	pub fields: Vec<Field>,
	/// False when the line ended inside a single or double quote.
	pub well_formed: bool,
}

impl Tokens {
	pub fn texts(&self) -> Vec<&str> {
		self.fields.iter().map(|f| f.text.as_str()).collect()
	}
}

struct Lexer {
	delimiter: char,
	keep_empty: bool,
	keep_quotes: bool,
	state: State,
	current: String,
	quoted: bool,
	fields: Vec<Field>,
}

// Same set as C isspace() in the default locale.
pub(crate) fn is_space(c: char) -> bool {
	match c {
		' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c' => true,
		_ => false,
	}
}

impl Lexer {
	fn new(delimiter: char, keep_empty: bool, keep_quotes: bool) -> Lexer {
		Lexer {
			delimiter: delimiter,
			keep_empty: keep_empty,
			keep_quotes: keep_quotes,
			state: State::Normal,
			current: String::new(),
			quoted: false,
			fields: vec![],
		}
	}

	fn is_separator(&self, c: char) -> bool {
		if self.delimiter == ' ' {
			is_space(c)
		} else {
			c == self.delimiter
		}
	}

	fn toggle(&mut self, c: char, next: State) {
		self.state = next;
		self.quoted = true;
		if self.keep_quotes {
			self.current.push(c);
		}
	}

	fn flush(&mut self) {
		let text = mem::take(&mut self.current);
		let quoted = mem::replace(&mut self.quoted, false);
		if self.keep_empty || !text.is_empty() {
			self.fields.push(Field { text: text, quoted: quoted });
		}
	}

	fn feed(&mut self, c: char) {
		match (self.state, c) {
			(State::Normal, '\'') => self.toggle(c, State::InSingleQuote),
			(State::InSingleQuote, '\'') => self.toggle(c, State::Normal),
			(State::Normal, '"') => self.toggle(c, State::InDoubleQuote),
			(State::InDoubleQuote, '"') => self.toggle(c, State::Normal),
			(State::Normal, c) if self.is_separator(c) => self.flush(),
			(_, c) => self.current.push(c),
		}
	}

	fn finish(mut self) -> Tokens {
		let well_formed = self.state == State::Normal;
		self.flush();
		Tokens { fields: self.fields, well_formed: well_formed }
	}
}

fn run(line: &str, delimiter: char, keep_empty: bool, keep_quotes: bool) -> Tokens {
	let mut lexer = Lexer::new(delimiter, keep_empty, keep_quotes);
	for c in line.chars() {
		lexer.feed(c);
	}
	lexer.finish()
}

/// Splits `line` on `delimiter` outside of quotes.
///
/// Quote characters toggle their state and are dropped from the output.
/// With a space delimiter any whitespace separates fields. Empty fields are
/// kept only when `keep_empty` is set.
pub fn tokenize(line: &str, delimiter: char, keep_empty: bool) -> Tokens {
	run(line, delimiter, keep_empty, false)
}

/// Like [`tokenize`], but quote characters stay in the field text so a
/// later pass can interpret them again.
pub fn split_keeping_quotes(line: &str, delimiter: char, keep_empty: bool) -> Tokens {
	run(line, delimiter, keep_empty, true)
}

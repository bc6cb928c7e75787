/// One pipeline stage: the program name followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
	pub parts: Vec<String>,
}

impl Command {
	pub fn new(parts: Vec<String>) -> Command {
		Command { parts: parts }
	}
}

/// A parsed input line.
///
/// `input_file` applies to the first stage only, `output_file` to the last
/// stage only, and `background` to the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
	pub commands: Vec<Command>,
	pub input_file: Option<String>,
	pub output_file: Option<String>,
	pub background: bool,
}

impl Expression {
	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}
}

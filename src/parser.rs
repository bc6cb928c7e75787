use std::{error, fmt};

use crate::tokenizer::{self, Field};
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
	UnbalancedQuotes,
	InvalidPipe,
	EmptyCommand,
}

impl fmt::Display for ParseError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ParseError::UnbalancedQuotes => write!(f, "Parse error: Unbalanced quotes in one or more commands."),
			ParseError::InvalidPipe => write!(f, "Parse error: Incorrect usage of `|`."),
			ParseError::EmptyCommand => write!(f, "Parse error: Empty command."),
		}
	}
}

impl error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

fn is_operator(field: &Field, op: &str) -> bool {
	!field.quoted && field.text == op
}

// A trailing operator is only stripped when a program name remains in front of it.
fn strip_background(fields: &mut Vec<Field>) -> bool {
	let len = fields.len();
	if len > 1 && is_operator(&fields[len - 1], "&") {
		fields.truncate(len - 1);
		true
	} else {
		false
	}
}

fn strip_redirect(fields: &mut Vec<Field>, op: &str) -> Option<String> {
	let len = fields.len();
	if len > 2 && is_operator(&fields[len - 2], op) {
		let target = fields.pop().map(|f| f.text);
		fields.pop();
		target
	} else {
		None
	}
}

fn trim(segment: &str) -> &str {
	segment.trim_matches(tokenizer::is_space)
}

/// Parses one input line into an [`Expression`].
///
/// The line is split on `|` first and every stage on whitespace after that,
/// both passes sharing the same quote rules. `&` and `> file` are only
/// recognized at the end of the last stage, `< file` at the end of the first.
pub fn parse(line: &str) -> ParseResult<Expression> {
	let split = tokenizer::split_keeping_quotes(line, '|', true);
	if !split.well_formed {
		return Err(ParseError::UnbalancedQuotes);
	}
	let segments: Vec<&str> = split.fields.iter().map(|f| trim(&f.text)).collect();
	if segments.iter().any(|s| s.is_empty()) {
		if segments.len() > 1 {
			return Err(ParseError::InvalidPipe);
		}
		return Ok(Expression::default());
	}

	let mut expression = Expression::default();
	let last = segments.len() - 1;
	for (i, segment) in segments.iter().enumerate() {
		// Segments of a balanced line are balanced themselves.
		let mut fields = tokenizer::tokenize(segment, ' ', false).fields;
		if i == last {
			if strip_background(&mut fields) {
				expression.background = true;
			}
			if let Some(target) = strip_redirect(&mut fields, ">") {
				expression.output_file = Some(target);
			}
		}
		if i == 0 {
			if let Some(target) = strip_redirect(&mut fields, "<") {
				expression.input_file = Some(target);
			}
		}
		if fields.is_empty() {
			return Err(ParseError::EmptyCommand);
		}
		expression.commands.push(Command::new(fields.into_iter().map(|f| f.text).collect()));
	}
	Ok(expression)
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn cmd(parts: &[&str]) -> Command {
		Command::new(parts.iter().map(|s| s.to_string()).collect())
	}

	#[test]
	fn blank_lines_are_empty_expressions() {
		assert_eq!(parse(""), Ok(Expression::default()));
		assert_eq!(parse("   \t "), Ok(Expression::default()));
	}

	#[test]
	fn empty_segment_between_pipes() {
		assert_eq!(parse("echo a | | wc"), Err(ParseError::InvalidPipe));
		assert_eq!(parse("| wc"), Err(ParseError::InvalidPipe));
		assert_eq!(parse("ls |"), Err(ParseError::InvalidPipe));
		assert_eq!(parse("|"), Err(ParseError::InvalidPipe));
	}

	#[test]
	fn all_redirections_on_one_stage() {
		let e = parse("cmd < in.txt > out.txt &").unwrap();
		assert_eq!(e, Expression {
			commands: vec![cmd(&["cmd"])],
			input_file: Some("in.txt".to_string()),
			output_file: Some("out.txt".to_string()),
			background: true,
		});
	}

	#[test]
	fn pipeline_stages_in_order() {
		let e = parse("cat < a.txt | sort -r | uniq > b.txt").unwrap();
		assert_eq!(e.commands, vec![cmd(&["cat"]), cmd(&["sort", "-r"]), cmd(&["uniq"])]);
		assert_eq!(e.input_file.as_deref(), Some("a.txt"));
		assert_eq!(e.output_file.as_deref(), Some("b.txt"));
		assert!(!e.background);
	}

	#[test]
	fn redirections_only_apply_at_their_position() {
		// `>` on the first stage and `<` on the last are ordinary arguments
		let e = parse("echo > x | grep < y").unwrap();
		assert_eq!(e.commands, vec![cmd(&["echo", ">", "x"]), cmd(&["grep", "<", "y"])]);
		assert_eq!(e.input_file, None);
		assert_eq!(e.output_file, None);
	}

	#[test]
	fn background_marker_before_output_redirect_is_not_stripped() {
		let e = parse("echo hi & > out").unwrap();
		assert!(!e.background);
		assert_eq!(e.commands, vec![cmd(&["echo", "hi", "&"])]);
		assert_eq!(e.output_file.as_deref(), Some("out"));
	}

	#[test]
	fn quotes_protect_operators() {
		let e = parse(r#"echo "a | b" '>' x "&""#).unwrap();
		assert_eq!(e.commands, vec![cmd(&["echo", "a | b", ">", "x", "&"])]);
		assert_eq!(e.output_file, None);
		assert!(!e.background);
	}

	#[test]
	fn quoted_redirect_target() {
		let e = parse(r#"sort > "my file.txt""#).unwrap();
		assert_eq!(e.output_file.as_deref(), Some("my file.txt"));
	}

	#[test]
	fn lone_operators_stay_arguments() {
		assert_eq!(parse("&").unwrap().commands, vec![cmd(&["&"])]);
		assert_eq!(parse("> out").unwrap().commands, vec![cmd(&[">", "out"])]);
	}

	#[test]
	fn quotes_in_every_stage() {
		let e = parse(r#"printf '%s\n' "a | b" | tr 'a b' "x'y""#).unwrap();
		assert_eq!(e.commands, vec![cmd(&["printf", "%s\\n", "a | b"]), cmd(&["tr", "a b", "x'y"])]);
	}

	#[test]
	fn unbalanced_quotes() {
		assert_eq!(parse(r#"echo "a"#), Err(ParseError::UnbalancedQuotes));
		assert_eq!(parse("echo 'a | wc"), Err(ParseError::UnbalancedQuotes));
	}

	#[test]
	fn quoted_empty_stage() {
		assert_eq!(parse("''"), Err(ParseError::EmptyCommand));
		assert_eq!(parse("ls | \"\" | wc"), Err(ParseError::EmptyCommand));
	}

	#[test]
	fn messages() {
		assert_eq!(ParseError::InvalidPipe.to_string(), "Parse error: Incorrect usage of `|`.");
	}
}

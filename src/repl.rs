use std::{env, io};

use log::debug;

use crate::eval::{self, EvalResult};
use crate::global;
use crate::input::LineSource;
use crate::parser;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
	EndOfInput,
	/// The `exit` builtin was run.
	Exit,
}

/// Working directory followed by `$ `.
pub fn prompt() -> String {
	match env::current_dir() {
		Ok(dir) => format!("{}$ ", dir.display()),
		Err(_) => "$ ".to_string(),
	}
}

/// Prints a `[done]` line for every background process that has finished.
pub fn report_jobs(state: &mut global::State) {
	for pid in state.job_set.poll() {
		println!("[done] {}", pid);
	}
}

/// Reads, parses and runs lines until end of input or `exit`.
pub fn run(state: &mut global::State, source: &mut dyn LineSource, show_prompt: bool) -> io::Result<Stop> {
	loop {
		report_jobs(state);

		let prompt = if show_prompt { Some(prompt()) } else { None };
		let line = match source.read_line(prompt.as_deref())? {
			Some(line) => line,
			None => return Ok(Stop::EndOfInput),
		};

		let expression = match parser::parse(&line) {
			Ok(expression) => expression,
			Err(e) => {
				eprintln!("{}", e);
				continue;
			},
		};
		debug!("{:?}", expression);

		match eval::eval(state, &expression) {
			EvalResult::Exit => return Ok(Stop::Exit),
			EvalResult::Done(status) => debug!("status {}", status),
		}
	}
}

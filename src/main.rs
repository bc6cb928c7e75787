use std::io::{self, IsTerminal};
use std::process::ExitCode;

use log::warn;

use ish::config::Args;
use ish::global;
use ish::input::{Editor, LineSource, Reader};
use ish::{logger, repl};

fn main() -> ExitCode {
	let args: Args = argh::from_env();
	if let Err(e) = logger::init(args.log_level()) {
		eprintln!("ish: cannot install logger: {}", e);
	}

	let interactive = io::stdin().is_terminal();
	let show_prompt = args.show_prompt(interactive);
	let stdin = io::stdin();
	let mut source: Box<dyn LineSource> = if show_prompt {
		match Editor::new() {
			Ok(editor) => Box::new(editor),
			Err(e) => {
				warn!("line editor unavailable: {}", e);
				Box::new(Reader::new(stdin.lock()))
			},
		}
	} else {
		Box::new(Reader::new(stdin.lock()))
	};

	let mut state = global::State::new();
	match repl::run(&mut state, source.as_mut(), show_prompt) {
		Ok(_) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("ish: {}", e);
			ExitCode::FAILURE
		},
	}
}

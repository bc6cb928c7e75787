use nix::errno::Errno;
use nix::unistd;

use crate::global;
use crate::types::Expression;

/// Result of running an internal command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	Status(i32),
	/// `exit` was requested; the caller must leave its loop.
	Exit,
}

pub type Builtin = fn(&mut global::State, &[String]) -> Outcome;

fn builtin_cd(_: &mut global::State, args: &[String]) -> Outcome {
	let result = match args {
		[dir] => unistd::chdir(dir.as_str()),
		_ => Err(Errno::EINVAL),
	};
	match result {
		Ok(()) => Outcome::Status(0),
		Err(e) => {
			eprintln!("cd: {}", e.desc());
			Outcome::Status(e as i32)
		},
	}
}

fn builtin_exit(_: &mut global::State, _: &[String]) -> Outcome {
	Outcome::Exit
}

/// True for every name the shell implements itself, whatever the arguments.
pub fn is_builtin_name(name: &str) -> bool {
	match name {
		"cd" | "exit" => true,
		_ => false,
	}
}

/// Looks up a builtin by name and argument count.
///
/// `cd` takes exactly one argument and `exit` none; other forms are left to
/// process execution.
pub fn match_builtin(parts: &[String]) -> Option<(Builtin, &[String])> {
	let (name, args) = parts.split_first()?;
	match (name.as_str(), args.len()) {
		("cd", 1) => Some((builtin_cd as Builtin, args)),
		("exit", 0) => Some((builtin_exit as Builtin, args)),
		_ => None,
	}
}

/// Runs `expression` as an internal command if it is one.
///
/// Returns `None` when the expression is not exactly one command naming a
/// builtin, in which case it has to go to the pipeline executor.
pub fn dispatch(state: &mut global::State, expression: &Expression) -> Option<Outcome> {
	if expression.commands.len() != 1 {
		return None;
	}
	let (func, args) = match_builtin(&expression.commands[0].parts)?;
	Some(func(state, args))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parser::parse;
	use std::env;

	fn run(line: &str) -> Option<Outcome> {
		let mut state = global::State::new();
		dispatch(&mut state, &parse(line).unwrap())
	}

	#[test]
	fn exit_without_arguments() {
		assert_eq!(run("exit"), Some(Outcome::Exit));
	}

	#[test]
	fn other_forms_fall_through() {
		assert_eq!(run("exit 1"), None);
		assert_eq!(run("cd"), None);
		assert_eq!(run("cd a b"), None);
		assert_eq!(run("ls -l"), None);
	}

	#[test]
	fn pipelines_are_never_dispatched() {
		assert_eq!(run("exit | cat"), None);
		assert_eq!(run("echo x | cd /"), None);
	}

	#[test]
	fn failed_cd_keeps_working_directory() {
		let before = env::current_dir().unwrap();
		assert_eq!(run("cd /nonexistent/ish-test-dir"), Some(Outcome::Status(libc::ENOENT)));
		assert_eq!(env::current_dir().unwrap(), before);
	}

	#[test]
	fn cd_needs_exactly_one_directory() {
		let mut state = global::State::new();
		let before = env::current_dir().unwrap();
		assert_eq!(builtin_cd(&mut state, &[]), Outcome::Status(libc::EINVAL));
		assert_eq!(builtin_cd(&mut state, &["/".to_string(), "/tmp".to_string()]), Outcome::Status(libc::EINVAL));
		assert_eq!(env::current_dir().unwrap(), before);
	}

	#[test]
	fn builtin_names() {
		assert!(is_builtin_name("cd"));
		assert!(is_builtin_name("exit"));
		assert!(!is_builtin_name("exit2"));
		assert!(!is_builtin_name("c"));
	}
}

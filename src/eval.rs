use std::ffi::{self, CStr, CString};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::{error, fmt, mem};

use log::debug;
use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::signal::Signal;
use nix::sys::stat::Mode;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use crate::builtin;
use crate::global;
use crate::job;
use crate::types::{Command, Expression};

#[derive(Debug)]
pub enum ExecError {
	/// A system call failed; carries the operation name shown to the user.
	Sys(&'static str, nix::Error),
	NulError(ffi::NulError),
}

impl ExecError {
	/// Exit status used by a child that fails with this error.
	pub fn exit_code(&self) -> i32 {
		match *self {
			ExecError::Sys(_, e) => e as i32,
			ExecError::NulError(_) => libc::EINVAL,
		}
	}
}

impl From<ffi::NulError> for ExecError {
	fn from(e: ffi::NulError) -> ExecError {
		ExecError::NulError(e)
	}
}

impl fmt::Display for ExecError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ExecError::Sys(op, e) => write!(f, "{}: {}", op, e.desc()),
			ExecError::NulError(ref e) => write!(f, "argument contains a nul byte: {}", e),
		}
	}
}

impl error::Error for ExecError {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match *self {
			ExecError::Sys(_, ref e) => Some(e),
			ExecError::NulError(ref e) => Some(e),
		}
	}
}

trait Syscall<T> {
	fn during(self, op: &'static str) -> Result<T, ExecError>;
}

impl<T> Syscall<T> for nix::Result<T> {
	fn during(self, op: &'static str) -> Result<T, ExecError> {
		self.map_err(|e| ExecError::Sys(op, e))
	}
}

/// Retries a system call interrupted by a signal.
fn syscall<F, T>(f: F) -> nix::Result<T>
	where F: Fn() -> nix::Result<T>
{
	loop {
		match f() {
			Err(Errno::EINTR) => (),
			result => return result,
		}
	}
}

struct Pipe {
	read: OwnedFd,
	write: OwnedFd,
}

// Close-on-exec keeps a pipe from leaking into processes spawned elsewhere;
// the copies made by dup2 onto stdin/stdout do not carry the flag.
fn open_pipes(count: usize) -> Result<Vec<Pipe>, ExecError> {
	(0 .. count)
		.map(|_| unistd::pipe2(OFlag::O_CLOEXEC).map(|(read, write)| Pipe { read: read, write: write }).during("pipe"))
		.collect()
}

/// Everything a forked child needs, prepared before forking.
struct Stage<'a> {
	index: usize,
	count: usize,
	argv: &'a [CString],
	input_file: Option<&'a str>,
	output_file: Option<&'a str>,
	background: bool,
}

impl<'a> Stage<'a> {
	fn is_first(&self) -> bool {
		self.index == 0
	}

	fn is_last(&self) -> bool {
		self.index + 1 == self.count
	}
}

// Raw writes of static pieces, nothing formatted: another thread may hold
// the stderr lock at fork time.
fn child_report(msg: &[u8]) {
	unsafe { libc::write(libc::STDERR_FILENO, msg.as_ptr() as *const libc::c_void, msg.len()) };
}

fn child_report_error(e: &ExecError) {
	match *e {
		ExecError::Sys(op, errno) => {
			child_report(op.as_bytes());
			child_report(b": ");
			child_report(errno.desc().as_bytes());
		},
		ExecError::NulError(_) => child_report(b"argument contains a nul byte"),
	}
	child_report(b"\n");
}

fn child_exit(code: i32) -> ! {
	unsafe { libc::_exit(code) }
}

fn redirect_file(path: &str, flags: OFlag, target: RawFd, open_op: &'static str, dup_op: &'static str) -> Result<(), ExecError> {
	let mode = Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH;
	let fd = fcntl::open(path, flags, mode).during(open_op)?;
	let r = unistd::dup2(fd, target).during(dup_op);
	if fd != target {
		let _ = unistd::close(fd);
	}
	r.map(|_| ())
}

// Order: file redirections, then pipe ends, then closing every pipe descriptor.
fn setup_stage(stage: &Stage, pipes: Vec<Pipe>) -> Result<(), ExecError> {
	if stage.is_first() {
		if let Some(path) = stage.input_file {
			redirect_file(path, OFlag::O_RDONLY, libc::STDIN_FILENO, "open input", "dup2 input")?;
		} else if stage.background {
			unistd::close(libc::STDIN_FILENO).during("close stdin")?;
		}
	}
	if stage.is_last() {
		if let Some(path) = stage.output_file {
			let flags = OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC;
			redirect_file(path, flags, libc::STDOUT_FILENO, "open output", "dup2 output")?;
		}
	}
	if !stage.is_first() {
		unistd::dup2(pipes[stage.index - 1].read.as_raw_fd(), libc::STDIN_FILENO).during("dup2 pipe in")?;
	}
	if !stage.is_last() {
		unistd::dup2(pipes[stage.index].write.as_raw_fd(), libc::STDOUT_FILENO).during("dup2 pipe out")?;
	}
	drop(pipes);
	Ok(())
}

fn exec_stage(stage: Stage, pipes: Vec<Pipe>) -> ! {
	if let Err(e) = setup_stage(&stage, pipes) {
		child_report_error(&e);
		child_exit(e.exit_code());
	}
	let program = match stage.argv.first() {
		Some(program) => program,
		None => {
			child_report_error(&ExecError::Sys("exec", Errno::EINVAL));
			child_exit(libc::EINVAL);
		},
	};
	if stage.count > 1 && program.to_str().map_or(false, builtin::is_builtin_name) {
		child_exit(0);
	}
	let e = match unistd::execvp(program, stage.argv) {
		Ok(never) => match never {},
		Err(e) => e,
	};
	child_report(b"`");
	child_report(program.to_bytes());
	child_report(b"`: ");
	child_report(e.desc().as_bytes());
	child_report(b"\n");
	child_exit(e as i32)
}

fn spawn_commands(argvs: &[Vec<CString>], input_file: Option<&str>, output_file: Option<&str>, background: bool,
                  job_builder: &mut job::JobBuilder) -> Result<(), ExecError> {
	let count = argvs.len();
	let mut pipes = open_pipes(count - 1)?;
	for (i, argv) in argvs.iter().enumerate() {
		// Buffered output would otherwise be duplicated into the child.
		let _ = io::stdout().flush();
		match unsafe { job_builder.push_fork() }.during("fork")? {
			ForkResult::Parent { child } => {
				debug!("spawned stage {} as {}", i, child);
			},
			ForkResult::Child => {
				let stage = Stage {
					index: i,
					count: count,
					argv: argv,
					input_file: input_file,
					output_file: output_file,
					background: background,
				};
				exec_stage(stage, mem::take(&mut pipes));
			},
		}
	}
	// The parent needs none of the pipe ends.
	drop(pipes);
	Ok(())
}

/// Human readable name of a signal, as `strsignal(3)` reports it.
pub fn signal_description(signal: Signal) -> String {
	let ptr = unsafe { libc::strsignal(signal as libc::c_int) };
	if ptr.is_null() {
		return signal.as_str().to_string();
	}
	unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Blocks until every pid has terminated, in order.
///
/// Signal deaths are reported; normal exits are not. Returns the status of
/// the last pid that could be observed, shell style (`128 + signal` for a
/// signal death).
pub fn wait_foreground(pids: &[Pid]) -> Option<i32> {
	let mut last = None;
	for &pid in pids {
		match syscall(|| wait::waitpid(pid, None)) {
			Ok(WaitStatus::Exited(_, code)) => last = Some(code),
			Ok(WaitStatus::Signaled(_, signal, _)) => {
				eprintln!("{}", signal_description(signal));
				last = Some(128 + signal as i32);
			},
			Ok(status) => debug!("{}: unexpected wait status {:?}", pid, status),
			Err(e) => eprintln!("waitpid: {}", e.desc()),
		}
	}
	last
}

/// What [`execute`] did.
#[derive(Debug, Default)]
pub struct Execution {
	/// Every process that was spawned, in stage order.
	pub job: job::Job,
	/// Exit status of the last stage, for a foreground pipeline.
	pub status: Option<i32>,
	pub error: Option<ExecError>,
}

/// Spawns one process per command, connected by pipes.
///
/// A setup failure stops spawning further stages but leaves the ones already
/// running alone; it is reported and returned in [`Execution::error`]. In the
/// foreground all spawned stages are waited for. In the background the pids
/// are returned right away for the caller to track.
pub fn execute(commands: &[Command], input_file: Option<&str>, output_file: Option<&str>, background: bool) -> Execution {
	if commands.is_empty() {
		return Execution::default();
	}
	let argvs: Result<Vec<Vec<CString>>, ffi::NulError> = commands.iter()
		.map(|c| c.parts.iter().map(|p| CString::new(p.as_bytes())).collect::<Result<Vec<_>, _>>())
		.collect();
	let argvs = match argvs {
		Ok(argvs) => argvs,
		Err(e) => {
			let e = ExecError::from(e);
			eprintln!("{}", e);
			return Execution { error: Some(e), ..Execution::default() };
		},
	};

	let mut job_builder = job::JobBuilder::new(commands.len());
	let error = spawn_commands(&argvs, input_file, output_file, background, &mut job_builder).err();
	finish(job_builder.build(), error, background)
}

// Whatever was spawned is waited for or announced, even after a failure.
fn finish(job: job::Job, error: Option<ExecError>, background: bool) -> Execution {
	if let Some(ref e) = error {
		eprintln!("{}", e);
	}
	let mut status = None;
	if background {
		if let Some(pid) = job.last() {
			println!("[bg] {}", pid);
		}
	} else {
		status = wait_foreground(&job.pids);
	}
	Execution { job: job, status: status, error: error }
}

pub enum EvalResult {
	Done(i32),
	Exit,
}

/// Runs one parsed line: builtins in-process, everything else as a pipeline.
pub fn eval(state: &mut global::State, expression: &Expression) -> EvalResult {
	if expression.is_empty() {
		return EvalResult::Done(state.last_status);
	}
	let status = match builtin::dispatch(state, expression) {
		Some(builtin::Outcome::Exit) => return EvalResult::Exit,
		Some(builtin::Outcome::Status(s)) => s,
		None => {
			let execution = execute(&expression.commands, expression.input_file.as_deref(),
			                        expression.output_file.as_deref(), expression.background);
			let status = match execution.error {
				Some(ref e) if execution.status.is_none() => e.exit_code(),
				_ => execution.status.unwrap_or(0),
			};
			if expression.background {
				state.job_set.push(execution.job);
			}
			status
		},
	};
	state.last_status = status;
	EvalResult::Done(status)
}

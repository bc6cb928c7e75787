use log::debug;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State { Active, Stopped, Terminated }

trait WaitStatusExt {
	fn state(self) -> State;
}

impl WaitStatusExt for WaitStatus {
	fn state(self) -> State {
		match self {
			WaitStatus::Exited(..) => State::Terminated,
			WaitStatus::Signaled(..) => State::Terminated,
			WaitStatus::Stopped(..) => State::Stopped,
			#[cfg(any(target_os = "linux", target_os = "android"))]
			WaitStatus::PtraceEvent(..) => State::Stopped,
			#[cfg(any(target_os = "linux", target_os = "android"))]
			WaitStatus::PtraceSyscall(..) => State::Stopped,
			WaitStatus::Continued(..) => State::Active,
			WaitStatus::StillAlive => State::Active,
		}
	}
}

/// Process ids spawned for one pipeline, in spawn order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Job {
	pub pids: Vec<Pid>,
}

impl Job {
	pub fn last(&self) -> Option<Pid> {
		self.pids.last().copied()
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { pids: Vec::with_capacity(size_hint) }
		}
	}

	/// Forks and records the child's pid on the parent side.
	///
	/// # Safety
	///
	/// Same contract as [`unistd::fork`]: in a multi-threaded process the
	/// child may only perform async-signal-safe operations before exec.
	pub unsafe fn push_fork(&mut self) -> nix::Result<ForkResult> {
		let r = unistd::fork()?;
		if let ForkResult::Parent { child } = r {
			self.imp.pids.push(child);
		}
		Ok(r)
	}

	pub fn build(self) -> Job {
		self.imp
	}
}

/// Background jobs that have not been reaped yet.
#[derive(Debug, Default)]
pub struct JobTable {
	jobs: Vec<Job>,
}

impl JobTable {
	pub fn new() -> JobTable {
		JobTable { jobs: vec![] }
	}

	pub fn push(&mut self, job: Job) {
		if !job.pids.is_empty() {
			self.jobs.push(job);
		}
	}

	/// Number of outstanding process ids.
	pub fn len(&self) -> usize {
		self.jobs.iter().map(|job| job.pids.len()).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.jobs.is_empty()
	}

	pub fn pids(&self) -> impl Iterator<Item = Pid> + '_ {
		self.jobs.iter().flat_map(|job| job.pids.iter().copied())
	}

	/// Reaps every terminated process without blocking.
	///
	/// Returns the reaped pids in insertion order. A pid whose poll fails is
	/// dropped without being reported.
	pub fn poll(&mut self) -> Vec<Pid> {
		let mut done = vec![];
		for job in &mut self.jobs {
			job.pids.retain(|&pid| match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
				Ok(status) if status.state() == State::Terminated => {
					debug!("reaped {}: {:?}", pid, status);
					done.push(pid);
					false
				},
				Ok(_) => true,
				Err(e) => {
					debug!("dropping {}: waitpid: {}", pid, e);
					false
				},
			});
		}
		self.jobs.retain(|job| !job.pids.is_empty());
		done
	}
}

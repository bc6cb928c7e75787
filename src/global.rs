use crate::job;

pub struct State {
	pub job_set: job::JobTable,
	/// Status of the most recently evaluated line.
	pub last_status: i32,
}

impl State {
	pub fn new() -> State {
		let job_set = job::JobTable::new();
		State { job_set: job_set, last_status: 0 }
	}
}

impl Default for State {
	fn default() -> State {
		State::new()
	}
}

use argh::FromArgs;
use log::LevelFilter;

#[derive(FromArgs, Debug, PartialEq)]
/// Interactive shell with pipelines, file redirection and background jobs.
pub struct Args {
	#[argh(switch, short = 'q')]
	/// never display the prompt
	pub quiet: bool,

	#[argh(switch, short = 'v')]
	/// log debug information to stderr
	pub verbose: bool,
}

impl Args {
	pub fn log_level(&self) -> LevelFilter {
		if self.verbose { LevelFilter::Debug } else { LevelFilter::Warn }
	}

	/// The prompt is shown for terminal input unless `--quiet` is given.
	pub fn show_prompt(&self, interactive: bool) -> bool {
		interactive && !self.quiet
	}
}

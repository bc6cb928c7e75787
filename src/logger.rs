use std::io::Write;

use log::{LevelFilter, Log, SetLoggerError};

/// Writes every enabled record as one prefixed line.
pub struct SimpleLogger<W: Send + Sync>
where
	for<'a> &'a W: Write,
{
	target: W,
	prefix: &'static str,
	level: LevelFilter,
}

impl<W: Send + Sync> Log for SimpleLogger<W>
where
	for<'a> &'a W: Write,
{
	fn enabled(&self, metadata: &log::Metadata) -> bool {
		metadata.level() <= self.level
	}

	fn log(&self, record: &log::Record) {
		if self.enabled(record.metadata()) {
			let _ = writeln!(&self.target, "{}{}", self.prefix, record.args());
		}
	}

	fn flush(&self) {
		let _ = (&self.target).flush();
	}
}

impl SimpleLogger<std::io::Stderr> {
	pub fn to_stderr(prefix: &'static str, level: LevelFilter) -> SimpleLogger<std::io::Stderr> {
		SimpleLogger {
			target: std::io::stderr(),
			prefix: prefix,
			level: level,
		}
	}
}

/// Installs the stderr logger as the global `log` backend.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
	log::set_boxed_logger(Box::new(SimpleLogger::to_stderr("ish: ", level)))?;
	log::set_max_level(level);
	Ok(())
}

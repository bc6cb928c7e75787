//! `ish`, a small interactive shell.
//!
//! A line is parsed into an [`types::Expression`]: a pipeline of commands
//! with optional `< file`, `> file` and a trailing `&`. `cd` and `exit` run
//! inside the shell; everything else is forked and exec'd, one process per
//! stage, connected by pipes. Background pipelines are polled once per
//! prompt and reported with `[done] <pid>`.

pub mod builtin;
pub mod config;
pub mod eval;
pub mod global;
pub mod input;
pub mod job;
pub mod logger;
pub mod parser;
pub mod repl;
pub mod tokenizer;
pub mod types;

//! Terminal collaborator used for prompts and the busy indicator.
//!
//! The flow only needs four operations: read a line, read a secret, and start/stop a busy
//! indicator. [`ScriptedTerminal`] answers from queues so flows run headless; the
//! `cli` feature adds a console implementation.

#[cfg(feature = "cli")] mod console;
#[cfg(feature = "cli")] pub use console::*;

// std
use std::collections::VecDeque;
// self
use crate::{_prelude::*, auth::Secret};

/// Interactive input capability.
pub trait Terminal: Send + Sync {
	/// Shows `prompt` and returns the line the user typed, without the trailing newline.
	fn read_line(&self, prompt: &str) -> Result<String, TerminalError>;

	/// Shows `prompt` and reads a line without echoing it.
	fn read_secret(&self, prompt: &str) -> Result<Secret, TerminalError>;

	/// Starts the busy indicator.
	fn start_busy(&self);

	/// Stops the busy indicator.
	fn stop_busy(&self);
}

/// Failures raised while reading interactive input.
#[derive(Debug, ThisError)]
pub enum TerminalError {
	/// No more input is available.
	#[error("No input is available for prompt `{prompt}`.")]
	Closed {
		/// Prompt that could not be answered.
		prompt: String,
	},
	/// The terminal could not be read.
	#[error("Terminal I/O failed.")]
	Io(#[from] std::io::Error),
}

/// Keeps the busy indicator running until dropped.
pub struct BusyGuard<'a> {
	terminal: &'a dyn Terminal,
}
impl Drop for BusyGuard<'_> {
	fn drop(&mut self) {
		self.terminal.stop_busy();
	}
}
impl Debug for BusyGuard<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("BusyGuard(..)")
	}
}

/// Starts the busy indicator on `terminal` and stops it when the guard drops.
pub fn busy(terminal: &dyn Terminal) -> BusyGuard<'_> {
	terminal.start_busy();

	BusyGuard { terminal }
}

/// Terminal that answers prompts from pre-recorded queues.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
	lines: Mutex<VecDeque<String>>,
	secrets: Mutex<VecDeque<String>>,
	prompts: Mutex<Vec<String>>,
	busy_active: Mutex<bool>,
	busy_starts: Mutex<usize>,
}
impl ScriptedTerminal {
	/// Queues answers for [`Terminal::read_line`].
	pub fn with_lines<I, S>(self, lines: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.lines.lock().extend(lines.into_iter().map(Into::into));

		self
	}

	/// Queues answers for [`Terminal::read_secret`].
	pub fn with_secrets<I, S>(self, secrets: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.secrets.lock().extend(secrets.into_iter().map(Into::into));

		self
	}

	/// Every prompt shown so far, line and secret prompts interleaved.
	pub fn prompts(&self) -> Vec<String> {
		self.prompts.lock().clone()
	}

	/// Number of times the busy indicator was started.
	pub fn busy_starts(&self) -> usize {
		*self.busy_starts.lock()
	}

	/// Returns `true` while the busy indicator is running.
	pub fn is_busy(&self) -> bool {
		*self.busy_active.lock()
	}

	/// Number of queued line answers not consumed yet.
	pub fn pending_lines(&self) -> usize {
		self.lines.lock().len()
	}
}
impl Terminal for ScriptedTerminal {
	fn read_line(&self, prompt: &str) -> Result<String, TerminalError> {
		self.prompts.lock().push(prompt.to_owned());
		self.lines.lock().pop_front().ok_or_else(|| TerminalError::Closed { prompt: prompt.into() })
	}

	fn read_secret(&self, prompt: &str) -> Result<Secret, TerminalError> {
		self.prompts.lock().push(prompt.to_owned());
		self.secrets
			.lock()
			.pop_front()
			.map(Secret::from)
			.ok_or_else(|| TerminalError::Closed { prompt: prompt.into() })
	}

	fn start_busy(&self) {
		*self.busy_active.lock() = true;
		*self.busy_starts.lock() += 1;
	}

	fn stop_busy(&self) {
		*self.busy_active.lock() = false;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scripted_terminal_replays_queues_in_order() {
		let terminal = ScriptedTerminal::default().with_lines(["alice", "2"]).with_secrets(["pw"]);

		assert_eq!(terminal.read_line("Username").expect("First line should exist."), "alice");
		assert_eq!(terminal.read_secret("Password").expect("Secret should exist.").expose(), "pw");
		assert_eq!(terminal.read_line("Device").expect("Second line should exist."), "2");
		assert!(matches!(terminal.read_line("OTP"), Err(TerminalError::Closed { .. })));
		assert_eq!(terminal.prompts(), vec!["Username", "Password", "Device", "OTP"]);
	}

	#[test]
	fn busy_guard_stops_indicator_on_drop() {
		let terminal = ScriptedTerminal::default();

		{
			let _guard = busy(&terminal);

			assert!(terminal.is_busy());
		}

		assert!(!terminal.is_busy());
		assert_eq!(terminal.busy_starts(), 1);
	}
}

// crates.io
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
// self
use crate::{
	_prelude::*,
	auth::Secret,
	terminal::{Terminal, TerminalError},
};

/// Interactive terminal backed by `dialoguer` prompts and an `indicatif` spinner.
#[derive(Debug, Default)]
pub struct ConsoleTerminal {
	spinner: Mutex<Option<ProgressBar>>,
}
impl ConsoleTerminal {
	fn spinner() -> ProgressBar {
		let bar = ProgressBar::new_spinner();

		if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
			bar.set_style(style);
		}

		bar.enable_steady_tick(std::time::Duration::from_millis(100));

		bar
	}
}
impl Terminal for ConsoleTerminal {
	fn read_line(&self, prompt: &str) -> Result<String, TerminalError> {
		Input::<String>::new()
			.with_prompt(prompt)
			.allow_empty(true)
			.interact_text()
			.map(|line| line.trim().to_owned())
			.map_err(|e| TerminalError::Io(std::io::Error::other(e)))
	}

	fn read_secret(&self, prompt: &str) -> Result<Secret, TerminalError> {
		Password::new()
			.with_prompt(prompt)
			.allow_empty_password(true)
			.interact()
			.map(Secret::from)
			.map_err(|e| TerminalError::Io(std::io::Error::other(e)))
	}

	fn start_busy(&self) {
		let mut spinner = self.spinner.lock();

		if spinner.is_none() {
			*spinner = Some(Self::spinner());
		}
	}

	fn stop_busy(&self) {
		if let Some(bar) = self.spinner.lock().take() {
			bar.finish_and_clear();
		}
	}
}

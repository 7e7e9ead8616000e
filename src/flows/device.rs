//! Interactive selection of the MFA device (and, for multi-role assertions, the role).

// self
use crate::{
	_prelude::*,
	idp::Device,
	terminal::{Terminal, TerminalError},
};

/// Picks the device that will answer the MFA challenge.
///
/// A single device is returned without prompting. With several, the user picks from a
/// 1-indexed menu until the answer is a number in range.
pub fn select_device(terminal: &dyn Terminal, devices: &[Device]) -> Result<Device> {
	match devices {
		[] => Err(Error::NoDevice),
		[device] => Ok(device.clone()),
		_ => {
			let labels: Vec<String> = devices.iter().map(Device::label).collect();
			let index = choose_index(terminal, "Choose an MFA device", &labels)?;

			Ok(devices[index].clone())
		},
	}
}

/// Shows `labels` as a numbered menu and returns the zero-based index the user picked.
///
/// Invalid answers re-prompt without limit; only a terminal failure ends the loop.
pub fn choose_index(
	terminal: &dyn Terminal,
	question: &str,
	labels: &[String],
) -> Result<usize, TerminalError> {
	let menu: Vec<String> =
		labels.iter().enumerate().map(|(i, label)| format!("{}. {label}", i + 1)).collect();
	let prompt = format!("{}\n{question} (1-{})", menu.join("\n"), labels.len());

	loop {
		let answer = terminal.read_line(&prompt)?;

		match parse_choice(&answer, labels.len()) {
			Some(index) => return Ok(index),
			None => tracing::warn!(
				input = %answer,
				"Invalid selection, enter a number between 1 and {}.",
				labels.len()
			),
		}
	}
}

fn parse_choice(answer: &str, len: usize) -> Option<usize> {
	answer.trim().parse::<usize>().ok()?.checked_sub(1).filter(|index| *index < len)
}

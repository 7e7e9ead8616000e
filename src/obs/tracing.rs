// crates.io
use tracing::instrument::Instrumented;
// self
use crate::{_prelude::*, obs::Stage};

/// A span wrapper used by every flow stage.
#[derive(Clone, Debug)]
pub struct StageSpan {
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: Stage) -> Self {
		Self { span: tracing::info_span!("onelogin_sts.flow", stage = stage.as_str()) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl From<u64> for SessionId {
	fn from(id: u64) -> Self {
		SessionId(id)
	}
}

impl Display for SessionId {
	fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
		write!(formatter, "SessionId({})", self.0)
	}
}

#[derive(Default)]
pub struct SessionIdSequence {
	next_id: AtomicU64,
}

impl SessionIdSequence {
	pub fn next(&self) -> SessionId {
		// Relaxed is enough, only the counter itself needs to be consistent.
		SessionId(self.next_id.fetch_add(1, Ordering::Relaxed))
	}
}

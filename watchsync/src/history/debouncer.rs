use std::mem;
use std::ops::Add;
use std::time::Duration;

/// Last-call-wins bookkeeping for a debounced action, independent of any timer primitive.
///
/// `Moment` is whatever clock the driver uses (`tokio::time::Instant` at runtime, plain [`Duration`]s in tests).
/// The driver asks for the [`Debouncer::deadline`], sleeps until then and collects the item via
/// [`Debouncer::take_due`].
#[derive(Debug)]
pub struct Debouncer<Item, Moment> {
	window: Duration,
	state: DebounceState<Item, Moment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DebounceState<Item, Moment> {
	Idle,
	Pending { item: Item, deadline: Moment },
	/// Accepts nothing anymore, see [`Debouncer::close`].
	Closed,
}

impl<Item, Moment> Debouncer<Item, Moment>
where
	Moment: Copy + Ord + Add<Duration, Output = Moment>,
{
	pub fn new(window: Duration) -> Self {
		Self {
			window,
			state: DebounceState::Idle,
		}
	}

	/// Replaces whatever is pending and restarts the quiescence window at `now`.
	/// Returns `true` if a pending item was superseded. Items submitted after [`Debouncer::close`] are dropped.
	pub fn submit(&mut self, item: Item, now: Moment) -> bool {
		if self.is_closed() {
			return false;
		}

		let previous = mem::replace(
			&mut self.state,
			DebounceState::Pending {
				item,
				deadline: now + self.window,
			},
		);
		matches!(previous, DebounceState::Pending { .. })
	}

	pub fn deadline(&self) -> Option<Moment> {
		match &self.state {
			DebounceState::Idle | DebounceState::Closed => None,
			DebounceState::Pending { deadline, .. } => Some(*deadline),
		}
	}

	/// Takes the pending item if its window has elapsed, going back to idle.
	pub fn take_due(&mut self, now: Moment) -> Option<Item> {
		match &self.state {
			DebounceState::Pending { deadline, .. } if now >= *deadline => self.cancel(),
			_ => None,
		}
	}

	/// Drops the pending item without it ever becoming due.
	pub fn cancel(&mut self) -> Option<Item> {
		match &self.state {
			DebounceState::Pending { .. } => self.replace_pending(DebounceState::Idle),
			DebounceState::Idle | DebounceState::Closed => None,
		}
	}

	/// Drops the pending item and refuses every later submission.
	pub fn close(&mut self) -> Option<Item> {
		self.replace_pending(DebounceState::Closed)
	}

	pub fn is_closed(&self) -> bool {
		matches!(self.state, DebounceState::Closed)
	}

	fn replace_pending(&mut self, state: DebounceState<Item, Moment>) -> Option<Item> {
		match mem::replace(&mut self.state, state) {
			DebounceState::Pending { item, .. } => Some(item),
			DebounceState::Idle | DebounceState::Closed => None,
		}
	}

	pub fn is_pending(&self) -> bool {
		matches!(self.state, DebounceState::Pending { .. })
	}
}

#[cfg(test)]
mod test {
	use super::*;

	const WINDOW: Duration = Duration::from_millis(1000);

	fn millis(milliseconds: u64) -> Duration {
		Duration::from_millis(milliseconds)
	}

	#[test]
	fn should_start_idle() {
		let debouncer = Debouncer::<f64, Duration>::new(WINDOW);

		assert!(!debouncer.is_pending());
		assert_eq!(debouncer.deadline(), None);
	}

	#[test]
	fn should_not_be_due_before_the_window_elapsed() {
		let mut debouncer = Debouncer::new(WINDOW);
		debouncer.submit(0.5, millis(500));

		assert_eq!(debouncer.take_due(millis(1499)), None);
		assert!(debouncer.is_pending());
	}

	#[test]
	fn should_be_due_exactly_when_the_window_elapsed() {
		let mut debouncer = Debouncer::new(WINDOW);
		debouncer.submit(0.5, millis(500));

		assert_eq!(debouncer.take_due(millis(1500)), Some(0.5));
		assert!(!debouncer.is_pending());
	}

	#[test]
	fn a_burst_should_collapse_into_the_last_item() {
		let mut debouncer = Debouncer::new(WINDOW);

		assert!(!debouncer.submit(0.5, millis(500)));
		assert!(debouncer.submit(1.0, millis(1000)));
		assert!(debouncer.submit(1.5, millis(1500)));

		assert_eq!(debouncer.deadline(), Some(millis(2500)));
		assert_eq!(debouncer.take_due(millis(2000)), None);
		assert_eq!(debouncer.take_due(millis(2500)), Some(1.5));
		assert_eq!(debouncer.take_due(millis(5000)), None, "Fired more than once per quiescent period");
	}

	#[test]
	fn should_fire_again_after_a_new_submission() {
		let mut debouncer = Debouncer::new(WINDOW);
		debouncer.submit(1.0, millis(0));
		assert_eq!(debouncer.take_due(millis(1000)), Some(1.0));

		debouncer.submit(2.0, millis(3000));

		assert_eq!(debouncer.take_due(millis(4000)), Some(2.0));
	}

	#[test]
	fn cancel_should_drop_the_pending_item() {
		let mut debouncer = Debouncer::new(WINDOW);
		debouncer.submit(42.0, millis(0));

		assert_eq!(debouncer.cancel(), Some(42.0));
		assert_eq!(debouncer.take_due(millis(10_000)), None);
		assert_eq!(debouncer.cancel(), None);
	}

	#[test]
	fn close_should_drop_the_pending_item_and_refuse_later_submissions() {
		let mut debouncer = Debouncer::new(WINDOW);
		debouncer.submit(1.0, millis(0));

		assert_eq!(debouncer.close(), Some(1.0));
		assert!(!debouncer.submit(1.5, millis(100)));

		assert!(debouncer.is_closed());
		assert!(!debouncer.is_pending());
		assert_eq!(debouncer.deadline(), None);
		assert_eq!(debouncer.take_due(millis(10_000)), None);
		assert_eq!(debouncer.cancel(), None);
		assert!(debouncer.is_closed(), "Cancelling reopened a closed debouncer");
	}
}

use tokio::task::JoinHandle;

/// Owned handle to a spawned timer or event loop. Dropping it cancels the task, so a task can never outlive
/// whoever holds the handle.
#[derive(Debug)]
pub struct AbortingJoinHandle<T>(JoinHandle<T>);

impl<T> From<JoinHandle<T>> for AbortingJoinHandle<T> {
	fn from(join_handle: JoinHandle<T>) -> Self {
		Self(join_handle)
	}
}

impl<T> Drop for AbortingJoinHandle<T> {
	fn drop(&mut self) {
		self.0.abort();
	}
}

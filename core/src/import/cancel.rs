use std::sync::Arc;
use tokio::sync::watch;

/// Cancels an in-progress import. Clones share the same state.
#[derive(Clone)]
pub struct CancelToken {
	sender: Arc<watch::Sender<bool>>,
	receiver: watch::Receiver<bool>,
}

impl Default for CancelToken {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for CancelToken {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "CancelToken(cancelled={})", self.is_cancelled())
	}
}

impl CancelToken {
	pub fn new() -> Self {
		let (sender, receiver) = watch::channel(false);
		Self {
			sender: Arc::new(sender),
			receiver,
		}
	}

	pub fn cancel(&self) {
		self.sender.send_replace(true);
	}

	pub fn is_cancelled(&self) -> bool {
		*self.receiver.borrow()
	}

	/// Resolves once the token is cancelled.
	pub async fn cancelled(&self) {
		let mut receiver = self.receiver.clone();
		while !*receiver.borrow() {
			if receiver.changed().await.is_err() {
				// cannot happen while this token holds the sender
				futures::future::pending::<()>().await;
			}
		}
	}
}

#[cfg(test)]
mod cancel {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn clones_share_state() {
		let token = CancelToken::new();
		let clone = token.clone();
		assert!(!clone.is_cancelled());
		token.cancel();
		assert!(clone.is_cancelled());
		tokio::time::timeout(Duration::from_secs(1), clone.cancelled())
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn wakes_waiters() {
		let token = CancelToken::new();
		let waiter = {
			let token = token.clone();
			tokio::spawn(async move { token.cancelled().await })
		};
		tokio::task::yield_now().await;
		token.cancel();
		tokio::time::timeout(Duration::from_secs(1), waiter)
			.await
			.unwrap()
			.unwrap();
	}
}

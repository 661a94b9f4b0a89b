use super::{Error, ImportBundle, Materialized, Materializer, SceneHost};
use crate::import::CancelToken;
use tokio::sync::{mpsc, oneshot};

/// Creates the link between import tasks and the context which owns the scene.
/// Imports submit through the [`SceneSender`]; the host drains the [`SceneReceiver`] on its own context.
pub fn scene_channel(capacity: usize) -> (SceneSender, SceneReceiver) {
	let (sender, receiver) = mpsc::channel(capacity.max(1));
	(SceneSender { sender }, SceneReceiver { receiver })
}

/// A finished import waiting for the scene context.
pub struct SceneRequest {
	bundle: ImportBundle,
	cancel: CancelToken,
	reply: oneshot::Sender<Result<Materialized, Error>>,
}

impl SceneRequest {
	pub fn bundle(&self) -> &ImportBundle {
		&self.bundle
	}

	/// Inserts the bundle, unless its import was cancelled while the request was queued.
	pub fn apply(self, host: &mut dyn SceneHost) {
		let result = match self.cancel.is_cancelled() {
			true => {
				log::info!(target: "materialize", "Dropping cancelled import of {}", self.bundle.display_name);
				Err(Error::Cancelled)
			}
			false => Materializer::materialize(host, self.bundle),
		};
		// the import may have stopped waiting, the scene is already consistent either way
		let _ = self.reply.send(result);
	}
}

#[derive(Clone)]
pub struct SceneSender {
	sender: mpsc::Sender<SceneRequest>,
}

impl SceneSender {
	/// Queues a bundle for the scene context and waits until it has been inserted (or refused).
	pub async fn submit(&self, bundle: ImportBundle, cancel: &CancelToken) -> Result<Materialized, Error> {
		if cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}
		let (reply, response) = oneshot::channel();
		let request = SceneRequest {
			bundle,
			cancel: cancel.clone(),
			reply,
		};
		self.sender.send(request).await.map_err(|_| Error::Closed)?;
		response.await.map_err(|_| Error::Closed)?
	}
}

pub struct SceneReceiver {
	receiver: mpsc::Receiver<SceneRequest>,
}

impl SceneReceiver {
	/// Waits for the next request; `None` once every sender is gone.
	pub async fn recv(&mut self) -> Option<SceneRequest> {
		self.receiver.recv().await
	}

	/// Applies every request already queued, without waiting. Returns how many were handled.
	pub fn process_pending(&mut self, host: &mut dyn SceneHost) -> usize {
		let mut handled = 0;
		while let Ok(request) = self.receiver.try_recv() {
			request.apply(host);
			handled += 1;
		}
		handled
	}
}

use crate::{
	format::GeometryFormat,
	http::{self, ArcTransport, TransportError},
	manifest::GeometryRef,
};

mod retry;
pub use retry::*;

/// Downloaded container bytes, handed straight to the assembler and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
	pub locator: String,
	pub bytes: Vec<u8>,
}

impl RawPayload {
	/// The format announced by the payload's own magic bytes.
	pub fn format(&self) -> Option<GeometryFormat> {
		GeometryFormat::sniff(&self.bytes)
	}
}

pub struct GeometryFetcher {
	transport: ArcTransport,
	policy: RetryPolicy,
}

impl GeometryFetcher {
	pub fn new(transport: ArcTransport, policy: RetryPolicy) -> Self {
		Self { transport, policy }
	}

	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	/// Downloads one geometry container.
	/// Transient failures are retried with backoff; a not-found answer is final immediately.
	pub async fn fetch(&self, geometry: &GeometryRef) -> Result<RawPayload, Error> {
		let locator = geometry.locator.clone();
		let mut attempt = 0;
		loop {
			attempt += 1;
			log::debug!(target: "fetch", "Downloading {locator} (attempt {attempt})");
			let failure = match http::get(&self.transport, locator.clone(), Vec::new()).await {
				Ok(response) if response.is_success() => {
					log::info!(target: "fetch", "Downloaded {} bytes from {locator}", response.body.len());
					return Ok(RawPayload {
						locator,
						bytes: response.body,
					});
				}
				Ok(response) if response.is_not_found() => return Err(Error::NotFound(locator)),
				Ok(response) if response.is_server_error() => {
					Failure::Transient(format!("server answered status {}", response.status))
				}
				Ok(response) => Failure::Final(format!("server answered status {}", response.status)),
				Err(err) if err.is_transient() => Failure::Transient(err.to_string()),
				Err(TransportError::Other(reason)) => Failure::Final(reason),
				Err(err) => Failure::Final(err.to_string()),
			};

			let reason = match failure {
				Failure::Final(reason) => {
					return Err(Error::Download {
						locator,
						attempts: attempt,
						reason,
					})
				}
				Failure::Transient(reason) => reason,
			};
			if attempt >= self.policy.max_attempts() {
				log::warn!(target: "fetch", "Giving up on {locator} after {attempt} attempts: {reason}");
				return Err(Error::Download {
					locator,
					attempts: attempt,
					reason,
				});
			}
			let delay = self.policy.backoff_with_jitter(attempt);
			log::warn!(target: "fetch", "Download of {locator} failed ({reason}), retrying in {delay:?}");
			tokio::time::sleep(delay).await;
		}
	}
}

enum Failure {
	Transient(String),
	Final(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("geometry {0} does not exist")]
	NotFound(String),
	#[error("failed to download {locator} after {attempts} attempt(s): {reason}")]
	Download {
		locator: String,
		attempts: u32,
		reason: String,
	},
}

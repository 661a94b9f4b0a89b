//! Request plumbing shared by every component that talks to the catalog.
//!
//! Components never touch the HTTP client directly. They go through [`Transport`],
//! so tests can script responses and the blocking client can be pushed off the async runtime.

use serde::de::DeserializeOwned;
use std::sync::Arc;

mod ureq_transport;
pub use ureq_transport::*;

#[cfg(test)]
pub(crate) mod testing;

pub type ArcTransport = Arc<dyn Transport>;
pub type Query = Vec<(String, String)>;

/// A completed HTTP exchange, regardless of status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	pub status: u16,
	pub body: Vec<u8>,
}

impl Response {
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self {
			status,
			body: body.into(),
		}
	}

	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// The resource definitively does not exist; asking again will not change that.
	pub fn is_not_found(&self) -> bool {
		self.status == 404 || self.status == 410
	}

	pub fn is_server_error(&self) -> bool {
		self.status >= 500
	}

	pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
		serde_json::from_slice(&self.body)
	}

	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
	#[error("request timed out")]
	Timeout,
	#[error("connection was reset")]
	ConnectionReset,
	#[error("{0}")]
	Other(String),
}

impl TransportError {
	/// Failures worth another attempt.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Timeout | Self::ConnectionReset)
	}
}

/// Blocking request capability. Implementations must be shareable across tasks.
pub trait Transport: Send + Sync {
	fn get(&self, url: &str, query: &[(String, String)]) -> Result<Response, TransportError>;
	fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response, TransportError>;
}

/// Runs a GET on the blocking pool so the runtime's workers never stall on socket reads.
/// Dropping the returned future stops waiting for the response, but the blocking call itself
/// keeps running until it completes or hits the transport's timeout. Its result is then discarded.
pub async fn get(
	transport: &ArcTransport,
	url: String,
	query: Query,
) -> Result<Response, TransportError> {
	let transport = transport.clone();
	tokio::task::spawn_blocking(move || transport.get(&url, &query))
		.await
		.map_err(|err| TransportError::Other(format!("request task failed: {err}")))?
}

pub async fn post_json(
	transport: &ArcTransport,
	url: String,
	body: serde_json::Value,
) -> Result<Response, TransportError> {
	let transport = transport.clone();
	tokio::task::spawn_blocking(move || transport.post_json(&url, &body))
		.await
		.map_err(|err| TransportError::Other(format!("request task failed: {err}")))?
}

/// The catalog API's endpoint layout, all relative to one site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
	root: String,
}

impl Endpoints {
	pub fn new(root: impl Into<String>) -> Self {
		Self {
			root: root.into().trim_end_matches('/').to_owned(),
		}
	}

	pub fn root(&self) -> &str {
		&self.root
	}

	pub fn search(&self) -> String {
		self.resolve("/graphql")
	}

	pub fn item_record(&self) -> String {
		self.resolve("/ship-matrix/index")
	}

	/// Catalog responses mix absolute links with site-relative paths.
	pub fn resolve(&self, url: &str) -> String {
		if url.starts_with("https://") || url.starts_with("http://") {
			return url.to_owned();
		}
		format!("{}/{}", self.root, url.trim_start_matches('/'))
	}
}

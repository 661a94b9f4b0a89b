use super::{Response, Transport, TransportError};
use std::io::Read;
use std::time::Duration;

/// [`Transport`] backed by a blocking ureq agent.
pub struct UreqTransport {
	agent: ureq::Agent,
}

impl UreqTransport {
	pub fn new(user_agent: &str, timeout: Duration) -> Self {
		let agent = ureq::AgentBuilder::new()
			.user_agent(user_agent)
			.timeout(timeout)
			.build();
		Self { agent }
	}

	fn complete(result: Result<ureq::Response, ureq::Error>) -> Result<Response, TransportError> {
		match result {
			Ok(response) => Self::read(response),
			// Status codes are the caller's business, not a transport failure.
			Err(ureq::Error::Status(_code, response)) => Self::read(response),
			Err(ureq::Error::Transport(transport)) => Err(Self::classify(transport)),
		}
	}

	fn read(response: ureq::Response) -> Result<Response, TransportError> {
		let status = response.status();
		let mut body = Vec::new();
		response
			.into_reader()
			.read_to_end(&mut body)
			.map_err(|err| Self::classify_io(&err).unwrap_or(TransportError::Other(err.to_string())))?;
		Ok(Response { status, body })
	}

	fn classify(transport: ureq::Transport) -> TransportError {
		let io_error = std::error::Error::source(&transport)
			.and_then(|source| source.downcast_ref::<std::io::Error>());
		if let Some(classified) = io_error.and_then(Self::classify_io) {
			return classified;
		}
		match transport.kind() {
			ureq::ErrorKind::ConnectionFailed => TransportError::ConnectionReset,
			_ => TransportError::Other(transport.to_string()),
		}
	}

	fn classify_io(err: &std::io::Error) -> Option<TransportError> {
		use std::io::ErrorKind::*;
		match err.kind() {
			TimedOut | WouldBlock => Some(TransportError::Timeout),
			ConnectionReset | ConnectionAborted | BrokenPipe | UnexpectedEof => {
				Some(TransportError::ConnectionReset)
			}
			_ => None,
		}
	}
}

impl Transport for UreqTransport {
	fn get(&self, url: &str, query: &[(String, String)]) -> Result<Response, TransportError> {
		log::debug!(target: "http", "GET {url} {query:?}");
		let mut request = self.agent.get(url);
		for (name, value) in query.iter() {
			request = request.query(name, value);
		}
		Self::complete(request.call())
	}

	fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response, TransportError> {
		log::debug!(target: "http", "POST {url}");
		Self::complete(self.agent.post(url).send_json(body))
	}
}

use super::{Response, Transport, TransportError};
use std::{
	collections::{HashMap, VecDeque},
	sync::Mutex,
};

type Reply = Result<Response, TransportError>;

#[derive(Default)]
struct Route {
	/// Replies handed out in order; the last one repeats forever.
	replies: VecDeque<Reply>,
	calls: usize,
}

/// Transport which answers from canned replies keyed by url.
/// An `id` query parameter becomes part of the key (`url?id=..`), any other query is ignored.
#[derive(Default)]
pub struct ScriptedTransport {
	routes: Mutex<HashMap<String, Route>>,
	posted: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_reply(self, url: &str, reply: Reply) -> Self {
		self.routes
			.lock()
			.unwrap()
			.entry(url.to_owned())
			.or_default()
			.replies
			.push_back(reply);
		self
	}

	pub fn with_json(self, url: &str, json: serde_json::Value) -> Self {
		self.with_reply(url, Ok(Response::new(200, json.to_string())))
	}

	pub fn with_bytes(self, url: &str, bytes: &[u8]) -> Self {
		self.with_reply(url, Ok(Response::new(200, bytes.to_vec())))
	}

	pub fn calls(&self, url: &str) -> usize {
		self.routes
			.lock()
			.unwrap()
			.get(url)
			.map(|route| route.calls)
			.unwrap_or(0)
	}

	pub fn posted(&self) -> Vec<serde_json::Value> {
		self.posted.lock().unwrap().clone()
	}

	fn answer(&self, url: &str) -> Reply {
		let mut routes = self.routes.lock().unwrap();
		let route = match routes.get_mut(url) {
			Some(route) => route,
			None => return Ok(Response::new(404, format!("no route for {url}"))),
		};
		route.calls += 1;
		match route.replies.len() {
			0 => Ok(Response::new(404, "")),
			1 => route.replies[0].clone(),
			_ => route.replies.pop_front().unwrap(),
		}
	}
}

impl Transport for ScriptedTransport {
	fn get(&self, url: &str, query: &[(String, String)]) -> Reply {
		// Item records are keyed by id, so fold the id into the route key.
		match query.iter().find(|(name, _)| name == "id") {
			Some((_, id)) => self.answer(&format!("{url}?id={id}")),
			None => self.answer(url),
		}
	}

	fn post_json(&self, url: &str, body: &serde_json::Value) -> Reply {
		self.posted.lock().unwrap().push(body.clone());
		self.answer(url)
	}
}

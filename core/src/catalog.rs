use crate::http::{self, ArcTransport, Endpoints, TransportError};
use serde::{Deserialize, Serialize};

mod record;
pub use record::{Error as RecordError, *};

static SEARCH_QUERY: &str = "query GetShipList($query: SearchQuery!) {\n  store(name: \"pledge\", browse: true) {\n    search(query: $query) {\n      resources {\n        ...RSIShipFragment\n        __typename\n      }\n      __typename\n    }\n    __typename\n  }\n}\n\nfragment RSIShipFragment on RSIShip {\n  id\n}";

/// Summary of one catalog entry, enough to present it for selection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
	pub id: String,
	pub display_name: String,
	pub thumbnail_ref: Option<String>,
	pub page_url: Option<String>,
}

impl From<ItemRecord> for CatalogItem {
	fn from(record: ItemRecord) -> Self {
		let thumbnail_ref = record.thumbnail().map(|s| s.to_owned());
		Self {
			id: record.id,
			display_name: record.name,
			thumbnail_ref,
			page_url: record.url,
		}
	}
}

pub struct CatalogClient {
	transport: ArcTransport,
	endpoints: Endpoints,
	limit: usize,
}

impl CatalogClient {
	pub fn new(transport: ArcTransport, endpoints: Endpoints) -> Self {
		Self {
			transport,
			endpoints,
			limit: 20,
		}
	}

	pub fn with_limit(mut self, limit: usize) -> Self {
		self.limit = limit;
		self
	}

	/// Searches the catalog, keeping the catalog's own relevance order.
	/// Every hit's record is then requested concurrently to fill in its name and thumbnail.
	pub async fn search(&self, term: &str) -> Result<Vec<CatalogItem>, Error> {
		log::info!(target: "catalog", "Searching for \"{term}\"");
		let ids = self.search_ids(term).await?;
		log::debug!(target: "catalog", "Found {} results for \"{term}\"", ids.len());

		let records = ids
			.iter()
			.map(|id| ItemRecord::fetch(&self.transport, &self.endpoints, id));
		let items = futures::future::try_join_all(records)
			.await
			.map_err(|err| Error::Record(term.to_owned(), err))?
			.into_iter()
			.map(CatalogItem::from)
			.collect();
		Ok(items)
	}

	async fn search_ids(&self, term: &str) -> Result<Vec<String>, Error> {
		let body = Self::search_body(term, self.limit);
		let response = http::post_json(&self.transport, self.endpoints.search(), body)
			.await
			.map_err(|err| Error::Request(term.to_owned(), err))?;
		if !response.is_success() {
			return Err(Error::Status(term.to_owned(), response.status));
		}
		let json = response
			.json::<serde_json::Value>()
			.map_err(|err| Error::Parse(term.to_owned(), err.to_string()))?;
		Self::parse_ids(&json).ok_or_else(|| {
			Error::Parse(
				term.to_owned(),
				"response has no store.search.resources listing".to_owned(),
			)
		})
	}

	fn search_body(term: &str, limit: usize) -> serde_json::Value {
		serde_json::json!([{
			"operationName": "GetShipList",
			"variables": {
				"query": {
					"limit": limit,
					"ships": { "name": term },
				},
			},
			"query": SEARCH_QUERY,
		}])
	}

	fn parse_ids(json: &serde_json::Value) -> Option<Vec<String>> {
		let resources = json
			.get(0)?
			.pointer("/data/store/search/resources")?
			.as_array()?;
		resources
			.iter()
			.map(|resource| match resource.get("id")? {
				serde_json::Value::String(id) => Some(id.clone()),
				serde_json::Value::Number(id) => Some(id.to_string()),
				_ => None,
			})
			.collect()
	}
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
	#[error("failed to search for \"{0}\": {1}")]
	Request(String, TransportError),
	#[error("catalog answered status {1} when searching for \"{0}\"")]
	Status(String, u16),
	#[error("failed to read search results for \"{0}\": {1}")]
	Parse(String, String),
	#[error("failed to load a result of searching for \"{0}\": {1}")]
	Record(String, RecordError),
}

#[cfg(test)]
pub(crate) mod catalog {
	use super::*;
	use crate::http::{testing::ScriptedTransport, Response};
	use serde_json::json;
	use std::sync::Arc;

	pub fn search_reply(ids: &[u64]) -> serde_json::Value {
		let resources = ids
			.iter()
			.map(|id| json!({ "id": id, "__typename": "RSIShip" }))
			.collect::<Vec<_>>();
		json!([{ "data": { "store": { "search": { "resources": resources } } } }])
	}

	pub fn record_reply(id: u64, name: &str) -> serde_json::Value {
		json!({ "data": [{
			"id": id,
			"name": name,
			"url": format!("/pledge/ships/{id}"),
			"media": [{ "images": { "subscribers_vault_thumbnail": format!("/media/{id}.jpg") } }],
		}] })
	}

	#[tokio::test]
	async fn search_keeps_catalog_order() {
		let transport = Arc::new(
			ScriptedTransport::new()
				.with_json("https://catalog.test/graphql", search_reply(&[7, 3]))
				.with_json(
					"https://catalog.test/ship-matrix/index?id=7",
					record_reply(7, "Constellation Aquila"),
				)
				.with_json(
					"https://catalog.test/ship-matrix/index?id=3",
					record_reply(3, "Constellation Andromeda"),
				),
		);
		let client = CatalogClient::new(transport.clone(), Endpoints::new("https://catalog.test"))
			.with_limit(5);
		let items = client.search("Constellation").await.unwrap();
		assert_eq!(
			items.iter().map(|item| item.id.as_str()).collect::<Vec<_>>(),
			vec!["7", "3"]
		);
		assert_eq!(items[1].display_name, "Constellation Andromeda");
		assert_eq!(items[0].thumbnail_ref.as_deref(), Some("/media/7.jpg"));

		let posted = transport.posted();
		assert_eq!(posted.len(), 1);
		assert_eq!(posted[0][0]["variables"]["query"]["limit"], json!(5));
		assert_eq!(
			posted[0][0]["variables"]["query"]["ships"]["name"],
			json!("Constellation")
		);
	}

	#[tokio::test]
	async fn empty_results_are_not_an_error() {
		let transport = Arc::new(
			ScriptedTransport::new().with_json("https://catalog.test/graphql", search_reply(&[])),
		);
		let client = CatalogClient::new(transport, Endpoints::new("https://catalog.test"));
		assert_eq!(client.search("Nothing").await, Ok(vec![]));
	}

	#[tokio::test]
	async fn network_failure_is_a_search_error() {
		let transport = Arc::new(ScriptedTransport::new().with_reply(
			"https://catalog.test/graphql",
			Err(TransportError::Timeout),
		));
		let client = CatalogClient::new(transport, Endpoints::new("https://catalog.test"));
		assert_eq!(
			client.search("Constellation").await,
			Err(Error::Request(
				"Constellation".to_owned(),
				TransportError::Timeout
			))
		);
	}

	#[tokio::test]
	async fn malformed_response_is_a_search_error() {
		let transport = Arc::new(ScriptedTransport::new().with_reply(
			"https://catalog.test/graphql",
			Ok(Response::new(200, "<html>maintenance</html>")),
		));
		let client = CatalogClient::new(transport, Endpoints::new("https://catalog.test"));
		assert!(matches!(
			client.search("Constellation").await,
			Err(Error::Parse(..))
		));
	}
}

use crate::http::{self, ArcTransport, Endpoints, TransportError};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// One item's entry in the catalog's item index, as served by the catalog.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ItemRecord {
	#[serde(deserialize_with = "id_as_string")]
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub media: Vec<Media>,
	#[serde(default, deserialize_with = "lenient_f32")]
	pub beam: Option<f32>,
	#[serde(default, deserialize_with = "lenient_f32")]
	pub length: Option<f32>,
	#[serde(default, deserialize_with = "lenient_f32")]
	pub height: Option<f32>,
	#[serde(default)]
	pub manufacturer: Option<Manufacturer>,
	#[serde(default, rename = "type", deserialize_with = "lenient_text")]
	pub kind: Option<String>,
	#[serde(default, deserialize_with = "lenient_text")]
	pub focus: Option<String>,
	#[serde(default, deserialize_with = "lenient_text")]
	pub size: Option<String>,
	#[serde(default, deserialize_with = "lenient_text")]
	pub min_crew: Option<String>,
	#[serde(default, deserialize_with = "lenient_text")]
	pub max_crew: Option<String>,
	/// Explicit geometry listing. When absent, the model link is scraped from the item page.
	#[serde(default)]
	pub geometry: Option<Vec<GeometryEntry>>,
	#[serde(default)]
	pub materials: Vec<MaterialEntry>,
	#[serde(default)]
	pub submeshes: Vec<SubmeshEntry>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Manufacturer {
	#[serde(default)]
	pub name: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Media {
	#[serde(default)]
	pub images: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GeometryEntry {
	pub url: String,
	#[serde(default = "GeometryEntry::default_format")]
	pub format: String,
}

impl GeometryEntry {
	fn default_format() -> String {
		"ctm".to_owned()
	}
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MaterialEntry {
	pub name: String,
	#[serde(default)]
	pub texture: Option<String>,
}

/// Exactly one of `triangles` or `material` selects the submesh.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SubmeshEntry {
	pub name: String,
	/// Half-open `[start, end)` triangle index ranges.
	#[serde(default)]
	pub triangles: Option<Vec<[usize; 2]>>,
	#[serde(default)]
	pub material: Option<u32>,
}

#[derive(Deserialize)]
struct RecordPage {
	#[serde(default)]
	data: Vec<ItemRecord>,
}

impl ItemRecord {
	pub const THUMBNAIL_KEY: &str = "subscribers_vault_thumbnail";

	pub fn thumbnail(&self) -> Option<&str> {
		self.media
			.first()
			.and_then(|media| media.images.get(Self::THUMBNAIL_KEY))
			.and_then(|value| value.as_str())
	}

	/// Requests the record for `item_id` from the item index.
	pub async fn fetch(
		transport: &ArcTransport,
		endpoints: &Endpoints,
		item_id: &str,
	) -> Result<Self, Error> {
		log::debug!(target: "catalog", "Fetching record for #{item_id}");
		let response = http::get(
			transport,
			endpoints.item_record(),
			vec![("id".to_owned(), item_id.to_owned())],
		)
		.await
		.map_err(|err| Error::Request(item_id.to_owned(), err))?;
		if response.is_not_found() {
			return Err(Error::NotFound(item_id.to_owned()));
		}
		if !response.is_success() {
			return Err(Error::Status(item_id.to_owned(), response.status));
		}
		let page = response
			.json::<RecordPage>()
			.map_err(|err| Error::Parse(item_id.to_owned(), err.to_string()))?;
		page.data
			.into_iter()
			.next()
			.ok_or_else(|| Error::NotFound(item_id.to_owned()))
	}
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	use serde::de::Error;
	match serde_json::Value::deserialize(deserializer)? {
		serde_json::Value::String(id) => Ok(id),
		serde_json::Value::Number(id) => Ok(id.to_string()),
		other => Err(D::Error::custom(format!("item id {other} is not a string or number"))),
	}
}

/// Descriptive fields come as strings, numbers, or null.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	Ok(match serde_json::Value::deserialize(deserializer)? {
		serde_json::Value::String(value) => Some(value.trim().to_owned()),
		serde_json::Value::Number(value) => Some(value.to_string()),
		_ => None,
	}
	.filter(|value| !value.is_empty()))
}

/// Catalog measurements come as numbers, numeric strings, or nothing at all.
fn lenient_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
	Ok(match serde_json::Value::deserialize(deserializer)? {
		serde_json::Value::Number(value) => value.as_f64().map(|value| value as f32),
		serde_json::Value::String(value) => value.trim().parse::<f32>().ok(),
		_ => None,
	}
	.filter(|value| value.is_finite() && *value > 0.0))
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
	#[error("catalog has no item #{0}")]
	NotFound(String),
	#[error("failed to request item #{0}: {1}")]
	Request(String, TransportError),
	#[error("catalog answered status {1} for item #{0}")]
	Status(String, u16),
	#[error("item #{0} has an unreadable record: {1}")]
	Parse(String, String),
}

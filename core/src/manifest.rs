use crate::{
	catalog::{ItemRecord, RecordError},
	format::GeometryFormat,
	http::{self, ArcTransport, Endpoints, TransportError},
};
use regex::Regex;
use std::sync::OnceLock;

mod asset;
pub use asset::*;

mod validate;

/// Item pages embed their hologram model as `model_3d: '<url>'`.
static MODEL_PATTERN: &str = r"(?P<tag>model_3d:\s*)'(?P<model>[^']+)";

fn model_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| Regex::new(MODEL_PATTERN).expect("model pattern is a valid regex"))
}

pub struct ManifestResolver {
	transport: ArcTransport,
	endpoints: Endpoints,
}

impl ManifestResolver {
	pub fn new(transport: ArcTransport, endpoints: Endpoints) -> Self {
		Self {
			transport,
			endpoints,
		}
	}

	/// Resolves a catalog item to everything needed to download and rebuild its model.
	/// Nothing is cached, calling this twice asks the catalog twice.
	pub async fn resolve(&self, item_id: &str) -> Result<AssetManifest, Error> {
		log::info!(target: "manifest", "Resolving manifest for #{item_id}");
		let record = ItemRecord::fetch(&self.transport, &self.endpoints, item_id)
			.await
			.map_err(Error::from)?;

		let geometry = match record.geometry.clone() {
			Some(entries) => entries,
			None => vec![self.discover_model(&record).await?],
		};

		let manifest = validate::build(record, geometry, &self.endpoints)?;
		log::debug!(
			target: "manifest",
			"#{} has {} geometry refs, {} materials, {} submesh groups",
			manifest.item_id,
			manifest.geometry_refs.len(),
			manifest.material_refs.len(),
			manifest.submesh_groups.as_ref().map(|groups| groups.len()).unwrap_or(0),
		);
		Ok(manifest)
	}

	/// Finds the hologram model link on the item's catalog page.
	async fn discover_model(&self, record: &ItemRecord) -> Result<crate::catalog::GeometryEntry, Error> {
		let page_url = match record.url.as_ref() {
			Some(url) => self.endpoints.resolve(url),
			None => {
				return Err(Error::Malformed(
					record.id.clone(),
					"record has neither geometry nor a page to find it on".to_owned(),
				))
			}
		};
		log::debug!(target: "manifest", "Scraping {page_url} for a model link");
		let response = http::get(&self.transport, page_url.clone(), Vec::new())
			.await
			.map_err(|err| Error::Request(record.id.clone(), err))?;
		if response.is_not_found() {
			return Err(Error::NotFound(record.id.clone()));
		}
		if !response.is_success() {
			return Err(Error::Status(record.id.clone(), response.status));
		}
		let page = response.text();
		match Self::find_model(&page) {
			Some(url) => Ok(crate::catalog::GeometryEntry {
				url,
				format: GeometryFormat::Ctm.tag().to_owned(),
			}),
			None => Err(Error::NoModel(record.id.clone(), record.name.clone())),
		}
	}

	fn find_model(page: &str) -> Option<String> {
		model_pattern()
			.captures(page)
			.and_then(|captures| captures.name("model"))
			.map(|model| model.as_str().to_owned())
	}
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
	#[error("catalog has no item #{0}")]
	NotFound(String),
	#[error("model for \"{1}\" (#{0}) cannot be found")]
	NoModel(String, String),
	#[error("failed to request manifest for #{0}: {1}")]
	Request(String, TransportError),
	#[error("catalog answered status {1} for the manifest of #{0}")]
	Status(String, u16),
	#[error("manifest for #{0} is malformed: {1}")]
	Malformed(String, String),
}

impl From<RecordError> for Error {
	fn from(err: RecordError) -> Self {
		match err {
			RecordError::NotFound(id) => Self::NotFound(id),
			RecordError::Request(id, err) => Self::Request(id, err),
			RecordError::Status(id, status) => Self::Status(id, status),
			RecordError::Parse(id, reason) => Self::Malformed(id, reason),
		}
	}
}

#[cfg(test)]
mod manifest {
	use super::*;
	use crate::http::testing::ScriptedTransport;
	use serde_json::json;
	use std::sync::Arc;

	const RECORD: &str = "https://catalog.test/ship-matrix/index?id=45";

	fn resolver(transport: ScriptedTransport) -> ManifestResolver {
		ManifestResolver::new(Arc::new(transport), Endpoints::new("https://catalog.test"))
	}

	#[test]
	fn scrape_model_link() {
		let page = "var holo = { model_3d: '/media/holo/constellation.ctm', other: 1 };";
		assert_eq!(
			ManifestResolver::find_model(page),
			Some("/media/holo/constellation.ctm".to_owned())
		);
		assert_eq!(ManifestResolver::find_model("model_3d: null"), None);
	}

	#[tokio::test]
	async fn resolve_from_page() {
		let transport = ScriptedTransport::new()
			.with_json(
				RECORD,
				json!({ "data": [{
					"id": 45,
					"name": "Constellation Andromeda",
					"url": "/pledge/ships/andromeda",
					"beam": "26", "length": "61", "height": "14",
					"manufacturer": { "name": "Roberts Space Industries" },
					"focus": "Gunship",
					"min_crew": 3, "max_crew": 4,
				}] }),
			)
			.with_bytes(
				"https://catalog.test/pledge/ships/andromeda",
				b"<script>model_3d: 'https://cdn.test/andromeda.ctm'</script>",
			);
		let manifest = resolver(transport).resolve("45").await.unwrap();
		assert_eq!(manifest.item_id, "45");
		assert_eq!(manifest.display_name, "Constellation Andromeda");
		assert_eq!(
			manifest.geometry_refs,
			vec![GeometryRef {
				locator: "https://cdn.test/andromeda.ctm".to_owned(),
				format: GeometryFormat::Ctm,
			}]
		);
		assert_eq!(manifest.submesh_groups, None);
		assert_eq!(
			manifest.dimensions,
			Some(Dimensions {
				beam: 26.0,
				length: 61.0,
				height: 14.0
			})
		);
		assert_eq!(manifest.details.manufacturer.as_deref(), Some("Roberts Space Industries"));
		assert_eq!(manifest.details.focus.as_deref(), Some("Gunship"));
		assert_eq!(manifest.details.kind, None);
		assert_eq!(manifest.details.crew().as_deref(), Some("3 - 4"));
		assert_eq!(
			manifest.details.page_url.as_deref(),
			Some("https://catalog.test/pledge/ships/andromeda")
		);
	}

	#[tokio::test]
	async fn page_without_model() {
		let transport = ScriptedTransport::new()
			.with_json(
				RECORD,
				json!({ "data": [{ "id": 45, "name": "Andromeda", "url": "/andromeda" }] }),
			)
			.with_bytes("https://catalog.test/andromeda", b"<html></html>");
		assert_eq!(
			resolver(transport).resolve("45").await,
			Err(Error::NoModel("45".to_owned(), "Andromeda".to_owned()))
		);
	}

	#[tokio::test]
	async fn unknown_item() {
		let transport = ScriptedTransport::new().with_json(RECORD, json!({ "data": [] }));
		assert_eq!(
			resolver(transport).resolve("45").await,
			Err(Error::NotFound("45".to_owned()))
		);
	}

	#[tokio::test]
	async fn explicit_geometry_skips_the_page() {
		let transport = Arc::new(ScriptedTransport::new().with_json(
			RECORD,
			json!({ "data": [{
				"id": "45",
				"name": "Andromeda",
				"url": "/andromeda",
				"geometry": [{ "url": "/m/hull.ctm" }, { "url": "/m/turret.ctm", "format": "ctm" }],
				"materials": [{ "name": "hull", "texture": "/t/hull.png" }],
				"submeshes": [
					{ "name": "hull", "triangles": [[0, 10]] },
					{ "name": "glass", "material": 1 },
				],
			}] }),
		));
		let resolver =
			ManifestResolver::new(transport.clone(), Endpoints::new("https://catalog.test"));
		let manifest = resolver.resolve("45").await.unwrap();
		assert_eq!(manifest.geometry_refs.len(), 2);
		assert_eq!(manifest.geometry_refs[1].locator, "https://catalog.test/m/turret.ctm");
		assert_eq!(manifest.material_refs[0].texture_ref.as_deref(), Some("https://catalog.test/t/hull.png"));
		let groups = manifest.submesh_groups.unwrap();
		assert_eq!(groups[0].name, "hull");
		assert_eq!(groups[1].selection, Selection::Material(1));
		assert_eq!(transport.calls("https://catalog.test/andromeda"), 0);
	}
}

use crate::{
	assemble::MeshAssembler,
	decoder::Decoder,
	error::ImportError,
	fetch::GeometryFetcher,
	http::{ArcTransport, Endpoints},
	manifest::{AssetManifest, GeometryRef, ManifestResolver},
	mesh::AssembledMesh,
	partition::{loose_parts, partition},
	scene::{ImportBundle, Materialized, SceneSender, Transform},
	settings::Settings,
	uv::UvRemapper,
};
use std::sync::Arc;

mod cancel;
pub use cancel::*;

/// How imported meshes are split into scene objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOptions {
	pub separate_submeshes: bool,
	pub loose_part_fallback: bool,
}

impl From<&Settings> for ImportOptions {
	fn from(settings: &Settings) -> Self {
		Self {
			separate_submeshes: settings.separate_submeshes,
			loose_part_fallback: settings.loose_part_fallback,
		}
	}
}

/// Runs catalog items through the whole pipeline:
/// resolve, fetch and assemble every geometry ref, remap, optionally partition, then hand off to the scene.
pub struct Importer {
	resolver: ManifestResolver,
	fetcher: GeometryFetcher,
	assembler: MeshAssembler,
	remapper: UvRemapper,
	options: ImportOptions,
}

impl Importer {
	pub fn new(transport: ArcTransport, decoder: Arc<dyn Decoder>, settings: &Settings) -> Self {
		let endpoints = Endpoints::new(settings.api_root.clone());
		Self {
			resolver: ManifestResolver::new(transport.clone(), endpoints),
			fetcher: GeometryFetcher::new(transport, settings.retry),
			assembler: MeshAssembler::new(decoder).with_axis_conversion(settings.convert_axes),
			remapper: UvRemapper::new(settings.uv_transform),
			options: ImportOptions::from(settings),
		}
	}

	pub fn with_options(mut self, options: ImportOptions) -> Self {
		self.options = options;
		self
	}

	pub fn options(&self) -> &ImportOptions {
		&self.options
	}

	pub async fn resolve(&self, item_id: &str) -> Result<AssetManifest, ImportError> {
		Ok(self.resolver.resolve(item_id).await?)
	}

	/// Imports an item into the scene behind `scene`.
	/// Cancelling stops the import wherever it is; nothing reaches the scene after that.
	pub async fn import(
		&self,
		item_id: &str,
		scene: &SceneSender,
		cancel: &CancelToken,
	) -> Result<Materialized, ImportError> {
		let bundle = tokio::select! {
			biased;
			_ = cancel.cancelled() => {
				log::info!(target: "import", "Import of #{item_id} was cancelled");
				return Err(ImportError::Cancelled);
			}
			bundle = self.prepare(item_id) => bundle?,
		};
		log::debug!(target: "import", "Handing {} mesh(es) for #{item_id} to the scene", bundle.meshes.len());
		Ok(scene.submit(bundle, cancel).await?)
	}

	/// Everything up to, but excluding, scene insertion.
	pub async fn prepare(&self, item_id: &str) -> Result<ImportBundle, ImportError> {
		let manifest = self.resolve(item_id).await?;
		log::info!(
			target: "import",
			"Importing {} (#{}) from {} geometry ref(s)",
			manifest.display_name,
			manifest.item_id,
			manifest.geometry_refs.len()
		);

		// The first failure drops every other download and decode still in flight.
		let meshes = futures::future::try_join_all(
			manifest.geometry_refs.iter().map(|geometry| self.load(geometry)),
		)
		.await?;

		let mut mesh = AssembledMesh::merge(meshes);
		mesh.bind_materials(&manifest.material_refs);
		let mesh = self.remapper.remap(mesh);
		let transform = Transform::fit(mesh.bounds(), manifest.dimensions);

		let groups = match self.options.separate_submeshes {
			false => None,
			true => match (&manifest.submesh_groups, self.options.loose_part_fallback) {
				(Some(groups), _) => Some(groups.clone()),
				(None, true) => Some(loose_parts(&mesh)),
				(None, false) => {
					log::warn!(
						target: "import",
						"{} has no submesh groups, importing it as one object",
						manifest.display_name
					);
					None
				}
			},
		};
		let partitioned = groups.is_some();
		let meshes = partition(mesh, groups.as_deref())?;

		Ok(ImportBundle {
			item_id: manifest.item_id,
			display_name: manifest.display_name,
			meshes,
			partitioned,
			transform,
		})
	}

	async fn load(&self, geometry: &GeometryRef) -> Result<AssembledMesh, ImportError> {
		let payload = self.fetcher.fetch(geometry).await?;
		Ok(self.assembler.assemble(payload, geometry.format).await?)
	}
}

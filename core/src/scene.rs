use crate::{manifest::Dimensions, mesh::FinalMesh};
use nalgebra::Vector3;
use std::collections::{BTreeMap, HashMap};

mod handoff;
pub use handoff::*;

mod host;
pub use host::*;

mod memory;
pub use memory::*;

/// Object tag carrying the catalog id an object was imported from.
pub static ITEM_ID_TAG: &str = "rsi_id";

/// Per-axis scale applied to every object of one import.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
	pub scale: Vector3<f32>,
}

impl Default for Transform {
	fn default() -> Self {
		Self {
			scale: Vector3::new(1.0, 1.0, 1.0),
		}
	}
}

impl Transform {
	/// Scales bounds so they match the catalog's dimensions: beam along X, length along Y, height along Z.
	/// Axes the mesh is flat along keep a scale of 1.
	pub fn fit(bounds: Option<(Vector3<f32>, Vector3<f32>)>, dimensions: Option<Dimensions>) -> Self {
		let ((min, max), dimensions) = match (bounds, dimensions) {
			(Some(bounds), Some(dimensions)) => (bounds, dimensions),
			_ => return Self::default(),
		};
		let target = Vector3::new(dimensions.beam, dimensions.length, dimensions.height);
		let extent = max - min;
		Self {
			scale: target.zip_map(&extent, |target, extent| match extent > f32::EPSILON {
				true => target / extent,
				false => 1.0,
			}),
		}
	}
}

/// The finished, pure-data result of an import, handed to the host for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBundle {
	pub item_id: String,
	pub display_name: String,
	pub meshes: Vec<FinalMesh>,
	/// Whether the meshes came out of the partitioner, which decides how objects are named.
	pub partitioned: bool,
	pub transform: Transform,
}

impl ImportBundle {
	pub fn object_name(&self, mesh: &FinalMesh) -> String {
		match self.partitioned {
			true => format!("{}.{}", self.display_name, mesh.name),
			false => self.display_name.clone(),
		}
	}

	pub fn triangle_count(&self) -> usize {
		self.meshes.iter().map(|mesh| mesh.mesh.triangle_count()).sum()
	}
}

/// What an import added to the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
	pub collection: CollectionId,
	pub objects: Vec<ObjectId>,
	pub materials: Vec<MaterialId>,
}

/// Inserts an [`ImportBundle`] into a scene, all or nothing.
pub struct Materializer;

impl Materializer {
	#[profiling::function]
	pub fn materialize(host: &mut dyn SceneHost, bundle: ImportBundle) -> Result<Materialized, Error> {
		let collection = host
			.create_collection(&bundle.display_name)
			.map_err(Error::Rejected)?;
		let mut materialized = Materialized {
			collection,
			objects: Vec::new(),
			materials: Vec::new(),
		};
		match Self::populate(host, &bundle, &mut materialized) {
			Ok(()) => {
				log::info!(
					target: "materialize",
					"Added {} object(s) for {} ({} triangles)",
					materialized.objects.len(),
					bundle.display_name,
					bundle.triangle_count()
				);
				Ok(materialized)
			}
			Err(reason) => {
				log::error!(target: "materialize", "Failed to add {}, rolling back: {reason}", bundle.display_name);
				host.remove_collection(materialized.collection);
				for material in materialized.materials.into_iter() {
					host.remove_material(material);
				}
				Err(Error::Rejected(reason))
			}
		}
	}

	fn populate(host: &mut dyn SceneHost, bundle: &ImportBundle, materialized: &mut Materialized) -> Result<(), String> {
		// Slots sharing a name across objects share one host material.
		let mut materials_by_name = HashMap::new();
		for final_mesh in bundle.meshes.iter() {
			let mut materials = Vec::with_capacity(final_mesh.mesh.material_slots.len());
			for slot in final_mesh.mesh.material_slots.iter() {
				let material = match materials_by_name.get(&slot.name) {
					Some(material) => *material,
					None => {
						let material = host.create_material(slot)?;
						materialized.materials.push(material);
						materials_by_name.insert(slot.name.clone(), material);
						material
					}
				};
				materials.push(material);
			}

			let name = bundle.object_name(final_mesh);
			log::debug!(target: "materialize", "Creating object {name}");
			let object = host.create_object(
				materialized.collection,
				ObjectSpec {
					name,
					mesh: final_mesh.mesh.clone(),
					materials,
					scale: bundle.transform.scale,
					tags: BTreeMap::from([(ITEM_ID_TAG.to_owned(), bundle.item_id.clone())]),
				},
			)?;
			materialized.objects.push(object);
		}
		Ok(())
	}
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("the scene rejected the import: {0}")]
	Rejected(String),
	#[error("the scene is no longer accepting imports")]
	Closed,
	#[error("import was cancelled before it reached the scene")]
	Cancelled,
}

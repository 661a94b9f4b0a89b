use crate::mesh::{AssembledMesh, MaterialSlot};
use nalgebra::Vector3;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

/// Everything the host needs to create one mesh object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
	pub name: String,
	pub mesh: AssembledMesh,
	// one per material slot of the mesh
	pub materials: Vec<MaterialId>,
	pub scale: Vector3<f32>,
	pub tags: BTreeMap<String, String>,
}

/// The scene-graph operations an import needs from its host application.
/// Only ever called on the host's own scene-mutation context.
pub trait SceneHost {
	fn create_collection(&mut self, name: &str) -> Result<CollectionId, String>;
	fn create_material(&mut self, slot: &MaterialSlot) -> Result<MaterialId, String>;
	fn create_object(&mut self, collection: CollectionId, object: ObjectSpec) -> Result<ObjectId, String>;
	/// Removes a collection along with every object in it.
	fn remove_collection(&mut self, collection: CollectionId);
	fn remove_material(&mut self, material: MaterialId);
}

use super::{CollectionId, MaterialId, ObjectId, ObjectSpec, SceneHost};
use crate::mesh::{AssembledMesh, MaterialSlot};
use nalgebra::Vector3;
use std::collections::BTreeMap;

/// A scene kept entirely in memory, for headless hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryScene {
	collections: Vec<SceneCollection>,
	materials: Vec<SceneMaterial>,
	next_id: usize,
	// objects which can still be created before the scene starts refusing them
	object_budget: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SceneCollection {
	pub id: CollectionId,
	pub name: String,
	pub objects: Vec<SceneObject>,
}

#[derive(Debug, Clone)]
pub struct SceneMaterial {
	pub id: MaterialId,
	pub name: String,
	pub texture_ref: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
	pub id: ObjectId,
	pub name: String,
	pub mesh: AssembledMesh,
	pub materials: Vec<MaterialId>,
	pub scale: Vector3<f32>,
	pub tags: BTreeMap<String, String>,
}

impl MemoryScene {
	/// Refuses every object after the first `count` are created.
	pub fn failing_after(mut self, count: usize) -> Self {
		self.object_budget = Some(count);
		self
	}

	pub fn collections(&self) -> &[SceneCollection] {
		&self.collections
	}

	pub fn materials(&self) -> &[SceneMaterial] {
		&self.materials
	}

	pub fn material(&self, id: MaterialId) -> Option<&SceneMaterial> {
		self.materials.iter().find(|material| material.id == id)
	}

	pub fn objects(&self) -> impl Iterator<Item = &SceneObject> + '_ {
		self.collections.iter().flat_map(|collection| collection.objects.iter())
	}

	pub fn object_count(&self) -> usize {
		self.objects().count()
	}

	fn next_id(&mut self) -> usize {
		self.next_id += 1;
		self.next_id
	}
}

impl SceneHost for MemoryScene {
	fn create_collection(&mut self, name: &str) -> Result<CollectionId, String> {
		let id = CollectionId(self.next_id());
		self.collections.push(SceneCollection {
			id,
			name: name.to_owned(),
			objects: Vec::new(),
		});
		Ok(id)
	}

	fn create_material(&mut self, slot: &MaterialSlot) -> Result<MaterialId, String> {
		let id = MaterialId(self.next_id());
		self.materials.push(SceneMaterial {
			id,
			name: slot.name.clone(),
			texture_ref: slot.texture_ref.clone(),
		});
		Ok(id)
	}

	fn create_object(&mut self, collection: CollectionId, object: ObjectSpec) -> Result<ObjectId, String> {
		if let Some(budget) = self.object_budget.as_mut() {
			if *budget == 0 {
				return Err(format!("object {} was refused", object.name));
			}
			*budget -= 1;
		}
		let id = ObjectId(self.next_id());
		let collection = self
			.collections
			.iter_mut()
			.find(|entry| entry.id == collection)
			.ok_or_else(|| format!("collection {collection:?} does not exist"))?;
		collection.objects.push(SceneObject {
			id,
			name: object.name,
			mesh: object.mesh,
			materials: object.materials,
			scale: object.scale,
			tags: object.tags,
		});
		Ok(id)
	}

	fn remove_collection(&mut self, collection: CollectionId) {
		self.collections.retain(|entry| entry.id != collection);
	}

	fn remove_material(&mut self, material: MaterialId) {
		self.materials.retain(|entry| entry.id != material);
	}
}

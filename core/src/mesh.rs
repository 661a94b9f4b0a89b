use crate::manifest::MaterialRef;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

pub type Triangle = [u32; 3];

/// Mesh data rebuilt from one or more decoded geometry containers.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssembledMesh {
	pub vertices: Vec<Vertex>,
	// each value refers to an entry in vertices
	pub triangles: Vec<Triangle>,
	// length matches triangles
	// each value refers to an entry in material_slots
	pub triangle_materials: Vec<u32>,
	pub material_slots: Vec<MaterialSlot>,
}

/// Vertex data of an assembled mesh.
/// Decoders emit one vertex per unique (position, normal, uv), so positions may repeat.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Vertex {
	pub position: Vector3<f32>,
	pub normal: Vector3<f32>,
	pub tex_coord: Vector2<f32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MaterialSlot {
	pub name: String,
	pub texture_ref: Option<String>,
}

impl MaterialSlot {
	pub fn unnamed(index: usize) -> Self {
		Self {
			name: format!("slot.{index:03}"),
			texture_ref: None,
		}
	}
}

/// A mesh which is ready to become exactly one scene object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FinalMesh {
	pub name: String,
	pub mesh: AssembledMesh,
}

impl AssembledMesh {
	pub fn triangle_count(&self) -> usize {
		self.triangles.len()
	}

	pub fn vertex_count(&self) -> usize {
		self.vertices.len()
	}

	pub fn is_empty(&self) -> bool {
		self.triangles.is_empty()
	}

	pub fn material_of(&self, triangle_index: usize) -> u32 {
		self.triangle_materials
			.get(triangle_index)
			.copied()
			.unwrap_or_default()
	}

	/// Axis-aligned bounds of every vertex position, `None` for a mesh without vertices.
	pub fn bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
		let mut positions = self.vertices.iter().map(|vertex| vertex.position);
		let first = positions.next()?;
		Some(positions.fold((first, first), |(min, max), position| {
			(min.inf(&position), max.sup(&position))
		}))
	}

	/// Names the slots after the manifest's materials, slot `i` taking material `i`.
	/// Slots beyond the manifest's list keep their generated names.
	pub fn bind_materials(&mut self, materials: &[MaterialRef]) {
		for (slot, material) in self.material_slots.iter_mut().zip(materials.iter()) {
			slot.name = material.name.clone();
			slot.texture_ref = material.texture_ref.clone();
		}
	}

	/// Concatenates meshes in order, offsetting the vertex and material references of each later mesh.
	pub fn merge(meshes: Vec<AssembledMesh>) -> AssembledMesh {
		let mut meshes = meshes.into_iter();
		let mut merged = match meshes.next() {
			Some(first) => first,
			None => return AssembledMesh::default(),
		};
		for mut mesh in meshes {
			let vertex_offset = merged.vertices.len() as u32;
			let slot_offset = merged.material_slots.len() as u32;
			merged.vertices.append(&mut mesh.vertices);
			merged.triangles.extend(
				mesh.triangles
					.iter()
					.map(|triangle| triangle.map(|index| index + vertex_offset)),
			);
			merged
				.triangle_materials
				.extend(mesh.triangle_materials.iter().map(|slot| slot + slot_offset));
			// Later meshes get fresh slot names so they stay distinguishable after merging.
			let first_new_slot = merged.material_slots.len();
			merged.material_slots.extend(
				(0..mesh.material_slots.len()).map(|index| MaterialSlot::unnamed(first_new_slot + index)),
			);
		}
		merged
	}
}

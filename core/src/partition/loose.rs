use crate::{
	manifest::{Selection, SubmeshGroup},
	mesh::AssembledMesh,
	utility::RangeSet,
};
use std::collections::HashMap;

/// Derives one submesh group per connected component of the mesh, named `part.001`, `part.002`, ...
///
/// Triangles are connected when they share a vertex, or a vertex position, since decoders split
/// vertices along uv and normal seams. Parts are ordered by their first triangle.
#[profiling::function]
pub fn loose_parts(mesh: &AssembledMesh) -> Vec<SubmeshGroup> {
	let mut components = DisjointSet::new(mesh.vertex_count());

	let mut by_position = HashMap::new();
	for (index, vertex) in mesh.vertices.iter().enumerate() {
		let key = vertex.position.map(f32::to_bits);
		let first = *by_position.entry((key.x, key.y, key.z)).or_insert(index);
		components.union(first, index);
	}
	for triangle in mesh.triangles.iter() {
		let [a, b, c] = triangle.map(|index| index as usize);
		components.union(a, b);
		components.union(a, c);
	}

	let mut part_of_root = HashMap::new();
	let mut parts: Vec<RangeSet> = Vec::new();
	for (triangle_index, triangle) in mesh.triangles.iter().enumerate() {
		let root = components.find(triangle[0] as usize);
		let part = *part_of_root.entry(root).or_insert_with(|| {
			parts.push(RangeSet::default());
			parts.len() - 1
		});
		parts[part].insert(triangle_index);
	}

	log::debug!(target: "partition", "Found {} loose parts", parts.len());
	parts
		.into_iter()
		.enumerate()
		.map(|(index, triangles)| SubmeshGroup {
			name: format!("part.{:03}", index + 1),
			selection: Selection::Triangles(triangles),
		})
		.collect()
}

struct DisjointSet {
	parents: Vec<usize>,
}

impl DisjointSet {
	fn new(size: usize) -> Self {
		Self {
			parents: (0..size).collect(),
		}
	}

	fn find(&mut self, mut item: usize) -> usize {
		while self.parents[item] != item {
			// path halving
			self.parents[item] = self.parents[self.parents[item]];
			item = self.parents[item];
		}
		item
	}

	fn union(&mut self, a: usize, b: usize) {
		let (a, b) = (self.find(a), self.find(b));
		if a != b {
			self.parents[a.max(b)] = a.min(b);
		}
	}
}

use crate::{
	manifest::{Selection, SubmeshGroup},
	mesh::{AssembledMesh, FinalMesh, Triangle},
};

mod loose;
pub use loose::*;

/// Name of the group holding every triangle no named group selected.
pub const DEFAULT_GROUP: &str = "default";

/// Splits a mesh into one mesh per submesh group, plus the [`DEFAULT_GROUP`] remainder.
///
/// Without groups the mesh is returned whole. Otherwise every triangle ends up in exactly one output:
/// the group selecting it, or the remainder. Named groups are always emitted (even if they select nothing),
/// the remainder only when it has triangles. Each output gets its own compacted vertex and material arrays.
///
/// Groups which select triangles past the end of the mesh, or which claim the same triangle, are rejected.
#[profiling::function]
pub fn partition(mesh: AssembledMesh, groups: Option<&[SubmeshGroup]>) -> Result<Vec<FinalMesh>, Error> {
	let groups = match groups {
		Some(groups) if !groups.is_empty() => groups,
		_ => {
			return Ok(vec![FinalMesh {
				name: DEFAULT_GROUP.to_owned(),
				mesh,
			}])
		}
	};

	let triangle_count = mesh.triangle_count();
	for group in groups.iter() {
		if let Selection::Triangles(ranges) = &group.selection {
			if ranges.end() > triangle_count {
				return Err(Error::OutOfRange {
					group: group.name.clone(),
					end: ranges.end(),
					triangle_count,
				});
			}
		}
	}

	// The last bucket is the remainder.
	let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); groups.len() + 1];
	for triangle_index in 0..triangle_count {
		let material = mesh.material_of(triangle_index);
		let mut matches = groups
			.iter()
			.enumerate()
			.filter(|(_, group)| group.selection.contains(triangle_index, material))
			.map(|(group_index, _)| group_index);
		let bucket = matches.next().unwrap_or(groups.len());
		if let Some(other) = matches.next() {
			return Err(Error::Overlap {
				triangle: triangle_index,
				first: groups[bucket].name.clone(),
				second: groups[other].name.clone(),
			});
		}
		buckets[bucket].push(triangle_index);
	}

	let remainder = buckets.pop().unwrap_or_default();
	let mut meshes = groups
		.iter()
		.zip(buckets.iter())
		.map(|(group, triangles)| FinalMesh {
			name: group.name.clone(),
			mesh: extract(&mesh, triangles),
		})
		.collect::<Vec<_>>();
	if !remainder.is_empty() {
		meshes.push(FinalMesh {
			name: DEFAULT_GROUP.to_owned(),
			mesh: extract(&mesh, &remainder),
		});
	}

	for final_mesh in meshes.iter() {
		log::debug!(
			target: "partition",
			"Submesh \"{}\": {} triangles, {} vertices",
			final_mesh.name,
			final_mesh.mesh.triangle_count(),
			final_mesh.mesh.vertex_count()
		);
	}
	Ok(meshes)
}

/// Copies the given triangles into a new mesh, keeping only the vertices and material slots they use.
fn extract(mesh: &AssembledMesh, triangle_indices: &[usize]) -> AssembledMesh {
	let mut vertex_map: Vec<Option<u32>> = vec![None; mesh.vertex_count()];
	let mut slot_map: Vec<Option<u32>> = vec![None; mesh.material_slots.len()];
	let mut output = AssembledMesh::default();

	for &triangle_index in triangle_indices.iter() {
		let triangle: Triangle = mesh.triangles[triangle_index].map(|index| {
			*vertex_map[index as usize].get_or_insert_with(|| {
				output.vertices.push(mesh.vertices[index as usize].clone());
				(output.vertices.len() - 1) as u32
			})
		});
		output.triangles.push(triangle);

		let slot = mesh.material_of(triangle_index) as usize;
		let local_slot = match slot_map.get_mut(slot) {
			Some(entry) => *entry.get_or_insert_with(|| {
				output.material_slots.push(mesh.material_slots[slot].clone());
				(output.material_slots.len() - 1) as u32
			}),
			None => 0,
		};
		output.triangle_materials.push(local_slot);
	}
	output
}

/// Submesh groups that do not fit the assembled mesh.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("submesh group \"{group}\" selects triangles up to {end} but the mesh only has {triangle_count}")]
	OutOfRange {
		group: String,
		end: usize,
		triangle_count: usize,
	},
	#[error("triangle {triangle} is selected by both submesh groups \"{first}\" and \"{second}\"")]
	Overlap {
		triangle: usize,
		first: String,
		second: String,
	},
}

#[cfg(test)]
mod partition {
	use super::*;
	use crate::{mesh::mesh::strip, utility::RangeSet};

	fn by_range(name: &str, range: std::ops::Range<usize>) -> SubmeshGroup {
		SubmeshGroup {
			name: name.to_owned(),
			selection: Selection::Triangles(RangeSet::from_iter([range])),
		}
	}

	fn by_material(name: &str, slot: u32) -> SubmeshGroup {
		SubmeshGroup {
			name: name.to_owned(),
			selection: Selection::Material(slot),
		}
	}

	/// Every input triangle must show up exactly once, with the same corner positions.
	fn assert_set_partition(input: &AssembledMesh, outputs: &[FinalMesh]) {
		let corners = |mesh: &AssembledMesh| {
			let mut corners = mesh
				.triangles
				.iter()
				.map(|triangle| {
					triangle.map(|index| {
						let position = mesh.vertices[index as usize].position;
						[position.x.to_bits(), position.y.to_bits(), position.z.to_bits()]
					})
				})
				.collect::<Vec<_>>();
			corners.sort();
			corners
		};
		let mut output_corners = outputs.iter().flat_map(|output| corners(&output.mesh)).collect::<Vec<_>>();
		output_corners.sort();
		assert_eq!(output_corners, corners(input));
	}

	#[test]
	fn no_groups_is_identity() {
		let mesh = strip(4, 2);
		assert_eq!(
			partition(mesh.clone(), None),
			Ok(vec![FinalMesh {
				name: DEFAULT_GROUP.to_owned(),
				mesh: mesh.clone()
			}])
		);
		assert_eq!(partition(mesh.clone(), Some(&[])).unwrap().len(), 1);
	}

	#[test]
	fn range_groups_with_remainder() {
		let mesh = strip(4, 1);
		let groups = [by_range("hull", 0..2), by_range("wing", 4..6)];
		let outputs = partition(mesh.clone(), Some(&groups)).unwrap();
		assert_eq!(
			outputs.iter().map(|output| output.name.as_str()).collect::<Vec<_>>(),
			vec!["hull", "wing", DEFAULT_GROUP]
		);
		assert_eq!(
			outputs.iter().map(|output| output.mesh.triangle_count()).collect::<Vec<_>>(),
			vec![2, 2, 4]
		);
		assert_set_partition(&mesh, &outputs);
	}

	#[test]
	fn vertices_are_compacted() {
		let mesh = strip(4, 1);
		let outputs = partition(mesh.clone(), Some(&[by_range("hull", 0..2)])).unwrap();
		let hull = &outputs[0].mesh;
		// one quad keeps its own four corners
		assert_eq!(hull.vertex_count(), 4);
		assert_eq!(hull.triangles, vec![[0, 1, 2], [0, 2, 3]]);
		assert_eq!(hull.vertices[1], mesh.vertices[2]);
		// the remainder has three quads, so eight corners
		assert_eq!(outputs[1].mesh.vertex_count(), 8);
		for output in outputs.iter() {
			for triangle in output.mesh.triangles.iter() {
				assert!(triangle.iter().all(|index| (*index as usize) < output.mesh.vertex_count()));
			}
		}
	}

	#[test]
	fn material_groups_carry_their_slots() {
		let mesh = strip(4, 2);
		let groups = [by_material("glass", 1)];
		let outputs = partition(mesh.clone(), Some(&groups)).unwrap();
		assert_eq!(outputs.len(), 2);
		let glass = &outputs[0].mesh;
		assert_eq!(glass.triangle_count(), 4);
		assert_eq!(glass.material_slots, vec![mesh.material_slots[1].clone()]);
		assert_eq!(glass.triangle_materials, vec![0; 4]);
		assert_eq!(outputs[1].mesh.material_slots, vec![mesh.material_slots[0].clone()]);
		assert_set_partition(&mesh, &outputs);
	}

	#[test]
	fn full_coverage_has_no_remainder() {
		let mesh = strip(2, 2);
		let groups = [by_material("a", 0), by_material("b", 1)];
		let outputs = partition(mesh.clone(), Some(&groups)).unwrap();
		assert_eq!(outputs.len(), 2);
		assert_set_partition(&mesh, &outputs);
	}

	#[test]
	fn empty_group_is_still_emitted() {
		let mesh = strip(2, 1);
		let outputs = partition(mesh.clone(), Some(&[by_material("ghost", 7)])).unwrap();
		assert_eq!(outputs.len(), 2);
		assert_eq!(outputs[0].name, "ghost");
		assert!(outputs[0].mesh.is_empty());
		assert_eq!(outputs[1].mesh.triangle_count(), 4);
	}

	#[test]
	fn range_past_the_mesh_is_rejected() {
		let mesh = strip(1, 1);
		let groups = [by_range("wing", 0..1000), by_material("all", 1)];
		assert_eq!(
			partition(mesh, Some(&groups)),
			Err(Error::OutOfRange {
				group: "wing".to_owned(),
				end: 1000,
				triangle_count: 2,
			})
		);
	}

	#[test]
	fn range_and_material_group_claiming_one_triangle() {
		let mesh = strip(2, 1);
		let groups = [by_range("front", 0..2), by_material("everything", 0)];
		assert_eq!(
			partition(mesh, Some(&groups)),
			Err(Error::Overlap {
				triangle: 0,
				first: "front".to_owned(),
				second: "everything".to_owned(),
			})
		);
	}

	#[test]
	fn disjoint_range_and_material_groups() {
		let mesh = strip(2, 2);
		let groups = [by_range("front", 0..1), by_material("glass", 1)];
		let outputs = partition(mesh.clone(), Some(&groups)).unwrap();
		assert_eq!(
			outputs.iter().map(|output| output.mesh.triangle_count()).collect::<Vec<_>>(),
			vec![1, 2, 1]
		);
		assert_set_partition(&mesh, &outputs);
	}
}

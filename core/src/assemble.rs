use crate::{
	decoder::{DecodeError, DecodedArrays, Decoder},
	fetch::RawPayload,
	format::GeometryFormat,
	mesh::{AssembledMesh, MaterialSlot, Triangle, Vertex},
};
use nalgebra::{Vector2, Vector3};
use std::sync::Arc;

/// Turns downloaded container bytes into a validated [`AssembledMesh`].
/// Nothing the decoder returns is used before [`build_mesh`] has checked it.
pub struct MeshAssembler {
	decoder: Arc<dyn Decoder>,
	convert_axes: bool,
}

impl MeshAssembler {
	pub fn new(decoder: Arc<dyn Decoder>) -> Self {
		Self {
			decoder,
			convert_axes: true,
		}
	}

	pub fn with_axis_conversion(mut self, convert_axes: bool) -> Self {
		self.convert_axes = convert_axes;
		self
	}

	pub async fn assemble(&self, payload: RawPayload, expected: GeometryFormat) -> Result<AssembledMesh, Error> {
		let RawPayload { locator, bytes } = payload;
		match GeometryFormat::sniff(&bytes) {
			Some(found) if found == expected => {}
			found => {
				return Err(Error::FormatMismatch {
					locator,
					expected,
					found,
				})
			}
		}
		if !self.decoder.supports(expected) {
			return Err(Error::NoDecoder(expected));
		}

		log::debug!(target: "assemble", "Decoding {} bytes from {locator}", bytes.len());
		let arrays = self
			.decoder
			.decode(expected, bytes)
			.await
			.map_err(|err| Error::Decode(locator.clone(), err))?;
		let mesh = build_mesh(arrays, self.convert_axes).map_err(|err| Error::Invalid(locator.clone(), err))?;
		log::info!(
			target: "assemble",
			"Assembled {locator}: {} vertices, {} triangles, {} material slots",
			mesh.vertex_count(),
			mesh.triangle_count(),
			mesh.material_slots.len()
		);
		Ok(mesh)
	}
}

/// Highest number of material slots a single decoded mesh may use.
pub const MAX_MATERIAL_SLOTS: u32 = 4096;

/// Validates decoder output and converts it into mesh data.
/// Missing normals are computed from the faces, missing uvs are zeroed.
#[profiling::function]
pub fn build_mesh(arrays: DecodedArrays, convert_axes: bool) -> Result<AssembledMesh, Inconsistency> {
	let DecodedArrays {
		positions,
		normals,
		uvs,
		triangle_indices,
		material_slot_indices,
	} = arrays;

	let vertex_count = positions.len();
	if triangle_indices.len() % 3 != 0 {
		return Err(Inconsistency::PartialTriangle(triangle_indices.len()));
	}
	let triangle_count = triangle_indices.len() / 3;
	for (name, len) in [("normals", normals.len()), ("uvs", uvs.len())] {
		if len != 0 && len != vertex_count {
			return Err(Inconsistency::Length {
				name,
				len,
				expected: vertex_count,
			});
		}
	}
	if !material_slot_indices.is_empty() && material_slot_indices.len() != triangle_count {
		return Err(Inconsistency::Length {
			name: "material slots",
			len: material_slot_indices.len(),
			expected: triangle_count,
		});
	}
	if let Some(position) = (positions.iter().flatten())
		.chain(normals.iter().flatten())
		.chain(uvs.iter().flatten())
		.position(|value| !value.is_finite())
	{
		return Err(Inconsistency::NonFinite(position));
	}
	if let Some(slot) = material_slot_indices.iter().find(|slot| **slot >= MAX_MATERIAL_SLOTS) {
		return Err(Inconsistency::SlotOutOfRange {
			slot: *slot,
			limit: MAX_MATERIAL_SLOTS,
		});
	}
	if let Some(index) = triangle_indices.iter().find(|index| **index as usize >= vertex_count) {
		return Err(Inconsistency::IndexOutOfRange {
			index: *index,
			vertex_count,
		});
	}

	let triangles: Vec<Triangle> = triangle_indices
		.chunks_exact(3)
		.map(|chunk| [chunk[0], chunk[1], chunk[2]])
		.collect();
	let normals = match normals.is_empty() {
		true => face_normals(&positions, &triangles),
		false => normals.into_iter().map(Vector3::from).collect(),
	};
	let vertices = positions
		.into_iter()
		.zip(normals.into_iter())
		.enumerate()
		.map(|(index, (position, normal))| Vertex {
			position: convert(Vector3::from(position), convert_axes),
			normal: convert(normal, convert_axes),
			tex_coord: uvs.get(index).map(|uv| Vector2::from(*uv)).unwrap_or_else(Vector2::zeros),
		})
		.collect();

	let triangle_materials = match material_slot_indices.is_empty() {
		true => vec![0; triangle_count],
		false => material_slot_indices,
	};
	let slot_count = triangle_materials.iter().max().map_or(1, |max| *max as usize + 1);

	Ok(AssembledMesh {
		vertices,
		triangles,
		triangle_materials,
		material_slots: (0..slot_count).map(MaterialSlot::unnamed).collect(),
	})
}

/// Upstream data is Y-up, the scene is Z-up.
fn convert(value: Vector3<f32>, convert_axes: bool) -> Vector3<f32> {
	match convert_axes {
		true => Vector3::new(value.x, -value.z, value.y),
		false => value,
	}
}

/// Area-weighted vertex normals, accumulated from every face using the vertex.
fn face_normals(positions: &[[f32; 3]], triangles: &[Triangle]) -> Vec<Vector3<f32>> {
	let mut normals = vec![Vector3::<f32>::zeros(); positions.len()];
	for triangle in triangles.iter() {
		let [a, b, c] = triangle.map(|index| Vector3::from(positions[index as usize]));
		let face = (b - a).cross(&(c - a));
		for index in triangle.iter() {
			normals[*index as usize] += face;
		}
	}
	normals
		.into_iter()
		.map(|normal| normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y))
		.collect()
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Inconsistency {
	#[error("{0} triangle indices is not a multiple of 3")]
	PartialTriangle(usize),
	#[error("{name} has {len} entries, expected {expected}")]
	Length {
		name: &'static str,
		len: usize,
		expected: usize,
	},
	#[error("value {0} is not finite")]
	NonFinite(usize),
	#[error("triangle index {index} is out of range for {vertex_count} vertices")]
	IndexOutOfRange { index: u32, vertex_count: usize },
	#[error("material slot {slot} is beyond the limit of {limit} slots")]
	SlotOutOfRange { slot: u32, limit: u32 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
	#[error("{locator} was expected to be {expected} but is {}", describe(.found))]
	FormatMismatch {
		locator: String,
		expected: GeometryFormat,
		found: Option<GeometryFormat>,
	},
	#[error("no decoder is available for {0} geometry")]
	NoDecoder(GeometryFormat),
	#[error("failed to decode {0}: {1}")]
	Decode(String, DecodeError),
	#[error("decoded geometry from {0} is corrupt: {1}")]
	Invalid(String, Inconsistency),
}

fn describe(format: &Option<GeometryFormat>) -> String {
	match format {
		Some(format) => format.to_string(),
		None => "unrecognized".to_owned(),
	}
}

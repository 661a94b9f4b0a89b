use super::{DecodeError, DecodedArrays};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Counts above this are rejected before anything is allocated for them.
pub const MAX_ELEMENTS: usize = 1 << 26;
/// Counts come from the decoder, so preallocate no more than this up front.
const PREALLOCATE_LIMIT: usize = 1 << 16;

/// Reads the big-endian array stream written by a decoder process:
///
/// ```text
/// u32 n, [f32; 3] x n   positions
/// u32 n, [f32; 3] x n   normals
/// u32 n, [f32; 2] x n   uvs
/// u32 n, [u32; 3] x n   triangles
/// u32 n, u32 x n        material slot per triangle
/// ```
pub struct ArrayStream<R> {
	stream: R,
}

impl<R: AsyncRead + Unpin> ArrayStream<R> {
	pub fn new(stream: R) -> Self {
		Self { stream }
	}

	pub async fn process(mut self) -> Result<DecodedArrays, DecodeError> {
		let vertex_count = self.read_count("vertex count").await?;
		let positions = self.read_vec3s(vertex_count, "positions").await?;

		let normal_count = self.read_count("normal count").await?;
		let normals = self.read_vec3s(normal_count, "normals").await?;

		let uv_count = self.read_count("uv count").await?;
		let mut uvs = Vec::with_capacity(uv_count.min(PREALLOCATE_LIMIT));
		for _ in 0..uv_count {
			let u = self.read_f32("uvs").await?;
			let v = self.read_f32("uvs").await?;
			uvs.push([u, v]);
		}

		let triangle_count = self.read_count("triangle count").await?;
		let index_count = triangle_count * 3;
		let mut triangle_indices = Vec::with_capacity(index_count.min(PREALLOCATE_LIMIT));
		for _ in 0..index_count {
			triangle_indices.push(self.read_u32("indices").await?);
		}

		let slot_count = self.read_count("material slot count").await?;
		let mut material_slot_indices = Vec::with_capacity(slot_count.min(PREALLOCATE_LIMIT));
		for _ in 0..slot_count {
			material_slot_indices.push(self.read_u32("material slots").await?);
		}

		Ok(DecodedArrays {
			positions,
			normals,
			uvs,
			triangle_indices,
			material_slot_indices,
		})
	}

	async fn read_vec3s(&mut self, count: usize, what: &str) -> Result<Vec<[f32; 3]>, DecodeError> {
		let mut values = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
		for _ in 0..count {
			let x = self.read_f32(what).await?;
			let y = self.read_f32(what).await?;
			let z = self.read_f32(what).await?;
			values.push([x, y, z]);
		}
		Ok(values)
	}

	async fn read_count(&mut self, what: &str) -> Result<usize, DecodeError> {
		let count = self.read_u32(what).await? as usize;
		if count > MAX_ELEMENTS {
			return Err(DecodeError::Inconsistent(format!(
				"{what} of {count} exceeds the limit of {MAX_ELEMENTS}"
			)));
		}
		Ok(count)
	}

	async fn read_u32(&mut self, what: &str) -> Result<u32, DecodeError> {
		self.stream.read_u32().await.map_err(|err| Self::io_error(err, what))
	}

	async fn read_f32(&mut self, what: &str) -> Result<f32, DecodeError> {
		self.stream.read_f32().await.map_err(|err| Self::io_error(err, what))
	}

	fn io_error(err: std::io::Error, what: &str) -> DecodeError {
		match err.kind() {
			std::io::ErrorKind::UnexpectedEof => DecodeError::Truncated(what.to_owned()),
			_ => DecodeError::Unknown(format!("failed to read {what}: {err}")),
		}
	}
}

/// Writes arrays in the layout [`ArrayStream`] reads; fixture payloads for tests.
#[cfg(test)]
pub(crate) fn encode(arrays: &DecodedArrays) -> Vec<u8> {
	fn put_u32(bytes: &mut Vec<u8>, value: u32) {
		bytes.extend_from_slice(&value.to_be_bytes());
	}
	let mut bytes = Vec::new();
	put_u32(&mut bytes, arrays.positions.len() as u32);
	for value in arrays.positions.iter().flatten() {
		bytes.extend_from_slice(&value.to_be_bytes());
	}
	put_u32(&mut bytes, arrays.normals.len() as u32);
	for value in arrays.normals.iter().flatten() {
		bytes.extend_from_slice(&value.to_be_bytes());
	}
	put_u32(&mut bytes, arrays.uvs.len() as u32);
	for value in arrays.uvs.iter().flatten() {
		bytes.extend_from_slice(&value.to_be_bytes());
	}
	put_u32(&mut bytes, (arrays.triangle_indices.len() / 3) as u32);
	for index in arrays.triangle_indices.iter() {
		put_u32(&mut bytes, *index);
	}
	put_u32(&mut bytes, arrays.material_slot_indices.len() as u32);
	for slot in arrays.material_slot_indices.iter() {
		put_u32(&mut bytes, *slot);
	}
	bytes
}

use crate::mesh::AssembledMesh;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Converts upstream texture coordinates into the scene's convention.
/// Components are swapped first (when enabled), then scaled, then offset.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
	#[serde(default = "UvTransform::default_swap_axes")]
	pub swap_axes: bool,
	#[serde(default = "UvTransform::default_scale")]
	pub scale: [f32; 2],
	#[serde(default = "UvTransform::default_offset")]
	pub offset: [f32; 2],
}

impl Default for UvTransform {
	fn default() -> Self {
		Self {
			swap_axes: Self::default_swap_axes(),
			scale: Self::default_scale(),
			offset: Self::default_offset(),
		}
	}
}

impl UvTransform {
	fn default_swap_axes() -> bool {
		true
	}

	fn default_scale() -> [f32; 2] {
		[1.0, -1.0]
	}

	fn default_offset() -> [f32; 2] {
		[0.0, 1.0]
	}

	/// With the defaults, `(u, v)` becomes `(v, 1 - u)`:
	/// `(0, 0)` lands on `(0, 1)` and `(1, 1)` on `(1, 0)`.
	pub fn apply(&self, uv: Vector2<f32>) -> Vector2<f32> {
		let uv = match self.swap_axes {
			true => Vector2::new(uv.y, uv.x),
			false => uv,
		};
		uv.component_mul(&Vector2::from(self.scale)) + Vector2::from(self.offset)
	}
}

/// Applies a [`UvTransform`] to every vertex of a mesh.
/// The transform is not its own inverse, so each mesh must be remapped exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct UvRemapper {
	transform: UvTransform,
}

impl UvRemapper {
	pub fn new(transform: UvTransform) -> Self {
		Self { transform }
	}

	pub fn transform(&self) -> &UvTransform {
		&self.transform
	}

	#[profiling::function]
	pub fn remap(&self, mut mesh: AssembledMesh) -> AssembledMesh {
		for vertex in mesh.vertices.iter_mut() {
			vertex.tex_coord = self.transform.apply(vertex.tex_coord);
		}
		mesh
	}
}

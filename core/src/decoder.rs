//! The seam to the geometry-container decoder.
//!
//! Container bytes are never decoded here. A [`Decoder`] turns them into flat arrays,
//! which the assembler then treats as untrusted until it has validated them.

use crate::format::GeometryFormat;
use futures::future::Future;
use std::pin::Pin;

mod error;
pub use error::*;

mod process;
pub use process::*;

mod stream;
pub use stream::*;

pub type DecodeFuture =
	Pin<Box<dyn Future<Output = Result<DecodedArrays, DecodeError>> + Send + 'static>>;

/// Flat arrays as produced by a decoder, before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedArrays {
	pub positions: Vec<[f32; 3]>,
	// empty, or one per position
	pub normals: Vec<[f32; 3]>,
	// empty, or one per position
	pub uvs: Vec<[f32; 2]>,
	// three per triangle, each refers to an entry in positions
	pub triangle_indices: Vec<u32>,
	// empty, or one per triangle
	pub material_slot_indices: Vec<u32>,
}

pub trait Decoder: Send + Sync {
	fn supports(&self, format: GeometryFormat) -> bool;
	fn decode(&self, format: GeometryFormat, bytes: Vec<u8>) -> DecodeFuture;
}

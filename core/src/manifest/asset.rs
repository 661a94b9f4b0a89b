use crate::{format::GeometryFormat, utility::RangeSet};

/// Everything needed to download and rebuild one catalog item.
/// Owned by the import that resolved it and never kept past that import.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetManifest {
	pub item_id: String,
	pub display_name: String,
	pub geometry_refs: Vec<GeometryRef>,
	pub submesh_groups: Option<Vec<SubmeshGroup>>,
	pub material_refs: Vec<MaterialRef>,
	pub dimensions: Option<Dimensions>,
	pub details: ProductDetails,
}

/// Descriptive catalog fields, shown to the user but never used to build the model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductDetails {
	pub manufacturer: Option<String>,
	pub kind: Option<String>,
	pub focus: Option<String>,
	pub size: Option<String>,
	pub min_crew: Option<String>,
	pub max_crew: Option<String>,
	/// Absolute link to the item's catalog page.
	pub page_url: Option<String>,
}

impl ProductDetails {
	/// `min - max`, or whichever bound the catalog lists.
	pub fn crew(&self) -> Option<String> {
		match (&self.min_crew, &self.max_crew) {
			(Some(min), Some(max)) if min == max => Some(min.clone()),
			(Some(min), Some(max)) => Some(format!("{min} - {max}")),
			(Some(crew), None) | (None, Some(crew)) => Some(crew.clone()),
			(None, None) => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryRef {
	pub locator: String,
	pub format: GeometryFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRef {
	pub name: String,
	pub texture_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmeshGroup {
	pub name: String,
	pub selection: Selection,
}

/// Which triangles of the assembled mesh belong to a submesh group.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
	/// Triangle indices into the assembled (merged) mesh.
	Triangles(RangeSet),
	/// Every triangle assigned to this material slot.
	Material(u32),
}

impl Selection {
	pub fn contains(&self, triangle_index: usize, material_slot: u32) -> bool {
		match self {
			Self::Triangles(ranges) => ranges.contains(triangle_index),
			Self::Material(slot) => *slot == material_slot,
		}
	}
}

/// Real-world extents in metres, as listed by the catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
	pub beam: f32,
	pub length: f32,
	pub height: f32,
}

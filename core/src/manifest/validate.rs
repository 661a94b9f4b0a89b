use super::{
	AssetManifest, Dimensions, Error, GeometryRef, MaterialRef, ProductDetails, Selection, SubmeshGroup,
};
use crate::{
	catalog::{GeometryEntry, ItemRecord, SubmeshEntry},
	format::GeometryFormat,
	http::Endpoints,
	partition::DEFAULT_GROUP,
	utility::RangeSet,
};
use std::collections::HashSet;

/// Shapes a catalog record into a manifest, rejecting anything the rest of the pipeline could trip over.
pub(super) fn build(
	record: ItemRecord,
	geometry: Vec<GeometryEntry>,
	endpoints: &Endpoints,
) -> Result<AssetManifest, Error> {
	let item_id = record.id.clone();
	let malformed = |reason: String| Error::Malformed(item_id.clone(), reason);

	if geometry.is_empty() {
		return Err(malformed("no geometry refs".to_owned()));
	}
	let geometry_refs = geometry
		.into_iter()
		.map(|entry| {
			if entry.url.trim().is_empty() {
				return Err(malformed("geometry ref has an empty url".to_owned()));
			}
			let format = entry
				.format
				.parse::<GeometryFormat>()
				.map_err(|err| malformed(err.to_string()))?;
			Ok(GeometryRef {
				locator: endpoints.resolve(&entry.url),
				format,
			})
		})
		.collect::<Result<Vec<_>, _>>()?;

	let material_refs = record
		.materials
		.iter()
		.map(|entry| MaterialRef {
			name: entry.name.clone(),
			texture_ref: entry.texture.as_ref().map(|texture| endpoints.resolve(texture)),
		})
		.collect();

	let submesh_groups = match record.submeshes.is_empty() {
		true => None,
		false => Some(submesh_groups(&record.submeshes).map_err(malformed)?),
	};

	let dimensions = match (record.beam, record.length, record.height) {
		(Some(beam), Some(length), Some(height)) => Some(Dimensions {
			beam,
			length,
			height,
		}),
		_ => None,
	};

	let details = ProductDetails {
		manufacturer: record.manufacturer.and_then(|manufacturer| manufacturer.name),
		kind: record.kind,
		focus: record.focus,
		size: record.size,
		min_crew: record.min_crew,
		max_crew: record.max_crew,
		page_url: record.url.as_ref().map(|url| endpoints.resolve(url)),
	};

	Ok(AssetManifest {
		item_id: record.id,
		display_name: record.name,
		geometry_refs,
		submesh_groups,
		material_refs,
		dimensions,
		details,
	})
}

fn submesh_groups(entries: &[SubmeshEntry]) -> Result<Vec<SubmeshGroup>, String> {
	let mut names = HashSet::new();
	let mut covered = RangeSet::default();
	let mut materials = HashSet::new();
	let mut groups = Vec::with_capacity(entries.len());
	for entry in entries.iter() {
		let name = entry.name.trim();
		if name.is_empty() {
			return Err("submesh group has no name".to_owned());
		}
		if name == DEFAULT_GROUP {
			return Err(format!("submesh group name \"{DEFAULT_GROUP}\" is reserved"));
		}
		if !names.insert(name.to_owned()) {
			return Err(format!("submesh group \"{name}\" is listed twice"));
		}

		let selection = match (&entry.triangles, entry.material) {
			(Some(ranges), None) => {
				let mut selected = RangeSet::default();
				for &[start, end] in ranges.iter() {
					if start >= end {
						return Err(format!(
							"submesh group \"{name}\" has an empty or inverted range [{start}, {end})"
						));
					}
					selected.insert_range(start..end);
				}
				if selected.is_empty() {
					return Err(format!("submesh group \"{name}\" selects no triangles"));
				}
				if covered.intersects_set(&selected) {
					return Err(format!(
						"submesh group \"{name}\" overlaps the triangles of another group"
					));
				}
				for range in selected.ranges() {
					covered.insert_range(range.clone());
				}
				Selection::Triangles(selected)
			}
			(None, Some(slot)) => {
				if !materials.insert(slot) {
					return Err(format!(
						"submesh group \"{name}\" selects material {slot}, which another group already selects"
					));
				}
				Selection::Material(slot)
			}
			_ => {
				return Err(format!(
					"submesh group \"{name}\" must select either triangles or a material"
				))
			}
		};
		groups.push(SubmeshGroup {
			name: name.to_owned(),
			selection,
		});
	}
	Ok(groups)
}

#[cfg(test)]
mod validate {
	use super::*;

	fn record(submeshes: Vec<SubmeshEntry>) -> ItemRecord {
		ItemRecord {
			id: "1".to_owned(),
			name: "Aurora".to_owned(),
			url: None,
			media: Vec::new(),
			beam: Some(2.0),
			length: None,
			height: Some(3.0),
			manufacturer: None,
			kind: None,
			focus: None,
			size: None,
			min_crew: Some("1".to_owned()),
			max_crew: Some("1".to_owned()),
			geometry: None,
			materials: Vec::new(),
			submeshes,
		}
	}

	fn geometry() -> Vec<GeometryEntry> {
		vec![GeometryEntry {
			url: "/aurora.ctm".to_owned(),
			format: "ctm".to_owned(),
		}]
	}

	fn by_range(name: &str, ranges: Vec<[usize; 2]>) -> SubmeshEntry {
		SubmeshEntry {
			name: name.to_owned(),
			triangles: Some(ranges),
			material: None,
		}
	}

	fn by_material(name: &str, material: u32) -> SubmeshEntry {
		SubmeshEntry {
			name: name.to_owned(),
			triangles: None,
			material: Some(material),
		}
	}

	fn reason(result: Result<AssetManifest, Error>) -> String {
		match result {
			Err(Error::Malformed(_, reason)) => reason,
			other => panic!("expected a malformed manifest, got {other:?}"),
		}
	}

	#[test]
	fn partial_dimensions_are_dropped() {
		let endpoints = Endpoints::new("https://catalog.test");
		let manifest = build(record(vec![]), geometry(), &endpoints).unwrap();
		assert_eq!(manifest.dimensions, None);
		assert_eq!(manifest.submesh_groups, None);
		assert_eq!(manifest.details.crew().as_deref(), Some("1"));
		assert_eq!(manifest.details.page_url, None);
	}

	#[test]
	fn no_geometry() {
		let endpoints = Endpoints::new("https://catalog.test");
		assert_eq!(
			reason(build(record(vec![]), vec![], &endpoints)),
			"no geometry refs"
		);
	}

	#[test]
	fn unknown_format() {
		let endpoints = Endpoints::new("https://catalog.test");
		let geometry = vec![GeometryEntry {
			url: "/aurora.fbx".to_owned(),
			format: "fbx".to_owned(),
		}];
		assert!(reason(build(record(vec![]), geometry, &endpoints)).contains("fbx"));
	}

	#[test]
	fn overlapping_ranges() {
		let endpoints = Endpoints::new("https://catalog.test");
		let submeshes = vec![by_range("a", vec![[0, 10]]), by_range("b", vec![[20, 30], [9, 12]])];
		assert!(reason(build(record(submeshes), geometry(), &endpoints)).contains("overlaps"));
	}

	#[test]
	fn touching_ranges_are_fine() {
		let endpoints = Endpoints::new("https://catalog.test");
		let submeshes = vec![by_range("a", vec![[0, 10]]), by_range("b", vec![[10, 12]])];
		let manifest = build(record(submeshes), geometry(), &endpoints).unwrap();
		assert_eq!(manifest.submesh_groups.map(|groups| groups.len()), Some(2));
	}

	#[test]
	fn inverted_range() {
		let endpoints = Endpoints::new("https://catalog.test");
		let submeshes = vec![by_range("a", vec![[5, 5]])];
		assert!(reason(build(record(submeshes), geometry(), &endpoints)).contains("inverted"));
	}

	#[test]
	fn duplicate_material() {
		let endpoints = Endpoints::new("https://catalog.test");
		let submeshes = vec![by_material("a", 2), by_material("b", 2)];
		assert!(reason(build(record(submeshes), geometry(), &endpoints)).contains("material 2"));
	}

	#[test]
	fn reserved_and_duplicate_names() {
		let endpoints = Endpoints::new("https://catalog.test");
		let submeshes = vec![by_material(DEFAULT_GROUP, 0)];
		assert!(reason(build(record(submeshes), geometry(), &endpoints)).contains("reserved"));
		let submeshes = vec![by_material("a", 0), by_material("a", 1)];
		assert!(reason(build(record(submeshes), geometry(), &endpoints)).contains("twice"));
	}

	#[test]
	fn ambiguous_selection() {
		let endpoints = Endpoints::new("https://catalog.test");
		let submeshes = vec![SubmeshEntry {
			name: "a".to_owned(),
			triangles: Some(vec![[0, 1]]),
			material: Some(0),
		}];
		assert!(reason(build(record(submeshes), geometry(), &endpoints)).contains("either"));
	}
}

use rsi_import::scene::{MemoryScene, SceneObject};
use std::{
	io::Write,
	path::{Path, PathBuf},
};

/// Writes every object of the scene to `<dir>/<object name>.obj`, returning the written paths.
pub fn dump_scene(scene: &MemoryScene, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
	std::fs::create_dir_all(dir)?;
	let mut paths = Vec::new();
	for object in scene.objects() {
		let path = dir.join(format!("{}.obj", file_name(&object.name)));
		let mut file = std::io::BufWriter::new(std::fs::File::create(&path)?);
		write_object(&mut file, scene, object)?;
		file.flush()?;
		log::info!("Wrote {}", path.display());
		paths.push(path);
	}
	Ok(paths)
}

/// Wavefront OBJ of one object, with its scale baked into the positions.
pub fn write_object(out: &mut impl Write, scene: &MemoryScene, object: &SceneObject) -> std::io::Result<()> {
	let mesh = &object.mesh;
	writeln!(out, "# {}", object.name)?;
	for (tag, value) in object.tags.iter() {
		writeln!(out, "# {tag}: {value}")?;
	}
	writeln!(out, "o {}", object.name)?;
	for vertex in mesh.vertices.iter() {
		let position = vertex.position.component_mul(&object.scale);
		writeln!(out, "v {} {} {}", position.x, position.y, position.z)?;
	}
	for vertex in mesh.vertices.iter() {
		writeln!(out, "vt {} {}", vertex.tex_coord.x, vertex.tex_coord.y)?;
	}
	for vertex in mesh.vertices.iter() {
		writeln!(out, "vn {} {} {}", vertex.normal.x, vertex.normal.y, vertex.normal.z)?;
	}

	let mut current_slot = None;
	for (index, triangle) in mesh.triangles.iter().enumerate() {
		let slot = mesh.material_of(index);
		if current_slot != Some(slot) {
			let material = object
				.materials
				.get(slot as usize)
				.and_then(|id| scene.material(*id))
				.map(|material| material.name.as_str())
				.unwrap_or("none");
			writeln!(out, "usemtl {material}")?;
			current_slot = Some(slot);
		}
		// obj indices are 1-based
		let [a, b, c] = triangle.map(|index| index + 1);
		writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
	}
	Ok(())
}

fn file_name(object_name: &str) -> String {
	object_name
		.chars()
		.map(|c| match c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
			true => c,
			false => '_',
		})
		.collect()
}

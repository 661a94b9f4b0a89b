use serde::{Deserialize, Serialize};

/// The container formats a catalog model may be published in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GeometryFormat {
	/// OpenCTM compressed triangle mesh.
	Ctm,
	/// Binary glTF.
	Glb,
}

impl GeometryFormat {
	pub fn all() -> [Self; 2] {
		[Self::Ctm, Self::Glb]
	}

	pub fn tag(&self) -> &'static str {
		match self {
			Self::Ctm => "ctm",
			Self::Glb => "glb",
		}
	}

	pub fn magic(&self) -> &'static [u8] {
		match self {
			Self::Ctm => b"OCTM",
			Self::Glb => b"glTF",
		}
	}

	/// Determines the format of a payload from its leading magic bytes.
	pub fn sniff(bytes: &[u8]) -> Option<Self> {
		Self::all()
			.into_iter()
			.find(|format| bytes.starts_with(format.magic()))
	}
}

impl std::fmt::Display for GeometryFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.tag())
	}
}

impl std::str::FromStr for GeometryFormat {
	type Err = UnknownFormat;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"ctm" | "openctm" => Ok(Self::Ctm),
			"glb" => Ok(Self::Glb),
			_ => Err(UnknownFormat(s.to_owned())),
		}
	}
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown geometry format tag \"{0}\"")]
pub struct UnknownFormat(pub String);

#[cfg(test)]
mod format {
	use super::*;

	#[test]
	fn sniff_by_magic() {
		assert_eq!(GeometryFormat::sniff(b"OCTM\x05\0\0\0"), Some(GeometryFormat::Ctm));
		assert_eq!(GeometryFormat::sniff(b"glTF\x02\0\0\0"), Some(GeometryFormat::Glb));
		assert_eq!(GeometryFormat::sniff(b"OCT"), None);
		assert_eq!(GeometryFormat::sniff(b""), None);
	}

	#[test]
	fn parse_tags() {
		assert_eq!("CTM".parse::<GeometryFormat>(), Ok(GeometryFormat::Ctm));
		assert_eq!("openctm".parse::<GeometryFormat>(), Ok(GeometryFormat::Ctm));
		assert_eq!(" glb ".parse::<GeometryFormat>(), Ok(GeometryFormat::Glb));
		assert_eq!(
			"obj".parse::<GeometryFormat>(),
			Err(UnknownFormat("obj".to_owned()))
		);
	}
}

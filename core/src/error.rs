use crate::{assemble, catalog, decoder::DecodeError, fetch, manifest, partition, scene};

/// The category of an import failure, as shown to the user next to its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	NotFound,
	Download,
	MalformedManifest,
	CorruptPayload,
	UnsupportedFormat,
	Search,
	DecoderUnavailable,
	Scene,
	Cancelled,
}

impl ErrorKind {
	pub fn name(&self) -> &'static str {
		match self {
			Self::NotFound => "not found",
			Self::Download => "download failed",
			Self::MalformedManifest => "malformed manifest",
			Self::CorruptPayload => "corrupt payload",
			Self::UnsupportedFormat => "unsupported format",
			Self::Search => "search failed",
			Self::DecoderUnavailable => "decoder unavailable",
			Self::Scene => "scene error",
			Self::Cancelled => "cancelled",
		}
	}
}

impl std::fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

/// Any failure of a search or an import. Every variant aborts the whole operation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ImportError {
	#[error(transparent)]
	Search(#[from] catalog::Error),
	#[error(transparent)]
	Manifest(#[from] manifest::Error),
	#[error(transparent)]
	Fetch(#[from] fetch::Error),
	#[error(transparent)]
	Assemble(#[from] assemble::Error),
	#[error(transparent)]
	Partition(#[from] partition::Error),
	#[error(transparent)]
	Scene(#[from] scene::Error),
	#[error("import was cancelled")]
	Cancelled,
}

impl ImportError {
	pub fn kind(&self) -> ErrorKind {
		use manifest::Error as Manifest;
		match self {
			Self::Search(_) => ErrorKind::Search,
			Self::Manifest(Manifest::NotFound(_) | Manifest::NoModel(..)) => ErrorKind::NotFound,
			Self::Manifest(Manifest::Request(..) | Manifest::Status(..)) => ErrorKind::Download,
			Self::Manifest(Manifest::Malformed(..)) => ErrorKind::MalformedManifest,
			Self::Fetch(fetch::Error::NotFound(_)) => ErrorKind::NotFound,
			Self::Fetch(fetch::Error::Download { .. }) => ErrorKind::Download,
			Self::Assemble(assemble::Error::FormatMismatch { .. } | assemble::Error::NoDecoder(_)) => {
				ErrorKind::UnsupportedFormat
			}
			Self::Assemble(assemble::Error::Decode(_, DecodeError::Unavailable(_))) => ErrorKind::DecoderUnavailable,
			Self::Assemble(assemble::Error::Decode(..) | assemble::Error::Invalid(..)) => ErrorKind::CorruptPayload,
			Self::Partition(_) => ErrorKind::MalformedManifest,
			Self::Scene(scene::Error::Cancelled) | Self::Cancelled => ErrorKind::Cancelled,
			Self::Scene(_) => ErrorKind::Scene,
		}
	}

	/// One line for the user: the kind followed by the message.
	pub fn report(&self) -> String {
		format!("{}: {self}", self.kind())
	}
}

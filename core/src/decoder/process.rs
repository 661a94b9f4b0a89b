use super::{ArrayStream, DecodeError, DecodeFuture, DecodedArrays, Decoder};
use crate::format::GeometryFormat;
use std::{path::PathBuf, process::Stdio};

/// Environment variable telling the decoder process which container format it is given.
pub static FORMAT_ENV: &str = "GEOMETRY_FORMAT";

/// Drives an externally installed decoder program.
/// The payload goes in on stdin, arrays come back on stdout (see [`ArrayStream`]),
/// and a failure is reported as a single `Name(argument)` line on stderr.
#[derive(Debug, Clone)]
pub struct ProcessDecoder {
	program: PathBuf,
	args: Vec<String>,
	formats: Vec<GeometryFormat>,
}

impl ProcessDecoder {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			formats: vec![GeometryFormat::Ctm],
		}
	}

	pub fn with_args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args = args.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_formats(mut self, formats: Vec<GeometryFormat>) -> Self {
		self.formats = formats;
		self
	}

	async fn run(self, format: GeometryFormat, bytes: Vec<u8>) -> Result<DecodedArrays, DecodeError> {
		use tokio::{io::AsyncReadExt, io::AsyncWriteExt, process::Command};

		log::debug!(
			target: "decoder",
			"Decoding {} bytes of {format} with {}",
			bytes.len(),
			self.program.display()
		);
		let mut decoder = Command::new(&self.program)
			.args(&self.args)
			.env(FORMAT_ENV, format.tag())
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			// an abandoned import must not leave the decoder running
			.kill_on_drop(true)
			.spawn()
			.map_err(|err| {
				DecodeError::Unavailable(format!("failed to launch {}: {err}", self.program.display()))
			})?;
		let (mut in_stream, out_stream, mut err_stream) =
			match (decoder.stdin.take(), decoder.stdout.take(), decoder.stderr.take()) {
				(Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
				_ => return Err(DecodeError::Unavailable("decoder pipes were not opened".to_owned())),
			};

		// Feed the payload in a detached task so a decoder which streams its output
		// before consuming all of its input cannot deadlock against us.
		let feed_payload = tokio::task::spawn(async move {
			let result = in_stream.write_all(&bytes).await;
			// Dropping stdin closes it, which is the decoder's end-of-payload signal.
			drop(in_stream);
			result
		});
		// Parse the output as it is written, in parallel with draining stderr below.
		let read_arrays = tokio::task::spawn(async move { ArrayStream::new(out_stream).process().await });

		// Reaching EOF on stderr means the decoder is done writing (though not necessarily exited).
		let report = {
			let mut buffer = String::new();
			err_stream
				.read_to_string(&mut buffer)
				.await
				.map_err(|err| DecodeError::Unknown(format!("failed to read decoder errors: {err}")))?;
			buffer
		};

		if !report.trim().is_empty() {
			// The output is no longer relevant once the decoder has complained.
			read_arrays.abort();
			feed_payload.abort();
			let _status = decoder.wait().await;
			return Err(DecodeError::from_report(&report));
		}

		let status = decoder
			.wait()
			.await
			.map_err(|err| DecodeError::Unknown(format!("failed to wait for decoder: {err}")))?;
		if let Ok(Err(err)) = feed_payload.await {
			log::debug!(target: "decoder", "decoder stopped reading its payload early: {err}");
		}
		let arrays = read_arrays
			.await
			.map_err(|err| DecodeError::Unknown(format!("decoder output task failed: {err}")))?;
		if !status.success() {
			return Err(DecodeError::Unknown(format!("decoder exited with {status}")));
		}
		arrays
	}
}

impl Decoder for ProcessDecoder {
	fn supports(&self, format: GeometryFormat) -> bool {
		self.formats.contains(&format)
	}

	fn decode(&self, format: GeometryFormat, bytes: Vec<u8>) -> DecodeFuture {
		Box::pin(self.clone().run(format, bytes))
	}
}

#[cfg(all(test, unix))]
mod process {
	use super::*;
	use crate::decoder::stream::encode;

	fn triangle() -> DecodedArrays {
		DecodedArrays {
			positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
			normals: vec![[0.0, 0.0, 1.0]; 3],
			uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
			triangle_indices: vec![0, 1, 2],
			material_slot_indices: vec![],
		}
	}

	#[tokio::test]
	async fn decodes_stdout() {
		// `cat` echoes the payload, so a pre-encoded payload decodes to itself.
		let decoder = ProcessDecoder::new("cat");
		let arrays = decoder
			.decode(GeometryFormat::Ctm, encode(&triangle()))
			.await
			.unwrap();
		assert_eq!(arrays, triangle());
	}

	#[tokio::test]
	async fn parses_reported_errors() {
		let decoder = ProcessDecoder::new("sh")
			.with_args(["-c", "cat > /dev/null; echo 'UnsupportedCompression(MG2)' >&2"]);
		assert_eq!(
			decoder.decode(GeometryFormat::Ctm, b"OCTM".to_vec()).await,
			Err(DecodeError::UnsupportedCompression("MG2".to_owned()))
		);
	}

	#[tokio::test]
	async fn format_is_passed_in_the_environment() {
		let decoder = ProcessDecoder::new("sh")
			.with_args(["-c", "cat > /dev/null; echo \"InvalidFormat($GEOMETRY_FORMAT)\" >&2"])
			.with_formats(vec![GeometryFormat::Glb]);
		assert!(decoder.supports(GeometryFormat::Glb));
		assert!(!decoder.supports(GeometryFormat::Ctm));
		assert_eq!(
			decoder.decode(GeometryFormat::Glb, b"glTF".to_vec()).await,
			Err(DecodeError::InvalidFormat("glb".to_owned()))
		);
	}

	#[tokio::test]
	async fn missing_program() {
		let decoder = ProcessDecoder::new("/nonexistent/geometry-decoder");
		assert!(matches!(
			decoder.decode(GeometryFormat::Ctm, Vec::new()).await,
			Err(DecodeError::Unavailable(_))
		));
	}

	#[tokio::test]
	async fn failing_exit_status() {
		let decoder = ProcessDecoder::new("sh").with_args(["-c", "cat > /dev/null; exit 3"]);
		assert!(matches!(
			decoder.decode(GeometryFormat::Ctm, Vec::new()).await,
			Err(DecodeError::Unknown(_))
		));
	}
}

use regex::Regex;
use std::sync::OnceLock;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
	#[error("payload is not a valid {0} container")]
	InvalidFormat(String),
	#[error("container uses the unsupported compression method \"{0}\"")]
	UnsupportedCompression(String),
	#[error("decoded data ended early while reading {0}")]
	Truncated(String),
	#[error("decoded data is inconsistent: {0}")]
	Inconsistent(String),
	#[error("geometry decoder is unavailable: {0}")]
	Unavailable(String),
	#[error("geometry decoder failed: {0}")]
	Unknown(String),
}

impl DecodeError {
	/// Reads the last error line a decoder process wrote, e.g. `Truncated(indices)`.
	/// Anything unrecognized is kept verbatim as [`DecodeError::Unknown`].
	pub fn from_report(report: &str) -> Self {
		let line = report
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.last()
			.unwrap_or_default();
		match line.parse::<Self>() {
			Ok(err) => err,
			Err(parse_err) => {
				log::debug!(target: "decoder", "{parse_err}");
				Self::Unknown(report.trim().to_owned())
			}
		}
	}
}

fn report_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(r"^(?P<error>[A-Za-z]+)(?:\((?P<arg>[^)]*)\))?$").expect("report pattern is a valid regex")
	})
}

impl std::str::FromStr for DecodeError {
	type Err = FailedToParseReport;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		use FailedToParseReport::*;
		let groups = report_pattern()
			.captures(s.trim())
			.ok_or_else(|| InvalidReportFormat(s.to_owned()))?;
		let error_name = groups.name("error").map(|m| m.as_str()).unwrap_or_default();
		let arg = || -> Result<String, FailedToParseReport> {
			match groups.name("arg").map(|m| m.as_str().trim()) {
				Some(arg) if !arg.is_empty() => Ok(arg.to_owned()),
				_ => Err(ReportMissingArg(error_name.to_owned())),
			}
		};
		match error_name {
			"InvalidFormat" => Ok(Self::InvalidFormat(arg()?)),
			"UnsupportedCompression" => Ok(Self::UnsupportedCompression(arg()?)),
			"Truncated" => Ok(Self::Truncated(arg()?)),
			"Inconsistent" => Ok(Self::Inconsistent(arg()?)),
			_ => Err(UnknownReport(error_name.to_owned())),
		}
	}
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FailedToParseReport {
	#[error("decoder report \"{0}\" does not look like Name(argument)")]
	InvalidReportFormat(String),
	#[error("decoder reported \"{0}\" without the argument it requires")]
	ReportMissingArg(String),
	#[error("decoder reported the unknown error \"{0}\"")]
	UnknownReport(String),
}

#[cfg(test)]
mod error {
	use super::*;

	#[test]
	fn parse_known_reports() {
		assert_eq!(
			"InvalidFormat(ctm)".parse::<DecodeError>(),
			Ok(DecodeError::InvalidFormat("ctm".to_owned()))
		);
		assert_eq!(
			" UnsupportedCompression(MG2) ".parse::<DecodeError>(),
			Ok(DecodeError::UnsupportedCompression("MG2".to_owned()))
		);
		assert_eq!(
			"Truncated()".parse::<DecodeError>(),
			Err(FailedToParseReport::ReportMissingArg("Truncated".to_owned()))
		);
		assert_eq!(
			"Exploded(yes)".parse::<DecodeError>(),
			Err(FailedToParseReport::UnknownReport("Exploded".to_owned()))
		);
	}

	#[test]
	fn report_uses_last_line() {
		let report = "reading header\nwarning: odd padding\nTruncated(uvs)\n";
		assert_eq!(
			DecodeError::from_report(report),
			DecodeError::Truncated("uvs".to_owned())
		);
		assert_eq!(
			DecodeError::from_report("segmentation fault"),
			DecodeError::Unknown("segmentation fault".to_owned())
		);
	}
}

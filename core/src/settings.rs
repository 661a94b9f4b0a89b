use crate::{
	fetch::RetryPolicy,
	format::GeometryFormat,
	utility::{get_named_arg, has_flag},
	uv::UvTransform,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
	path::{Path, PathBuf},
	time::Duration,
};

/// User configuration for searching and importing.
/// Every field has a default, so a partial (or missing) file is always valid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
	#[serde(skip)]
	path: Option<PathBuf>,
	/// Split imports into one object per submesh group.
	#[serde(default)]
	pub separate_submeshes: bool,
	/// Without submesh groups, separate by connected parts instead.
	#[serde(default = "Settings::default_true")]
	pub loose_part_fallback: bool,
	#[serde(default)]
	pub debug: bool,
	#[serde(default = "Settings::default_api_root")]
	pub api_root: String,
	#[serde(default = "Settings::default_user_agent")]
	pub user_agent: String,
	#[serde(default = "Settings::default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub retry: RetryPolicy,
	#[serde(default = "Settings::default_search_limit")]
	pub search_limit: usize,
	#[serde(default)]
	pub decoder: DecoderSettings,
	#[serde(default)]
	pub uv_transform: UvTransform,
	/// Convert upstream Y-up geometry into the scene's Z-up space.
	#[serde(default = "Settings::default_true")]
	pub convert_axes: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DecoderSettings {
	#[serde(default = "DecoderSettings::default_program")]
	pub program: PathBuf,
	#[serde(default)]
	pub args: Vec<String>,
	#[serde(default = "DecoderSettings::default_formats")]
	pub formats: Vec<GeometryFormat>,
}

impl Default for DecoderSettings {
	fn default() -> Self {
		Self {
			program: Self::default_program(),
			args: Vec::new(),
			formats: Self::default_formats(),
		}
	}
}

impl DecoderSettings {
	fn default_program() -> PathBuf {
		PathBuf::from("ctm-decode")
	}

	fn default_formats() -> Vec<GeometryFormat> {
		vec![GeometryFormat::Ctm]
	}
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			path: None,
			separate_submeshes: false,
			loose_part_fallback: true,
			debug: false,
			api_root: Self::default_api_root(),
			user_agent: Self::default_user_agent(),
			timeout_ms: Self::default_timeout_ms(),
			retry: RetryPolicy::default(),
			search_limit: Self::default_search_limit(),
			decoder: DecoderSettings::default(),
			uv_transform: UvTransform::default(),
			convert_axes: true,
		}
	}
}

impl Settings {
	fn default_true() -> bool {
		true
	}

	fn default_api_root() -> String {
		"https://robertsspaceindustries.com".to_owned()
	}

	fn default_user_agent() -> String {
		"RSIBrowser".to_owned()
	}

	fn default_timeout_ms() -> u64 {
		30_000
	}

	fn default_search_limit() -> usize {
		20
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}

impl Settings {
	/// Loads settings from `path`, then writes them back so every default shows up in the file.
	pub fn load(path: &Path) -> Result<Self> {
		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() && !parent.exists() {
				std::fs::create_dir_all(parent)?;
			}
		}

		let mut settings = Self::default();
		if path.exists() {
			let raw = std::fs::read_to_string(path)
				.with_context(|| format!("failed to read settings from {}", path.display()))?;
			settings = serde_json::from_str(&raw)
				.with_context(|| format!("failed to parse settings in {}", path.display()))?;
		}
		settings.path = Some(path.to_owned());

		// Auto-save loaded settings to file
		{
			let json = serde_json::to_string_pretty(&settings)?;
			std::fs::write(path, json)?;
		}

		Ok(settings)
	}

	/// Applies `-name=value` overrides (and bare `-name` for booleans) from the command line.
	pub fn apply_overrides(&mut self) -> Result<()> {
		for name in Self::OVERRIDES {
			if let Some(value) = get_named_arg(name) {
				self.set(name, &value)?;
			} else if has_flag(name) {
				self.set(name, "true")?;
			}
		}
		Ok(())
	}

	const OVERRIDES: [&'static str; 9] = [
		"separate_submeshes",
		"loose_part_fallback",
		"debug",
		"api_root",
		"user_agent",
		"timeout_ms",
		"search_limit",
		"decoder",
		"convert_axes",
	];

	fn set(&mut self, name: &str, value: &str) -> Result<()> {
		let parse_bool = |value: &str| -> Result<bool> {
			value
				.parse::<bool>()
				.with_context(|| format!("-{name} expects true or false, got \"{value}\""))
		};
		let parse_number = |value: &str| -> Result<u64> {
			value
				.parse::<u64>()
				.with_context(|| format!("-{name} expects a number, got \"{value}\""))
		};
		match name {
			"separate_submeshes" => self.separate_submeshes = parse_bool(value)?,
			"loose_part_fallback" => self.loose_part_fallback = parse_bool(value)?,
			"debug" => self.debug = parse_bool(value)?,
			"convert_axes" => self.convert_axes = parse_bool(value)?,
			"api_root" => self.api_root = value.to_owned(),
			"user_agent" => self.user_agent = value.to_owned(),
			"timeout_ms" => self.timeout_ms = parse_number(value)?,
			"search_limit" => self.search_limit = parse_number(value)? as usize,
			"decoder" => self.decoder.program = PathBuf::from(value),
			_ => anyhow::bail!("unknown setting \"{name}\""),
		}
		log::debug!(target: "import", "Setting {name} overridden to {value}");
		Ok(())
	}
}

#[cfg(test)]
mod settings {
	use super::*;

	fn temp_path(name: &str) -> PathBuf {
		std::env::temp_dir()
			.join(format!("rsi-import-settings-{}", std::process::id()))
			.join(name)
	}

	#[test]
	fn partial_file_gets_defaults() {
		let settings: Settings =
			serde_json::from_str(r#"{ "separate_submeshes": true, "retry": { "max_retries": 1 } }"#).unwrap();
		assert!(settings.separate_submeshes);
		assert!(settings.loose_part_fallback);
		assert!(settings.convert_axes);
		assert_eq!(settings.retry.max_retries, 1);
		assert_eq!(settings.retry.initial_backoff_ms, RetryPolicy::default().initial_backoff_ms);
		assert_eq!(settings.search_limit, 20);
		assert_eq!(settings.decoder, DecoderSettings::default());
	}

	#[test]
	fn load_creates_and_round_trips() {
		let path = temp_path("created.json");
		let _ = std::fs::remove_file(&path);
		let settings = Settings::load(&path).unwrap();
		assert!(path.exists());
		assert_eq!(settings.path(), Some(path.as_path()));
		assert_eq!(settings.user_agent, "RSIBrowser");

		std::fs::write(&path, r#"{ "search_limit": 5 }"#).unwrap();
		let settings = Settings::load(&path).unwrap();
		assert_eq!(settings.search_limit, 5);
		// the rewritten file lists every field
		let saved = std::fs::read_to_string(&path).unwrap();
		assert!(saved.contains("loose_part_fallback"));
		let _ = std::fs::remove_file(&path);
	}

	#[test]
	fn invalid_file_is_an_error() {
		let path = temp_path("invalid.json");
		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		std::fs::write(&path, "{ not json").unwrap();
		assert!(Settings::load(&path).is_err());
		let _ = std::fs::remove_file(&path);
	}

	#[test]
	fn overrides() {
		let mut settings = Settings::default();
		settings.set("separate_submeshes", "true").unwrap();
		settings.set("search_limit", "7").unwrap();
		settings.set("decoder", "/opt/ctm/decode").unwrap();
		assert!(settings.separate_submeshes);
		assert_eq!(settings.search_limit, 7);
		assert_eq!(settings.decoder.program, PathBuf::from("/opt/ctm/decode"));
		assert!(settings.set("debug", "maybe").is_err());
		assert!(settings.set("colour", "red").is_err());
	}
}

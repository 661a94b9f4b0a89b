mod range_set;
pub use range_set::*;

/// Looks for a `-name=value` argument on the command line.
pub fn get_named_arg(name: &str) -> Option<String> {
	let prefix = format!("-{}=", name);
	std::env::args().find_map(|arg| arg.strip_prefix(&prefix).map(|s| s.to_owned()))
}

/// Returns true if a bare `-name` flag was passed on the command line.
pub fn has_flag(name: &str) -> bool {
	let flag = format!("-{}", name);
	std::env::args().any(|arg| arg == flag)
}

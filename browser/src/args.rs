/// What the browser was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Lists catalog items matching a term.
	Search(String),
	/// Shows the resolved manifest of one item.
	Info(String),
	/// Imports one item into the in-memory scene.
	Import(String),
}

impl Command {
	/// Reads the command from positional arguments; `-name` and `-name=value` options are skipped.
	pub fn parse<I, S>(args: I) -> Result<Self, Error>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let positional = args
			.into_iter()
			.map(|arg| arg.as_ref().to_owned())
			.filter(|arg| !arg.starts_with('-'))
			.collect::<Vec<_>>();
		let (command, rest) = positional.split_first().ok_or(Error::MissingCommand)?;
		let argument = |name: &'static str| -> Result<String, Error> {
			match rest.join(" ").trim() {
				"" => Err(Error::MissingArgument(command.clone(), name)),
				value => Ok(value.to_owned()),
			}
		};
		match command.as_str() {
			"search" => Ok(Self::Search(argument("term")?)),
			"info" => Ok(Self::Info(argument("item id")?)),
			"import" => Ok(Self::Import(argument("item id")?)),
			_ => Err(Error::UnknownCommand(command.clone())),
		}
	}
}

pub static USAGE: &str = "usage: rsi-browser <search TERM | info ITEM_ID | import ITEM_ID> [-settings=PATH] [-json] [-obj=DIR] [-separate_submeshes] [-debug]";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("no command given\n{USAGE}")]
	MissingCommand,
	#[error("unknown command \"{0}\"\n{USAGE}")]
	UnknownCommand(String),
	#[error("{0} needs a {1}\n{USAGE}")]
	MissingArgument(String, &'static str),
}

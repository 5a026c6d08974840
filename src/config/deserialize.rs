// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles app names and external commands given as a string or a list.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::AppName;

pub fn deserialize_app_name<'de, D>(deserializer: D) -> Result<AppName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    AppName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_command<'de, D>(deserializer: D) -> Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    CommandEntry::deserialize(deserializer)?
        .into_argv()
        .map_err(serde::de::Error::custom)
}

pub fn deserialize_command_option<'de, D>(
    deserializer: D,
) -> Result<Option<NonEmpty<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<CommandEntry> = Option::deserialize(deserializer)?;
    opt.map(CommandEntry::into_argv)
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// A command written either as one whitespace-separated string or as an
/// argv list. Use the list form when an argument contains spaces.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandEntry {
    Line(String),
    Argv(Vec<String>),
}

impl CommandEntry {
    fn into_argv(self) -> Result<NonEmpty<String>, String> {
        let argv = match self {
            CommandEntry::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            CommandEntry::Argv(argv) => argv,
        };
        NonEmpty::from_vec(argv).ok_or_else(|| "command cannot be empty".to_string())
    }
}

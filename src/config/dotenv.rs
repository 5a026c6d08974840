// ABOUTME: Minimal .env file support.
// ABOUTME: Reads KEY=VALUE lines and writes the file produced by `hoist init`.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

pub const DOTENV_FILENAME: &str = ".env";

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// `export ` prefix is allowed, and matching surrounding quotes are removed.
pub fn parse(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Read and parse a .env file; a missing file is an empty map.
pub fn read(path: &Path) -> Result<HashMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}

pub fn render(entries: &[(&str, &str)]) -> String {
    entries
        .iter()
        .map(|(k, v)| format!("{k}={v}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_quotes_and_export() {
        let vars = parse(
            "# generated\nCUSTOM_DOMAIN=app.example.com\nexport A=\"quoted value\"\nB='single'\n\nbroken line\n",
        );
        assert_eq!(vars.get("CUSTOM_DOMAIN").unwrap(), "app.example.com");
        assert_eq!(vars.get("A").unwrap(), "quoted value");
        assert_eq!(vars.get("B").unwrap(), "single");
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn value_may_contain_equals() {
        let vars = parse("TOKEN=abc=def==\n");
        assert_eq!(vars.get("TOKEN").unwrap(), "abc=def==");
    }

    #[test]
    fn render_then_parse() {
        let content = render(&[("CUSTOM_DOMAIN", "app.example.com")]);
        assert_eq!(content, "CUSTOM_DOMAIN=app.example.com\n");
        assert_eq!(parse(&content).get("CUSTOM_DOMAIN").unwrap(), "app.example.com");
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(&dir.path().join(".env")).unwrap().is_empty());
    }
}

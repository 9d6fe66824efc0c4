//! User alias file
//!
//! One alias per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! def = defenestrate
//! be-firm = defenestrate --option firmly
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{trace, warn};

/// Alias name to replacement arguments
pub type Aliases = BTreeMap<String, Vec<String>>;

/// Parses alias file content. Malformed lines are skipped.
pub fn parse(content: &str) -> Aliases {
    let mut aliases = Aliases::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((name, value)) = line.split_once('=') else {
            warn!(line = number + 1, "alias line has no '=': {:?}", line);
            continue;
        };
        let name = name.trim();
        let words: Vec<String> = value.split_whitespace().map(str::to_string).collect();
        if name.is_empty() || words.is_empty() {
            warn!(line = number + 1, "incomplete alias: {:?}", line);
            continue;
        }

        aliases.insert(name.to_string(), words);
    }

    aliases
}

/// Reads the alias file at `path`. An unreadable file has no aliases.
pub fn load(path: &Path) -> Aliases {
    match fs::read_to_string(path) {
        Ok(content) => parse(&content),
        Err(err) => {
            trace!(path = %path.display(), error = %err, "no user aliases");
            Aliases::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn words(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_skips_comments_and_blanks() {
        let aliases = parse(
            "
def = defenestrate
be-firm = defenestrate --option firmly
# ignored = yes
other = missing
		",
        );

        assert_eq!(aliases.len(), 3);
        assert_eq!(aliases["def"], words(&["defenestrate"]));
        assert_eq!(aliases["be-firm"], words(&["defenestrate", "--option", "firmly"]));
        assert_eq!(aliases["other"], words(&["missing"]));
    }

    #[test]
    fn parse_skips_malformed_lines() {
        let aliases = parse("no equals here\n= nothing\nempty =\nok = fine\n");
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases["ok"], words(&["fine"]));
    }

    #[test]
    fn later_lines_win() {
        let aliases = parse("a = one\na = two\n");
        assert_eq!(aliases["a"], words(&["two"]));
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load(&dir.path().join("aliases")).is_empty());
    }

    #[test]
    fn load_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aliases");
        fs::write(&path, "def = defenestrate\n").unwrap();
        assert_eq!(load(&path)["def"], words(&["defenestrate"]));
    }
}

// Local detection rules
//
// An optional plain-text file, one pattern per line, loaded once when the
// client is built. A missing or unreadable file degrades to an empty list;
// the reason is returned next to the list rather than raised.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::DetectRule;

/// Why the local rule list came back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLoadWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for RuleLoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to read rule list {}: {}",
            self.path.display(),
            self.reason
        )
    }
}

/// Result of loading the local rule file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalRules {
    pub rules: Vec<DetectRule>,
    pub warning: Option<RuleLoadWarning>,
}

/// Load local rules from `path`. `None` means no file is configured.
///
/// Lines are trimmed of trailing `\r` and decoded one at a time, so invalid
/// UTF-8 only affects its own line (replaced with U+FFFD). Each rule gets
/// [`DetectRule::LOCAL_ID`].
///
/// Unlike the panel agent, blank lines are skipped: an empty pattern would
/// match every connection.
pub fn load_local_rules(path: Option<&Path>) -> LocalRules {
    let Some(path) = path else {
        return LocalRules::default();
    };

    match std::fs::read(path) {
        Ok(contents) => LocalRules {
            rules: parse_rules(&contents),
            warning: None,
        },
        Err(e) => LocalRules {
            rules: Vec::new(),
            warning: Some(RuleLoadWarning {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        },
    }
}

fn parse_rules(contents: &[u8]) -> Vec<DetectRule> {
    contents
        .split(|&b| b == b'\n')
        .map(|line| String::from_utf8_lossy(line.strip_suffix(b"\r").unwrap_or(line)))
        .filter(|line| !line.trim().is_empty())
        .map(DetectRule::local)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn no_path_is_empty_without_warning() {
        assert_eq!(load_local_rules(None), LocalRules::default());
    }

    #[test]
    fn reads_one_rule_per_line() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "(api|ps|sv|offnavi|newvector|ulog.imap|newloc)(.map|).(baidu|n.shifen).com\r\n\nbittorrent\n  \nfoo.bar").expect("write");

        let loaded = load_local_rules(Some(file.path()));

        assert_eq!(loaded.warning, None);
        assert_eq!(
            loaded.rules,
            vec![
                DetectRule::local(
                    "(api|ps|sv|offnavi|newvector|ulog.imap|newloc)(.map|).(baidu|n.shifen).com"
                ),
                DetectRule::local("bittorrent"),
                DetectRule::local("foo.bar"),
            ]
        );
        assert!(loaded.rules.iter().all(|r| r.id == DetectRule::LOCAL_ID));
    }

    #[test]
    fn empty_file_is_empty_without_warning() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let loaded = load_local_rules(Some(file.path()));
        assert!(loaded.rules.is_empty());
        assert_eq!(loaded.warning, None);
    }

    #[test]
    fn missing_file_degrades_with_warning() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.txt");

        let loaded = load_local_rules(Some(&path));

        assert!(loaded.rules.is_empty());
        let warning = loaded.warning.expect("warning");
        assert_eq!(warning.path, path);
        assert!(warning.to_string().starts_with("failed to read rule list"));
    }

    #[test]
    fn invalid_utf8_only_affects_its_line() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"good.com\nbad\xe9.com\nother.com\n")
            .expect("write");

        let loaded = load_local_rules(Some(file.path()));

        assert_eq!(loaded.warning, None);
        assert_eq!(
            loaded.rules,
            vec![
                DetectRule::local("good.com"),
                DetectRule::local("bad\u{fffd}.com"),
                DetectRule::local("other.com"),
            ]
        );
    }
}

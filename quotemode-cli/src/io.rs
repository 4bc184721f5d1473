//! File, URL, and terminal adapters for the core's host traits.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use quotemode_core::{DocumentStore, NotificationKind, NotificationSink, RuleSource};

/// Rule file on disk.
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RuleSource for FileRuleSource {
    fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

enum Input {
    File(PathBuf),
    Url(String),
}

enum Output {
    Stdout,
    File(PathBuf),
}

/// Document store backed by a file or URL input and a file or stdout
/// output.
pub struct CliDocumentStore {
    input: Input,
    output: Output,
}

impl CliDocumentStore {
    /// Resolve the document source and write-back target from CLI args.
    pub fn from_args(input: &str, output: Option<&Path>, in_place: bool) -> Result<Self> {
        let input = if input.starts_with("http://") || input.starts_with("https://") {
            Input::Url(input.to_string())
        } else {
            Input::File(PathBuf::from(input))
        };
        let output = match (output, in_place) {
            (Some(path), _) => Output::File(path.to_path_buf()),
            (None, true) => match &input {
                Input::File(path) => Output::File(path.clone()),
                Input::Url(_) => bail!("--in-place requires a file input"),
            },
            (None, false) => Output::Stdout,
        };
        Ok(Self { input, output })
    }
}

impl DocumentStore for CliDocumentStore {
    fn load(&self) -> io::Result<String> {
        match &self.input {
            Input::File(path) => fs::read_to_string(path),
            Input::Url(url) => fetch_url(url),
        }
    }

    fn store(&self, content: &str) -> io::Result<()> {
        match &self.output {
            Output::File(path) => fs::write(path, content),
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(content.as_bytes())?;
                if !content.ends_with('\n') {
                    stdout.write_all(b"\n")?;
                }
                Ok(())
            }
        }
    }
}

fn fetch_url(url: &str) -> io::Result<String> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    response
        .text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Severity-tagged notifications on stderr.
pub struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn notify(&self, kind: NotificationKind, message: &str, detail: &str, _duration_ms: u32) {
        if detail.is_empty() {
            eprintln!("[{}] {}", kind.as_str(), message);
        } else {
            eprintln!("[{}] {} ({})", kind.as_str(), message, detail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_rule_source_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(&path, r#"{ "all": [] }"#).unwrap();

        let source = FileRuleSource::new(path);
        assert_eq!(source.read().unwrap(), r#"{ "all": [] }"#);
    }

    #[test]
    fn test_file_rule_source_missing_file_errors() {
        let source = FileRuleSource::new(PathBuf::from("/nonexistent/rules.json"));
        assert!(source.read().is_err());
    }

    #[test]
    fn test_document_store_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.xml");
        let output = dir.path().join("out.xml");
        fs::write(&input, "<doc/>").unwrap();

        let store =
            CliDocumentStore::from_args(input.to_str().unwrap(), Some(&output), false).unwrap();
        assert_eq!(store.load().unwrap(), "<doc/>");
        store.store("<doc><p/></doc>").unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "<doc><p/></doc>");
    }

    #[test]
    fn test_in_place_writes_over_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.xml");
        fs::write(&input, "<doc/>").unwrap();

        let store = CliDocumentStore::from_args(input.to_str().unwrap(), None, true).unwrap();
        store.store("<doc><p/></doc>").unwrap();
        assert_eq!(fs::read_to_string(&input).unwrap(), "<doc><p/></doc>");
    }

    #[test]
    fn test_in_place_rejects_url_input() {
        let result = CliDocumentStore::from_args("https://example.com/doc.xml", None, true);
        assert!(result.is_err());
    }
}

//! Pipeline definition parser
//!
//! Converts a pipeline definition document into a validated [`PipelineSpec`].
//!
//! The format is line oriented. Three marker lines switch the parser between
//! sections, in any order:
//!
//! ```text
//! - INFO -
//! repo: https://example.com/repo.git
//! - BUILD PHASE -
//! cargo build --release
//! - DEPLOY PHASE -
//! ./deploy.sh production
//! ```
//!
//! Lines before the first marker are ignored. Inside the info section only the
//! `repo:` key is meaningful; inside a phase section each non-blank line is one step.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::pipeline::{PipelineSpec, Step};

const INFO_MARKER: &str = "- INFO -";
const BUILD_MARKER: &str = "- BUILD PHASE -";
const DEPLOY_MARKER: &str = "- DEPLOY PHASE -";

const REPO_KEY: &str = "repo";

/// Errors produced while parsing a pipeline definition
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read pipeline definition {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: repository line is missing the ':' separator")]
    MissingSeparator { line: usize },

    #[error("line {line}: '{url}' is not a valid repository URL")]
    InvalidRepository { line: usize, url: String },

    #[error("pipeline definition does not declare a repository (expected 'repo: <url>' under '- INFO -')")]
    MissingRepository,

    #[error("line {line}: section '{section}' appears more than once")]
    DuplicateSection { line: usize, section: Section },
}

/// Section of a definition document the parser is currently reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Info,
    Build,
    Deploy,
}

impl Section {
    fn from_marker(line: &str) -> Option<Self> {
        match line {
            INFO_MARKER => Some(Section::Info),
            BUILD_MARKER => Some(Section::Build),
            DEPLOY_MARKER => Some(Section::Deploy),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        match self {
            Section::Info => 0,
            Section::Build => 1,
            Section::Deploy => 2,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Info => write!(f, "{}", INFO_MARKER),
            Section::Build => write!(f, "{}", BUILD_MARKER),
            Section::Deploy => write!(f, "{}", DEPLOY_MARKER),
        }
    }
}

/// Parse a pipeline definition file
///
/// # Errors
/// Returns [`DefinitionError::Io`] if the file cannot be read, otherwise the same
/// errors as [`parse_definition`].
pub fn parse_definition_file(path: impl AsRef<Path>) -> Result<PipelineSpec, DefinitionError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_definition(&text)
}

/// Parse a pipeline definition from its text
///
/// Blank lines are skipped everywhere. A phase line that yields no step is skipped
/// rather than aborting the parse.
///
/// # Errors
/// Returns an error if:
/// - A `repo` line has no `:` separator
/// - A section marker appears twice
/// - No non-empty repository URL was declared
/// - The repository URL is not syntactically plausible
///
/// # Example
/// ```
/// use chief_core::parse_definition;
///
/// let spec = parse_definition(
///     "- INFO -\nrepo: https://example.com/repo.git\n- BUILD PHASE -\necho hello\n- DEPLOY PHASE -\n",
/// )?;
/// assert_eq!(spec.repository_url(), "https://example.com/repo.git");
/// assert_eq!(spec.build_steps()[0].command, "echo");
/// assert!(spec.deploy_steps().is_empty());
/// # Ok::<(), chief_core::DefinitionError>(())
/// ```
pub fn parse_definition(text: &str) -> Result<PipelineSpec, DefinitionError> {
    let mut current: Option<Section> = None;
    let mut seen = [false; 3];

    let mut repository: Option<(String, usize)> = None;
    let mut build_steps = Vec::new();
    let mut deploy_steps = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(section) = Section::from_marker(line) {
            if seen[section.index()] {
                return Err(DefinitionError::DuplicateSection {
                    line: line_no,
                    section,
                });
            }
            seen[section.index()] = true;
            current = Some(section);
            continue;
        }

        match current {
            None => {}
            Some(Section::Info) => {
                if let Some(url) = parse_info_line(line, line_no)? {
                    if repository.is_some() {
                        tracing::warn!(
                            "line {}: repository declared again, using the later one",
                            line_no
                        );
                    }
                    repository = Some((url, line_no));
                }
            }
            Some(Section::Build) => build_steps.extend(Step::from_line(line)),
            Some(Section::Deploy) => deploy_steps.extend(Step::from_line(line)),
        }
    }

    let (url, line) = repository
        .filter(|(url, _)| !url.is_empty())
        .ok_or(DefinitionError::MissingRepository)?;

    if !is_plausible_url(&url) {
        return Err(DefinitionError::InvalidRepository { line, url });
    }

    PipelineSpec::new(url, build_steps, deploy_steps).ok_or(DefinitionError::MissingRepository)
}

/// Extract the repository URL from an info line, if the line declares one
fn parse_info_line(line: &str, line_no: usize) -> Result<Option<String>, DefinitionError> {
    let Some(after_key) = line.strip_prefix(REPO_KEY) else {
        return Ok(None);
    };

    if let Some(value) = after_key.trim_start().strip_prefix(':') {
        return Ok(Some(value.trim().to_string()));
    }

    // `repo` followed by anything but a separator; `repository: ...` is another key
    if after_key.is_empty() || after_key.starts_with(char::is_whitespace) {
        return Err(DefinitionError::MissingSeparator { line: line_no });
    }

    Ok(None)
}

/// Whether `url` looks like something git could clone
///
/// Accepts `scheme://rest`, scp-style `user@host:path` and absolute paths.
fn is_plausible_url(url: &str) -> bool {
    if url.is_empty() || url.chars().any(char::is_whitespace) {
        return false;
    }

    if let Some((scheme, rest)) = url.split_once("://") {
        let mut chars = scheme.chars();
        let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        return starts_alpha
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            && !rest.is_empty();
    }

    if url.starts_with('/') {
        return true;
    }

    match url.split_once(':') {
        Some((user_host, path)) => {
            let has_user_and_host = matches!(
                user_host.split_once('@'),
                Some((user, host)) if !user.is_empty() && !host.is_empty()
            );
            has_user_and_host && !path.is_empty()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_definition() {
        let text = "- INFO -\nrepo: https://example.com/repo.git\n- BUILD PHASE -\necho hello\n- DEPLOY PHASE -\n";
        let spec = parse_definition(text).unwrap();

        assert_eq!(spec.repository_url(), "https://example.com/repo.git");
        assert_eq!(spec.build_steps(), &[Step::new("echo", ["hello"])]);
        assert!(spec.deploy_steps().is_empty());
    }

    #[test]
    fn test_repo_is_text_after_first_separator() {
        let text = "- INFO -\nrepo:    ssh://git@example.com:2222/team/app.git   \n";
        let spec = parse_definition(text).unwrap();
        assert_eq!(spec.repository_url(), "ssh://git@example.com:2222/team/app.git");
    }

    #[test]
    fn test_steps_preserve_order_and_arguments() {
        let text = r#"
- INFO -
repo: git@github.com:acme/widgets.git
- BUILD PHASE -
cargo build --release
cargo   test  --all
- DEPLOY PHASE -
scp target/release/widgets deploy@host:/srv
systemctl restart widgets
"#;
        let spec = parse_definition(text).unwrap();

        assert_eq!(
            spec.build_steps(),
            &[
                Step::new("cargo", ["build", "--release"]),
                Step::new("cargo", ["test", "--all"]),
            ]
        );
        assert_eq!(spec.deploy_steps().len(), 2);
        assert_eq!(
            spec.deploy_steps()[0].arguments,
            vec!["target/release/widgets", "deploy@host:/srv"]
        );
        assert_eq!(spec.deploy_steps()[1].command, "systemctl");
    }

    #[test]
    fn test_sections_in_any_order() {
        let text = "- DEPLOY PHASE -\n./ship\n- INFO -\nrepo: /srv/git/app\n- BUILD PHASE -\nmake\n";
        let spec = parse_definition(text).unwrap();

        assert_eq!(spec.repository_url(), "/srv/git/app");
        assert_eq!(spec.build_steps(), &[Step::new("make", Vec::<String>::new())]);
        assert_eq!(spec.deploy_steps(), &[Step::new("./ship", Vec::<String>::new())]);
    }

    #[test]
    fn test_lines_before_markers_and_unknown_info_keys_are_ignored() {
        let text = "my pipeline\nrm -rf /\n- INFO -\nname: widgets\nrepo: https://example.com/w.git\nowner: ops\n";
        let spec = parse_definition(text).unwrap();

        assert_eq!(spec.repository_url(), "https://example.com/w.git");
        assert!(spec.build_steps().is_empty());
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let text = "\n- INFO -\n\n   \nrepo: https://example.com/w.git\n- BUILD PHASE -\n\n\t\nmake\n\n";
        let spec = parse_definition(text).unwrap();
        assert_eq!(spec.build_steps().len(), 1);
    }

    #[test]
    fn test_missing_info_section() {
        let text = "- BUILD PHASE -\nmake\n- DEPLOY PHASE -\n./ship\n";
        assert!(matches!(
            parse_definition(text),
            Err(DefinitionError::MissingRepository)
        ));
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(
            parse_definition(""),
            Err(DefinitionError::MissingRepository)
        ));
    }

    #[test]
    fn test_empty_repository_value() {
        let text = "- INFO -\nrepo:   \n";
        assert!(matches!(
            parse_definition(text),
            Err(DefinitionError::MissingRepository)
        ));
    }

    #[test]
    fn test_repo_line_without_separator_reports_line() {
        let text = "- INFO -\n\nrepo https://example.com/repo.git\n";
        match parse_definition(text) {
            Err(DefinitionError::MissingSeparator { line }) => assert_eq!(line, 3),
            other => panic!("expected MissingSeparator, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_repository_url() {
        let text = "- INFO -\nrepo: not a url\n";
        match parse_definition(text) {
            Err(DefinitionError::InvalidRepository { line, url }) => {
                assert_eq!(line, 2);
                assert_eq!(url, "not a url");
            }
            other => panic!("expected InvalidRepository, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_section() {
        let text = "- INFO -\nrepo: /srv/app\n- BUILD PHASE -\nmake\n- BUILD PHASE -\nmake test\n";
        match parse_definition(text) {
            Err(DefinitionError::DuplicateSection { line, section }) => {
                assert_eq!(line, 5);
                assert_eq!(section, Section::Build);
            }
            other => panic!("expected DuplicateSection, got {:?}", other),
        }
    }

    #[test]
    fn test_similar_info_keys_are_not_repo_lines() {
        let text = "- INFO -\nrepository: elsewhere\nrepo : /srv/app\n";
        let spec = parse_definition(text).unwrap();
        assert_eq!(spec.repository_url(), "/srv/app");
    }

    #[test]
    fn test_later_repo_line_wins() {
        let text = "- INFO -\nrepo: /srv/old\nrepo: /srv/new\n";
        let spec = parse_definition(text).unwrap();
        assert_eq!(spec.repository_url(), "/srv/new");
    }

    #[test]
    fn test_plausible_urls() {
        assert!(is_plausible_url("https://example.com/repo.git"));
        assert!(is_plausible_url("git+ssh://host/repo"));
        assert!(is_plausible_url("file:///srv/git/repo"));
        assert!(is_plausible_url("git@github.com:acme/widgets.git"));
        assert!(is_plausible_url("/srv/git/repo"));

        assert!(!is_plausible_url("https://"));
        assert!(!is_plausible_url("://host/repo"));
        assert!(!is_plausible_url("1http://host/repo"));
        assert!(!is_plausible_url("example.com/repo"));
        assert!(!is_plausible_url("host:repo"));
        assert!(!is_plausible_url("https://example.com/my repo"));
    }

    #[test]
    fn test_parse_definition_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.chief");
        std::fs::write(&path, "- INFO -\nrepo: /srv/app\n").unwrap();

        let spec = parse_definition_file(&path).unwrap();
        assert_eq!(spec.repository_url(), "/srv/app");

        let missing = parse_definition_file(dir.path().join("missing.chief"));
        assert!(matches!(missing, Err(DefinitionError::Io { .. })));
    }
}

//! On-disk naming convention for fixtures and their expected outputs.
//!
//! `<base>.in.json` is a fixture, `<base>.out.json` its generic expected
//! output and `<base>.<style>.out.json` a style-specific expected output.

use crate::domain::RegressError;
use globset::GlobBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const INPUT_SUFFIX: &str = ".in.json";
pub const OUTPUT_SUFFIX: &str = ".out.json";
pub const DEFAULT_FIXTURE_DIR: &str = "tests";
pub const DEFAULT_FIXTURE_GLOB: &str = "*.in.json";
pub const DEFAULT_REFERENCES_PATH: &str = "tests/references.json";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fixture {
    path: PathBuf,
}

impl Fixture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without the input suffix. A name lacking the suffix is
    /// used whole.
    pub fn base_name(&self) -> String {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        match file_name.strip_suffix(INPUT_SUFFIX) {
            Some(base) => base.to_string(),
            None => file_name,
        }
    }

    pub fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    pub fn generic_output_path(&self) -> PathBuf {
        self.path
            .with_file_name(format!("{}{}", self.base_name(), OUTPUT_SUFFIX))
    }
}

/// Files named `<base>.<anything>.out.json` next to the fixture, sorted.
///
/// An unreadable directory yields no matches.
pub fn style_specific_outputs(fixture: &Fixture) -> Vec<PathBuf> {
    let directory = fixture.directory();
    let prefix = format!("{}.", fixture.base_name());

    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(
                directory = %directory.display(),
                %error,
                "cannot list style-specific outputs"
            );
            return Vec::new();
        }
    };

    let mut matches = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let is_match = name.len() >= prefix.len() + OUTPUT_SUFFIX.len()
                && name.starts_with(&prefix)
                && name.ends_with(OUTPUT_SUFFIX);
            is_match.then(|| fixture.path.with_file_name(name))
        })
        .collect::<Vec<_>>();
    matches.sort();
    matches
}

/// The dot-separated segment immediately before the output suffix:
/// `basic.apa.out.json` gives `apa`, `basic.out.json` gives `basic`.
pub fn embedded_identifier(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(OUTPUT_SUFFIX)?;
    stem.rsplit('.')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to read fixture directory '{}': {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid fixture pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl From<DiscoveryError> for RegressError {
    fn from(error: DiscoveryError) -> Self {
        let message = error.to_string();
        match error {
            DiscoveryError::ReadDirectory { .. } => {
                RegressError::io_system("IO.FIXTURE_DISCOVERY", message)
            }
            DiscoveryError::InvalidGlob { .. } => {
                RegressError::input_validation("INPUT.FIXTURE_PATTERN", message)
            }
        }
    }
}

/// Fixtures in `directory` whose file name matches `pattern`, in
/// lexicographic order. A missing directory holds no fixtures.
pub fn discover_fixtures(directory: &Path, pattern: &str) -> Result<Vec<Fixture>, DiscoveryError> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| DiscoveryError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    if !directory.is_dir() {
        debug!(directory = %directory.display(), "fixture directory does not exist");
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(directory).map_err(|source| DiscoveryError::ReadDirectory {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut fixtures = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::ReadDirectory {
            path: directory.to_path_buf(),
            source,
        })?;
        let file_name = entry.file_name();
        if matcher.is_match(&file_name) && entry.path().is_file() {
            fixtures.push(Fixture::new(directory.join(file_name)));
        }
    }
    fixtures.sort();

    debug!(
        directory = %directory.display(),
        count = fixtures.len(),
        "discovered fixtures"
    );
    Ok(fixtures)
}

#[cfg(test)]
mod tests {
    use super::{Fixture, discover_fixtures, embedded_identifier, style_specific_outputs};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    #[test]
    fn generic_output_replaces_input_suffix() {
        let fixture = Fixture::new("tests/basic.in.json");
        assert_eq!(fixture.base_name(), "basic");
        assert_eq!(
            fixture.generic_output_path(),
            PathBuf::from("tests/basic.out.json")
        );
        assert_eq!(fixture.directory(), Path::new("tests"));
    }

    #[test]
    fn bare_fixture_name_lives_in_current_directory() {
        let fixture = Fixture::new("basic.apa.in.json");
        assert_eq!(fixture.directory(), Path::new("."));
        assert_eq!(
            fixture.generic_output_path(),
            PathBuf::from("basic.apa.out.json")
        );
    }

    #[test]
    fn embedded_identifier_is_segment_before_output_suffix() {
        assert_eq!(
            embedded_identifier(Path::new("tests/basic.apa.out.json")).as_deref(),
            Some("apa")
        );
        assert_eq!(
            embedded_identifier(Path::new("tests/basic.x.mla.out.json")).as_deref(),
            Some("mla")
        );
        assert_eq!(
            embedded_identifier(Path::new("tests/basic.out.json")).as_deref(),
            Some("basic")
        );
        assert_eq!(embedded_identifier(Path::new("tests/basic..out.json")), None);
        assert_eq!(embedded_identifier(Path::new("tests/basic.json")), None);
    }

    #[test]
    fn style_specific_outputs_match_base_name_and_sort() {
        let temp = TempDir::new().expect("tempdir should be created");
        for name in [
            "basic.in.json",
            "basic.mla.out.json",
            "basic.apa.out.json",
            "basic.out.json",
            "basically.apa.out.json",
            "other.apa.out.json",
        ] {
            fs::write(temp.path().join(name), "{}").expect("file should be written");
        }

        let fixture = Fixture::new(temp.path().join("basic.in.json"));
        let outputs = style_specific_outputs(&fixture);
        assert_eq!(
            outputs,
            vec![
                temp.path().join("basic.apa.out.json"),
                temp.path().join("basic.mla.out.json"),
            ]
        );
    }

    #[test]
    fn discovery_is_sorted_and_ignores_other_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        for name in [
            "zeta.in.json",
            "alpha.in.json",
            "alpha.out.json",
            "references.json",
        ] {
            fs::write(temp.path().join(name), "{}").expect("file should be written");
        }
        fs::create_dir(temp.path().join("nested.in.json")).expect("dir should be created");

        let fixtures =
            discover_fixtures(temp.path(), "*.in.json").expect("discovery should succeed");
        let names = fixtures
            .iter()
            .map(|fixture| fixture.base_name())
            .collect::<Vec<_>>();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn discovery_in_missing_directory_finds_nothing() {
        let temp = TempDir::new().expect("tempdir should be created");
        let fixtures = discover_fixtures(&temp.path().join("absent"), "*.in.json")
            .expect("discovery should succeed");
        assert!(fixtures.is_empty());
    }
}

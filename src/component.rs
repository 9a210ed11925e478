// src/component.rs

//! Components: names, versions and the source file set
//!
//! A component is a named, versioned bundle of files. In the source tree it
//! lives at `components/<Name>/` and holds a fixed set of logical files:
//!
//! | logical file    | required | installed as              |
//! |-----------------|----------|---------------------------|
//! | `component.php` | yes      | `<name-lowercased>.php`   |
//! | `styles.css`    | no       | `<Name>.css`              |
//! | `enhancer.js`   | no       | `<name-lowercased>.js`    |
//! | `example.php`   | no       | `example.php`             |
//! | `README.md`     | no       | `README.md`               |
//!
//! Inside archives and manifests every file lives under
//! `template-parts/components/<Name>/`.

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Root of component files inside archives and themes
pub const COMPONENTS_PREFIX: &str = "template-parts/components";

/// Longest accepted component name
const MAX_NAME_LEN: usize = 128;

/// Characters never accepted in names or versions
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

/// Archive path prefix for a component (`template-parts/components/<name>/`)
pub fn archive_prefix(name: &str) -> String {
    format!("{}/{}/", COMPONENTS_PREFIX, name)
}

fn check_segment(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", kind)));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(Error::InvalidInput(format!(
            "{} '{}' is longer than {} characters",
            kind, value, MAX_NAME_LEN
        )));
    }
    if value.contains("..") || value.contains("//") {
        return Err(Error::InvalidInput(format!(
            "{} '{}' contains a path traversal sequence",
            kind, value
        )));
    }
    if let Some(c) = value
        .chars()
        .find(|c| c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(Error::InvalidInput(format!(
            "{} '{}' contains forbidden character {:?}",
            kind,
            value.escape_debug(),
            c
        )));
    }
    Ok(())
}

/// Validate a component name for use as a registry path segment
pub fn validate_name(name: &str) -> Result<()> {
    check_segment("Component name", name)
}

/// Validate a published version string (must be a semantic version)
pub fn validate_version(version: &str) -> Result<semver::Version> {
    check_segment("Version", version)?;
    semver::Version::parse(version)
        .map_err(|e| {
            Error::InvalidInput(format!("Version '{}' is not a semantic version: {}", version, e))
        })
}

/// Version requested by the user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionRequest {
    /// Whatever the index marks as latest
    #[default]
    Latest,
    /// An exact published version
    Exact(String),
}

impl VersionRequest {
    /// Parse "latest" or an exact semantic version
    pub fn parse(input: &str) -> Result<Self> {
        if input.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        validate_version(input)?;
        Ok(Self::Exact(input.to_string()))
    }

    /// Whether a CLI argument looks like an exact version (`X.Y.Z`)
    pub fn looks_like_version(arg: &str) -> bool {
        let parts: Vec<&str> = arg.split('.').collect();
        parts.len() == 3
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    }
}

impl fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// The known files of a component source directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalFile {
    Component,
    Styles,
    Enhancer,
    Example,
    Readme,
}

impl LogicalFile {
    /// All logical files, in manifest/archive order
    pub const ALL: [LogicalFile; 5] = [
        LogicalFile::Component,
        LogicalFile::Styles,
        LogicalFile::Enhancer,
        LogicalFile::Example,
        LogicalFile::Readme,
    ];

    /// File name in the source tree and inside archives
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::Component => "component.php",
            Self::Styles => "styles.css",
            Self::Enhancer => "enhancer.js",
            Self::Example => "example.php",
            Self::Readme => "README.md",
        }
    }

    /// Only the primary template is mandatory
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::Component)
    }

    /// Look up a logical file by its source file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.file_name() == name)
    }

    /// File name this logical file is installed under for `component`
    pub fn dest_name(&self, component: &str) -> String {
        match self {
            Self::Component => format!("{}.php", component.to_lowercase()),
            Self::Styles => format!("{}.css", component),
            Self::Enhancer => format!("{}.js", component.to_lowercase()),
            Self::Example | Self::Readme => self.file_name().to_string(),
        }
    }
}

/// Destination file name for an archive-relative path
///
/// Known logical files are renamed; anything else keeps its relative path.
pub fn dest_file_name(component: &str, relative: &str) -> String {
    match LogicalFile::from_file_name(relative) {
        Some(logical) => logical.dest_name(component),
        None => relative.to_string(),
    }
}

/// One file of a component source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub logical: LogicalFile,
    pub content: Vec<u8>,
}

/// A component's file set, loaded into memory
///
/// Both the manifest and the archive are built from the same
/// `ComponentSource`, so they always agree on which files exist.
#[derive(Debug, Clone)]
pub struct ComponentSource {
    pub name: String,
    pub files: Vec<SourceFile>,
}

impl ComponentSource {
    /// Build a source from in-memory files
    ///
    /// Files are kept in `LogicalFile::ALL` order; unknown file names are
    /// ignored, the primary template is required.
    pub fn from_files<I, S>(name: &str, files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        validate_name(name)?;

        let mut by_logical: Vec<SourceFile> = Vec::new();
        for (file_name, content) in files {
            match LogicalFile::from_file_name(file_name.as_ref()) {
                Some(logical) => {
                    by_logical.retain(|f| f.logical != logical);
                    by_logical.push(SourceFile { logical, content });
                }
                None => debug!("Ignoring unknown file {} in {}", file_name.as_ref(), name),
            }
        }

        let files: Vec<SourceFile> = LogicalFile::ALL
            .iter()
            .filter_map(|l| by_logical.iter().find(|f| f.logical == *l).cloned())
            .collect();

        let source = Self {
            name: name.to_string(),
            files,
        };
        source.check_required()?;
        Ok(source)
    }

    /// Load a component from its source directory (`components/<Name>`)
    ///
    /// The directory name is the component name.
    pub fn load(dir: &Path) -> Result<Self> {
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("Bad component directory: {}", dir.display()))
            })?;

        let mut files = Vec::new();
        for logical in LogicalFile::ALL {
            let path = dir.join(logical.file_name());
            if path.is_file() {
                let content = fs::read(&path).map_err(|e| {
                    Error::IoError(format!("Failed to read {}: {}", path.display(), e))
                })?;
                files.push((logical.file_name(), content));
            }
        }

        Self::from_files(name, files)
    }

    fn check_required(&self) -> Result<()> {
        for logical in LogicalFile::ALL.iter().filter(|l| l.is_required()) {
            if self.get(*logical).is_none() {
                return Err(Error::MissingSourceFile {
                    component: self.name.clone(),
                    file: logical.file_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Content of a logical file, if present
    pub fn get(&self, logical: LogicalFile) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|f| f.logical == logical)
            .map(|f| f.content.as_slice())
    }

    /// Description from the first `# ` heading of the README
    pub fn description(&self) -> String {
        self.get(LogicalFile::Readme)
            .and_then(|readme| {
                String::from_utf8_lossy(readme)
                    .lines()
                    .find_map(|line| line.strip_prefix("# ").map(|t| t.trim().to_string()))
                    .filter(|t| !t.is_empty())
            })
            .unwrap_or_else(|| format!("{} component for WordPress", self.name))
    }
}

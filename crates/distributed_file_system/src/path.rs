//! Paths inside the file system.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Path of a file or directory in the file system.
///
/// The path is kept exactly as it was given, so that callers which derive
/// experiment metadata from it see the same text the user typed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DfsPath(String);

impl DfsPath {
    /// Creates new path.
    pub fn new(path: impl Into<String>) -> Self {
        DfsPath(path.into())
    }

    /// Path as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text after the last `/`, or the whole path if it has none.
    /// A path ending with `/` has an empty last segment.
    pub fn last_segment(&self) -> &str {
        match self.0.rfind('/') {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        }
    }

    /// Appends a child name.
    pub fn join(&self, child: &str) -> DfsPath {
        if self.0.ends_with('/') {
            DfsPath(format!("{}{}", self.0, child))
        } else {
            DfsPath(format!("{}/{}", self.0, child))
        }
    }
}

impl fmt::Display for DfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DfsPath {
    fn from(path: &str) -> Self {
        DfsPath::new(path)
    }
}

impl From<String> for DfsPath {
    fn from(path: String) -> Self {
        DfsPath(path)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a particular version of an input file.
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSignature {
    /// Hex encoded hash of the file content.
    pub content_hash : String,
    /// Modification time in whole seconds since the UNIX epoch.
    pub modified_at  : i64,
}

impl fmt::Display for FileSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.content_hash, self.modified_at)
    }
}

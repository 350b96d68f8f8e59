use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};

/// A normalized address that is used as lookup key
/// for the geocode cache and the geocoding services.
///
/// Two raw addresses that normalize to the same key
/// always resolve to the same position.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for CanonicalKey {
    fn from(from: String) -> Self {
        Self(from)
    }
}

impl From<&str> for CanonicalKey {
    fn from(from: &str) -> Self {
        Self(from.to_owned())
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CanonicalKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use crate::signature::FileSignature;
use serde::{Deserialize, Serialize};

/// Why a resolution batch has been started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Requested explicitly by the user.
    Explicit,
    /// Started automatically because the input changed
    /// or has not been processed completely.
    Auto,
}

/// Remembers which input has been processed last.
///
/// Owned by the caller and passed into every resolution
/// decision instead of being kept in a global.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub signature: Option<FileSignature>,
    pub done: bool,
}

impl SessionState {
    pub fn mark_done(&mut self, signature: FileSignature) {
        self.signature = Some(signature);
        self.done = true;
    }
}

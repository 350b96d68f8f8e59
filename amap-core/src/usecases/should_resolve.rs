use super::prelude::*;

/// Decides if (and why) a network resolution should run for an input.
///
/// An explicit request always wins. Otherwise an automatic run
/// only happens for a new input or if the previous run for the
/// same input did not complete.
pub fn resolution_trigger(
    signature: &FileSignature,
    explicit: bool,
    auto_enabled: bool,
    last: &SessionState,
) -> Option<Trigger> {
    if explicit {
        return Some(Trigger::Explicit);
    }
    let changed = last.signature.as_ref() != Some(signature);
    (auto_enabled && (changed || !last.done)).then_some(Trigger::Auto)
}

/// A single resolution run for one version of an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionSession {
    pub signature: FileSignature,
    pub trigger: Trigger,
}

impl ResolutionSession {
    /// Starts a session if the trigger policy asks for it.
    pub fn start(
        signature: FileSignature,
        explicit: bool,
        auto_enabled: bool,
        last: &SessionState,
    ) -> Option<Self> {
        let trigger = resolution_trigger(&signature, explicit, auto_enabled, last)?;
        Some(Self { signature, trigger })
    }
}

pub fn should_resolve(
    signature: &FileSignature,
    explicit: bool,
    auto_enabled: bool,
    last: &SessionState,
) -> bool {
    resolution_trigger(signature, explicit, auto_enabled, last).is_some()
}

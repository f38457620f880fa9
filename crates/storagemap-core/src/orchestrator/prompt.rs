/// The name-confirmation seam between the orchestrator and a human.
use crate::model::VolumeRecord;
use crate::naming::{NamingPool, Tier};

/// What the prompt is asked to decide for one NEW volume.
#[derive(Debug)]
pub struct NameRequest<'a> {
    pub volume: &'a VolumeRecord,
    pub tier: Tier,
    /// `None` when every candidate in `tier` is taken; a custom name is
    /// then the only way forward.
    pub proposed: Option<&'a str>,
    /// Lets the prompt reject a custom name that is already taken before
    /// handing it back.
    pub pool: &'a NamingPool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameDecision {
    Accept,
    Custom(String),
    Skip,
}

impl NameDecision {
    /// Interpret one line typed at the prompt: empty accepts, anything else
    /// is a custom name.
    pub fn from_response(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Accept
        } else {
            Self::Custom(line.to_string())
        }
    }
}

/// Asks for (or decides) the name of a newly detected volume.
pub trait NamePrompt {
    fn resolve_name(&mut self, request: &NameRequest<'_>) -> NameDecision;
}

/// Non-interactive prompt: take every proposal, skip exhausted tiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAcceptPrompt;

impl NamePrompt for AutoAcceptPrompt {
    fn resolve_name(&mut self, request: &NameRequest<'_>) -> NameDecision {
        if request.proposed.is_some() {
            NameDecision::Accept
        } else {
            NameDecision::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response() {
        assert_eq!(NameDecision::from_response(""), NameDecision::Accept);
        assert_eq!(NameDecision::from_response("  \n"), NameDecision::Accept);
        assert_eq!(
            NameDecision::from_response(" Bifrost\n"),
            NameDecision::Custom("Bifrost".to_string())
        );
    }
}

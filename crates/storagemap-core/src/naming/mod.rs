/// Capacity-tiered name assignment.
///
/// A volume's capacity picks one tier; the first candidate in that tier's
/// list that nobody has used yet is proposed. Tiers never borrow from one
/// another: an exhausted tier yields [`NamingError::NoAvailableNames`] and
/// the caller has to get a name some other way.
use crate::error::NamingError;
use crate::model::size::bytes_to_tb;
use crate::registry::RegistryStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Capacity bracket that selects a candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Large,
    Medium,
    Small,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Large => "large",
            Self::Medium => "medium",
            Self::Small => "small",
        })
    }
}

/// Tier thresholds (binary TB) and the ordered candidate lists.
///
/// Field names match the on-disk `naming_rules.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingRules {
    pub large_drive_threshold_tb: f64,
    pub medium_drive_threshold_tb: f64,
    pub large_names: Vec<String>,
    pub medium_names: Vec<String>,
    pub small_names: Vec<String>,
}

impl Default for NamingRules {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            large_drive_threshold_tb: 4.0,
            medium_drive_threshold_tb: 1.5,
            large_names: names(&[
                "Asgard", "Xandar", "Sakaar", "Knowhere", "Wakanda", "Titan", "Vormir",
                "Ego", "Hala", "Nidavellir",
            ]),
            medium_names: names(&[
                "Stark", "Rogers", "Banner", "Romanoff", "Barton", "Wilson", "Maximoff",
                "Parker", "Strange", "Danvers", "Lang", "Shuri",
            ]),
            small_names: names(&[
                "Groot", "Rocket", "Jarvis", "Friday", "Karen", "Dum-E", "Morgan", "Wong",
                "Happy", "Pepper", "Hope", "Ned",
            ]),
        }
    }
}

impl NamingRules {
    /// Which tier `capacity_bytes` falls into.
    pub fn tier_for(&self, capacity_bytes: u64) -> Tier {
        let tb = bytes_to_tb(capacity_bytes);
        if tb >= self.large_drive_threshold_tb {
            Tier::Large
        } else if tb >= self.medium_drive_threshold_tb {
            Tier::Medium
        } else {
            Tier::Small
        }
    }

    /// Candidate list for one tier, in proposal order.
    pub fn candidates(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Large => &self.large_names,
            Tier::Medium => &self.medium_names,
            Tier::Small => &self.small_names,
        }
    }

    /// Problems that make these rules unusable, if any.
    pub fn validate(&self) -> Result<(), String> {
        let (large, medium) = (self.large_drive_threshold_tb, self.medium_drive_threshold_tb);
        if !(medium > 0.0 && large > medium) {
            return Err(format!(
                "thresholds must satisfy 0 < medium ({medium}) < large ({large})"
            ));
        }
        for tier in [Tier::Large, Tier::Medium, Tier::Small] {
            for name in self.candidates(tier) {
                if let Some(reason) = id_problem(name) {
                    return Err(format!("{tier} name {name:?} cannot be used as an id: {reason}"));
                }
            }
        }
        Ok(())
    }
}

/// Normalise a name to the id form the registry keys on.
pub fn normalise_id(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Characters that cannot appear in a file name on at least one platform.
const FORBIDDEN_IN_FILE_NAMES: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Why `name` cannot become an id, if it cannot.
///
/// Ids are embedded verbatim in snapshot file names, so an id must be a
/// single portable path component.
pub fn id_problem(name: &str) -> Option<&'static str> {
    let id = normalise_id(name);
    if id.is_empty() {
        return Some("it is empty after trimming");
    }
    if id.chars().any(|c| c.is_control() || FORBIDDEN_IN_FILE_NAMES.contains(&c)) {
        return Some("it contains a path separator or a character not allowed in file names");
    }
    if id.starts_with('.') || id.ends_with('.') {
        return Some("it starts or ends with '.'");
    }
    let stem = id.split('.').next().unwrap_or_default();
    let numbered_device = stem.len() == 4
        && (stem.starts_with("COM") || stem.starts_with("LPT"))
        && stem.as_bytes()[3].is_ascii_digit();
    if matches!(stem, "CON" | "PRN" | "AUX" | "NUL") || numbered_device {
        return Some("it is a reserved device name on Windows");
    }
    None
}

/// Candidate pools plus every name ever handed out.
///
/// Built once per run from the registry and threaded through the
/// orchestrator; [`reserve`](Self::reserve) must be called as soon as a new
/// volume is registered so the next proposal in the same run skips it.
#[derive(Debug, Clone)]
pub struct NamingPool {
    rules: NamingRules,
    /// Normalised (upper-case) names already assigned to some volume.
    used: BTreeSet<String>,
}

impl NamingPool {
    pub fn new(rules: NamingRules, used: impl IntoIterator<Item = String>) -> Self {
        Self {
            rules,
            used: used.into_iter().map(|n| normalise_id(&n)).collect(),
        }
    }

    /// Seed the used set from every identity in the registry.
    pub fn from_registry(rules: NamingRules, registry: &RegistryStore) -> Self {
        Self::new(rules, registry.identities().map(|e| e.id.clone()))
    }

    pub fn tier_for(&self, capacity_bytes: u64) -> Tier {
        self.rules.tier_for(capacity_bytes)
    }

    /// Next unused candidate for a volume of this capacity.
    ///
    /// Deterministic: the same used set and capacity always give the same
    /// answer.
    pub fn propose(&self, capacity_bytes: u64) -> Result<String, NamingError> {
        let tier = self.tier_for(capacity_bytes);
        self.rules
            .candidates(tier)
            .iter()
            .find(|name| !self.is_used(name))
            .cloned()
            .ok_or(NamingError::NoAvailableNames { tier })
    }

    /// Whether `name` (in any case) is already assigned.
    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(&normalise_id(name))
    }

    /// Mark `name` as taken. Returns `false` if it already was.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.used.insert(normalise_id(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TB: u64 = 1_099_511_627_776;

    #[test]
    fn test_tier_boundaries() {
        let rules = NamingRules::default();
        assert_eq!(rules.tier_for(5 * TB), Tier::Large);
        assert_eq!(rules.tier_for(4 * TB), Tier::Large);
        assert_eq!(rules.tier_for(4 * TB - 1), Tier::Medium);
        assert_eq!(rules.tier_for(3 * TB / 2), Tier::Medium);
        assert_eq!(rules.tier_for(3 * TB / 2 - 1), Tier::Small);
        assert_eq!(rules.tier_for(64_000_000_000), Tier::Small);
    }

    #[test]
    fn test_id_problem() {
        assert_eq!(id_problem("Asgard"), None);
        assert_eq!(id_problem(" Dum-E "), None);
        assert_eq!(id_problem("Con.Air"), Some("it is a reserved device name on Windows"));
        assert!(id_problem("").is_some());
        assert!(id_problem("../up").is_some());
        assert!(id_problem("a\\b").is_some());
        assert!(id_problem("tab\there").is_some());
        assert!(id_problem("lpt9").is_some());
        assert_eq!(id_problem("LPTX"), None);
    }

    #[test]
    fn test_validate_rejects_unsafe_candidates() {
        assert!(NamingRules::default().validate().is_ok());
        let rules = NamingRules {
            medium_names: vec!["Stark".into(), "Star/Lord".into()],
            ..NamingRules::default()
        };
        let err = rules.validate().unwrap_err();
        assert!(err.contains("Star/Lord"));
    }

    #[test]
    fn test_first_candidate_when_nothing_used() {
        let pool = NamingPool::new(NamingRules::default(), Vec::new());
        assert_eq!(pool.propose(5 * TB).unwrap(), "Asgard");
    }

    #[test]
    fn test_proposal_is_deterministic() {
        let a = NamingPool::new(NamingRules::default(), vec!["Asgard".to_string()]);
        let b = NamingPool::new(NamingRules::default(), vec!["Asgard".to_string()]);

        let first = a.propose(5 * TB).unwrap();
        let second = b.propose(5 * TB).unwrap();
        assert_eq!(first, "Xandar");
        assert_eq!(first, second);
        // Proposing does not consume anything.
        assert_eq!(a.propose(5 * TB).unwrap(), "Xandar");
    }

    #[test]
    fn test_used_names_compare_case_insensitively() {
        let pool = NamingPool::new(NamingRules::default(), vec!["ASGARD".to_string()]);
        assert!(pool.is_used("asgard"));
        assert_eq!(pool.propose(5 * TB).unwrap(), "Xandar");
    }

    #[test]
    fn test_reserve_advances_proposal() {
        let mut pool = NamingPool::new(NamingRules::default(), Vec::new());
        let name = pool.propose(TB).unwrap();
        assert_eq!(name, "Groot");
        assert!(pool.reserve(&name));
        assert!(!pool.reserve("groot"));
        assert_eq!(pool.propose(TB).unwrap(), "Rocket");
    }

    #[test]
    fn test_exhausted_tier_does_not_fall_back() {
        let rules = NamingRules {
            large_names: vec!["Asgard".into()],
            ..NamingRules::default()
        };
        let pool = NamingPool::new(rules, vec!["Asgard".to_string()]);

        match pool.propose(5 * TB) {
            Err(NamingError::NoAvailableNames { tier }) => assert_eq!(tier, Tier::Large),
            other => panic!("expected NoAvailableNames, got {other:?}"),
        }
        // Other tiers are unaffected.
        assert_eq!(pool.propose(2 * TB).unwrap(), "Stark");
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(NamingRules::default().validate().is_ok());
        let inverted = NamingRules {
            large_drive_threshold_tb: 1.0,
            medium_drive_threshold_tb: 2.0,
            ..NamingRules::default()
        };
        assert!(inverted.validate().is_err());
    }
}

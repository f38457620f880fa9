//! Interactive name confirmation over a terminal.

use std::io::{BufRead, Write};
use storagemap_core::model::size::{format_size, format_tb};
use storagemap_core::naming::id_problem;
use storagemap_core::orchestrator::{NameDecision, NamePrompt, NameRequest};

/// Asks the operator to confirm or replace each proposed name.
///
/// Empty input accepts the proposal; anything else is taken as a custom
/// name and re-asked if that name is already assigned or cannot be an id.
/// End of input, or a blank answer when no proposal exists, skips the
/// volume.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, request: &NameRequest<'_>) -> std::io::Result<NameDecision> {
        let volume = request.volume;
        let label = if volume.volume_name.is_empty() {
            volume.device_identifier.as_str()
        } else {
            volume.volume_name.as_str()
        };
        writeln!(self.output)?;
        writeln!(
            self.output,
            "New volume {label} ({}) at {}",
            volume.volume_uuid,
            volume.mount_point.display()
        )?;
        writeln!(
            self.output,
            "  capacity {} ({}), {} tier",
            format_size(volume.capacity_bytes),
            format_tb(volume.capacity_bytes),
            request.tier
        )?;

        loop {
            match request.proposed {
                Some(name) => write!(
                    self.output,
                    "Proposed name: {name}. Press Enter to accept or type another name: "
                )?,
                None => write!(
                    self.output,
                    "Every {} name is taken. Type a name (Enter to skip): ",
                    request.tier
                )?,
            }
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(NameDecision::Skip);
            }

            match NameDecision::from_response(&line) {
                NameDecision::Accept if request.proposed.is_none() => {
                    return Ok(NameDecision::Skip)
                }
                NameDecision::Custom(name) => {
                    if request.pool.is_used(&name) {
                        writeln!(self.output, "{name} is already assigned to another volume.")?;
                    } else if let Some(reason) = id_problem(&name) {
                        writeln!(self.output, "{name} cannot be used: {reason}.")?;
                    } else {
                        return Ok(NameDecision::Custom(name));
                    }
                }
                decision => return Ok(decision),
            }
        }
    }
}

impl<R: BufRead, W: Write> NamePrompt for TerminalPrompt<R, W> {
    fn resolve_name(&mut self, request: &NameRequest<'_>) -> NameDecision {
        match self.ask(request) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!("Name prompt failed for {}: {e}", request.volume.volume_uuid);
                NameDecision::Skip
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;
    use storagemap_core::model::VolumeRecord;
    use storagemap_core::naming::{NamingPool, NamingRules, Tier};

    fn volume() -> VolumeRecord {
        VolumeRecord {
            device_identifier: "sdb1".into(),
            volume_uuid: "1234".into(),
            volume_name: "Backup".into(),
            mount_point: PathBuf::from("/media/backup"),
            capacity_bytes: 5 * 1_099_511_627_776,
            free_bytes: 0,
            file_system: "exfat".into(),
        }
    }

    fn decide(input: &str, proposed: Option<&str>, pool: &NamingPool) -> (NameDecision, String) {
        let volume = volume();
        let mut output = Vec::new();
        let decision = TerminalPrompt::new(Cursor::new(input.as_bytes()), &mut output)
            .resolve_name(&NameRequest {
                volume: &volume,
                tier: Tier::Large,
                proposed,
                pool,
            });
        (decision, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_enter_accepts_proposal() {
        let pool = NamingPool::new(NamingRules::default(), Vec::new());
        let (decision, output) = decide("\n", Some("Asgard"), &pool);
        assert_eq!(decision, NameDecision::Accept);
        assert!(output.contains("Proposed name: Asgard"));
        assert!(output.contains("5.00 TB"));
    }

    #[test]
    fn test_taken_name_is_asked_again() {
        let pool = NamingPool::new(NamingRules::default(), vec!["Bifrost".to_string()]);
        let (decision, output) = decide("bifrost\nHeimdall\n", Some("Asgard"), &pool);
        assert_eq!(decision, NameDecision::Custom("Heimdall".to_string()));
        assert!(output.contains("bifrost is already assigned"));
    }

    #[test]
    fn test_unsafe_name_is_asked_again() {
        let pool = NamingPool::new(NamingRules::default(), Vec::new());
        let (decision, output) = decide("../up\nHeimdall\n", Some("Asgard"), &pool);
        assert_eq!(decision, NameDecision::Custom("Heimdall".to_string()));
        assert!(output.contains("../up cannot be used"));
    }

    #[test]
    fn test_blank_without_proposal_skips() {
        let pool = NamingPool::new(NamingRules::default(), Vec::new());
        let (decision, output) = decide("\n", None, &pool);
        assert_eq!(decision, NameDecision::Skip);
        assert!(output.contains("Every large name is taken"));
    }

    #[test]
    fn test_end_of_input_skips() {
        let pool = NamingPool::new(NamingRules::default(), Vec::new());
        let (decision, _) = decide("", Some("Asgard"), &pool);
        assert_eq!(decision, NameDecision::Skip);
    }
}

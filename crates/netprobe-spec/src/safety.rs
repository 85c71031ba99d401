//! Blocked-keyword safety gate.
//!
//! The gate runs immediately before every command is sent, not only when the
//! command set is loaded: expanded commands only exist after substitution, and
//! a blocked term may appear only then. A hit is never recovered from; the
//! caller aborts the whole run.

use thiserror::Error;

use crate::command_set::CommandSet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("blocked keyword '{keyword}' detected in command: {command}")]
pub struct BlockedKeyword {
    pub keyword: String,
    pub command: String,
}

/// Case-insensitive substring check of `command` against every blocked term.
///
/// Returns the first matching term in policy order.
pub fn check_command(command: &str, blocked: &[String]) -> Result<(), BlockedKeyword> {
    let lowered = command.to_lowercase();
    for keyword in blocked {
        let needle = keyword.to_lowercase();
        if needle.is_empty() {
            continue;
        }
        if lowered.contains(&needle) {
            return Err(BlockedKeyword {
                keyword: keyword.clone(),
                command: command.to_string(),
            });
        }
    }
    Ok(())
}

/// Static audit of a command set: every paging command and every raw template
/// is run through the gate before anything connects.
///
/// Passing the audit does not make the runtime gate redundant, since a blocked
/// term can still appear once a placeholder is rendered.
pub fn audit_command_set(set: &CommandSet) -> Result<(), BlockedKeyword> {
    let blocked = &set.safety.blocked_keywords;
    for command in set.transport.paging_disable() {
        check_command(command, blocked)?;
    }
    for category in &set.commands {
        for entry in &category.entries {
            check_command(&entry.command, blocked)?;
        }
    }
    Ok(())
}

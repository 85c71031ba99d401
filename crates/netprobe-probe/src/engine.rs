//! Execution engine.
//!
//! Drives one category at a time against a session. Every execution is
//! `gate -> flush -> send (settle) -> classify -> persist`, exactly once, with
//! no retries.
//!
//! The expansion category (see [`ExpansionRule`]) runs in two phases:
//!
//! 1. **discovery**: every template without the placeholder, in declared order.
//!    The first successful run of the summary command seeds the entity ids.
//! 2. **expansion**: every placeholder template, for every id in discovery
//!    order. Skipped entirely when discovery found nothing.

use std::time::Instant;

use netprobe_spec::{check_command, content_hash, CommandCategory, CommandTemplate};
use tracing::{debug, info, warn};

use crate::attempt::{Artifact, AttemptStatus, CommandAttempt};
use crate::config::{ExpansionRule, ProbeConfig};
use crate::error::ProbeError;
use crate::expansion::{discover_entity_ids, ArtifactKind};
use crate::session::Session;
use crate::store::ArtifactStore;

/// Attempts and artifacts produced by one category, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRun {
    pub category: String,
    pub attempts: Vec<CommandAttempt>,
    pub artifacts: Vec<Artifact>,
    /// Ids seeded by the summary command (expansion category only).
    pub discovered_ids: Vec<u32>,
}

impl CategoryRun {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            ..Default::default()
        }
    }
}

/// A category stopped by a fatal error, with what it completed before.
#[derive(Debug)]
pub struct CategoryAbort {
    pub error: ProbeError,
    pub partial: CategoryRun,
}

pub struct Engine<'a> {
    session: &'a mut dyn Session,
    store: &'a mut ArtifactStore,
    blocked: &'a [String],
    config: &'a ProbeConfig,
}

impl<'a> Engine<'a> {
    pub fn new(
        session: &'a mut dyn Session,
        store: &'a mut ArtifactStore,
        blocked: &'a [String],
        config: &'a ProbeConfig,
    ) -> Self {
        Self {
            session,
            store,
            blocked,
            config,
        }
    }

    /// Send paging-suppression commands. Output is discarded; no artifacts.
    pub fn disable_paging(&mut self, commands: &[&str]) -> Result<(), ProbeError> {
        let options = self.config.paging_options();
        for command in commands {
            check_command(command, self.blocked)?;
            match self.session.send(command, &options) {
                Ok(out) => debug!(command, bytes = out.len(), "paging command sent"),
                Err(e) if e.is_fatal() => return Err(ProbeError::Transport(e)),
                Err(e) => warn!(command, error = %e, "paging command failed"),
            }
        }
        Ok(())
    }

    pub fn run_category(&mut self, category: &CommandCategory) -> Result<CategoryRun, CategoryAbort> {
        let mut run = CategoryRun::new(&category.name);
        let templates: Vec<CommandTemplate> = category
            .entries
            .iter()
            .map(|e| CommandTemplate::new(e.command.as_str()))
            .collect();

        let rule = &self.config.expansion;
        let expands = category.name == rule.category
            && templates.iter().any(|t| t.has_placeholder(&rule.placeholder));

        let result = if expands {
            self.run_expansion(&templates, &mut run)
        } else {
            self.run_default(&templates, &mut run)
        };

        match result {
            Ok(()) => {
                info!(
                    category = %run.category,
                    attempts = run.attempts.len(),
                    succeeded = run.attempts.iter().filter(|a| a.status.is_success()).count(),
                    "category complete"
                );
                Ok(run)
            }
            Err(error) => Err(CategoryAbort {
                error,
                partial: run,
            }),
        }
    }

    fn run_default(
        &mut self,
        templates: &[CommandTemplate],
        run: &mut CategoryRun,
    ) -> Result<(), ProbeError> {
        for (i, template) in templates.iter().enumerate() {
            self.execute(run, i + 1, template.as_str(), ArtifactKind::Sequential)?;
        }
        Ok(())
    }

    fn run_expansion(
        &mut self,
        templates: &[CommandTemplate],
        run: &mut CategoryRun,
    ) -> Result<(), ProbeError> {
        let rule: ExpansionRule = self.config.expansion.clone();
        let mut index = 1usize;
        let mut seeded = false;

        for template in templates.iter().filter(|t| !t.has_placeholder(&rule.placeholder)) {
            let command = template.as_str();
            let summary = rule.is_summary(command);
            // A candidate only keeps the summary name if it succeeds; see `execute`.
            let kind = if summary && !seeded {
                ArtifactKind::Summary
            } else {
                ArtifactKind::Sequential
            };
            let attempt = self.execute(run, index, command, kind)?;
            if summary && !seeded && attempt.status.is_success() {
                run.discovered_ids = discover_entity_ids(&attempt.output);
                seeded = true;
                info!(
                    category = %run.category,
                    ids = ?run.discovered_ids,
                    "entity ids discovered"
                );
            }
            index += 1;
        }

        if run.discovered_ids.is_empty() {
            warn!(category = %run.category, "no entity ids discovered; expansion skipped");
            return Ok(());
        }

        let ids = run.discovered_ids.clone();
        for template in templates.iter().filter(|t| t.has_placeholder(&rule.placeholder)) {
            for id in &ids {
                let rendered = template.render(&rule.placeholder, &id.to_string());
                let kind = ArtifactKind::for_rendered(&rule, &rendered, *id);
                self.execute(run, index, &rendered, kind)?;
                index += 1;
            }
        }
        Ok(())
    }

    /// Execute one rendered command and record it. Returns a copy of the
    /// recorded attempt.
    fn execute(
        &mut self,
        run: &mut CategoryRun,
        attempt_index: usize,
        command: &str,
        kind: ArtifactKind,
    ) -> Result<CommandAttempt, ProbeError> {
        check_command(command, self.blocked)?;

        std::thread::sleep(self.config.flush_delay());
        if let Err(e) = self.session.flush() {
            if e.is_fatal() {
                return Err(ProbeError::Transport(e));
            }
            warn!(command, error = %e, "flush failed; continuing");
        }

        let options = self.config.send_options();
        let started = Instant::now();
        let result = self.session.send(command, &options);
        let duration_ms = started.elapsed().as_millis() as u64;

        let (status, output, error) = match result {
            Ok(bytes) => (AttemptStatus::classify(&bytes), bytes, None),
            Err(e) if e.is_fatal() => return Err(ProbeError::Transport(e)),
            Err(e) => {
                let message = e.to_string();
                (AttemptStatus::Failed, message.clone().into_bytes(), Some(message))
            }
        };

        // The summary name belongs to the attempt that seeds the ids.
        let kind = match kind {
            ArtifactKind::Summary if !status.is_success() => ArtifactKind::Sequential,
            other => other,
        };
        let stem = kind.stem(&self.config.expansion, &run.category, attempt_index);
        let file_name = self.store.claim(&stem, attempt_index);
        let artifact_path = self.store.write(&file_name, &output)?;
        let checksum = content_hash(&output);

        debug!(
            command,
            status = status.as_str(),
            duration_ms,
            artifact = %artifact_path,
            "attempt recorded"
        );

        let attempt = CommandAttempt {
            command: command.to_string(),
            category: run.category.clone(),
            attempt_index,
            status,
            duration_ms,
            error,
            artifact_path: artifact_path.clone(),
            output,
        };
        run.artifacts.push(Artifact {
            path: artifact_path,
            category: run.category.clone(),
            command: command.to_string(),
            checksum,
            status,
            duration_ms,
        });
        run.attempts.push(attempt.clone());
        Ok(attempt)
    }
}

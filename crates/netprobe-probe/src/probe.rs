//! One complete evidence-capture run against one device.

use std::path::PathBuf;

use netprobe_spec::CommandSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{ProbeConfig, Target};
use crate::engine::{CategoryAbort, Engine};
use crate::error::ProbeError;
use crate::manifest::{RunManifest, RunManifestBuilder};
use crate::session::{Connector, Session};
use crate::store::ArtifactStore;

#[derive(Debug)]
pub struct ProbeRun {
    pub manifest: RunManifest,
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
}

/// Connect, suppress paging, run every category in declaration order,
/// disconnect, then write the run manifest.
///
/// Failure modes:
/// - connect fails: nothing is written at all.
/// - a blocked keyword is hit: the run stops before that command is sent and
///   no manifest of any kind is written.
/// - the session is lost: a partial manifest is written next to the
///   artifacts already captured, and `TransportLost` names it.
pub fn run_probe(
    connector: &dyn Connector,
    command_set: &CommandSet,
    target: &Target,
    config: &ProbeConfig,
) -> Result<ProbeRun, ProbeError> {
    let run_id = Uuid::new_v4();
    info!(%run_id, host = %target.host, port = target.port, "starting probe");

    let mut session = connector.connect(target).map_err(ProbeError::Transport)?;

    let run_dir = config.output_root.join(run_id.to_string());
    let mut store = ArtifactStore::create(&run_dir)?;
    let mut builder = RunManifestBuilder::new(
        run_id,
        target.clone(),
        config,
        command_set.safety.clone(),
    );

    let outcome = capture(
        session.as_mut(),
        &mut store,
        &mut builder,
        command_set,
        config,
    );

    match outcome {
        Ok(()) => {
            close(session.as_mut(), run_id, "complete run");
            let manifest = builder.finalize();
            let manifest_path = manifest.write(&run_dir)?;
            info!(
                %run_id,
                attempts = manifest.attempts.len(),
                manifest = %manifest_path.display(),
                "probe complete"
            );
            Ok(ProbeRun {
                manifest,
                run_dir,
                manifest_path,
            })
        }
        Err(ProbeError::Blocked(hit)) => {
            error!(%run_id, keyword = %hit.keyword, command = %hit.command, "blocked keyword; run aborted");
            close(session.as_mut(), run_id, "blocked keyword");
            Err(ProbeError::Blocked(hit))
        }
        Err(ProbeError::Transport(source)) => {
            error!(%run_id, error = %source, "session lost; writing partial manifest");
            let manifest = builder.finalize_partial(source.to_string());
            let partial_manifest = manifest.write(&run_dir)?;
            Err(ProbeError::TransportLost {
                source,
                partial_manifest,
            })
        }
        Err(other) => {
            close(session.as_mut(), run_id, "aborted run");
            Err(other)
        }
    }
}

fn close(session: &mut dyn Session, run_id: Uuid, after: &str) {
    if let Err(e) = session.disconnect() {
        warn!(%run_id, error = %e, after, "disconnect failed");
    }
}

fn capture(
    session: &mut dyn Session,
    store: &mut ArtifactStore,
    builder: &mut RunManifestBuilder,
    command_set: &CommandSet,
    config: &ProbeConfig,
) -> Result<(), ProbeError> {
    let blocked = &command_set.safety.blocked_keywords;
    let mut engine = Engine::new(session, store, blocked, config);

    engine.disable_paging(&command_set.transport.paging_disable())?;

    for category in &command_set.commands {
        match engine.run_category(category) {
            Ok(run) => builder.record(run),
            Err(CategoryAbort { error, partial }) => {
                builder.record(partial);
                return Err(error);
            }
        }
    }
    Ok(())
}

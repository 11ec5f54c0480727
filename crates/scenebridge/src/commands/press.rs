//! `press`: request a write on a command leaf and show the outcome.

use std::time::Duration;

use tracing::info;

use scenebridge_config::Config;
use scenebridge_core::{StatePath, StateStore};

use super::{Session, SETTLE, output_format, tree};
use crate::cli::{GlobalOpts, PressArgs, SceneAction};
use crate::error::CliError;
use crate::output;

/// Resolve the leaf a press targets within a bound session.
pub fn target_path(session: &Session, scene: &str, action: SceneAction) -> Result<StatePath, CliError> {
    let scene = session.find_scene(scene)?;
    let paths = session.paths_for(scene)?;
    Ok(match action {
        SceneAction::Run => paths.run,
        SceneAction::Stop => paths.stop,
    })
}

/// Issue a requested (unacknowledged) write, as an external UI would.
pub async fn request(session: &Session, path: &StatePath, value: bool) -> Result<(), CliError> {
    session.store.write_requested(path, value.into()).await?;
    info!(%path, value, "write requested");
    Ok(())
}

pub async fn handle(args: PressArgs, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::start(config).await?;
    let path = target_path(&session, &args.scene, args.action)?;

    request(&session, &path, args.value).await?;
    tokio::time::sleep(config.action_delay() + Duration::from_millis(args.wait_ms) + SETTLE).await;
    if let Some(state) = session.store.get_state(&path).await? {
        info!(%path, val = %state.val, ack = state.ack, "leaf after press");
    }

    let node = path.parent().ok_or_else(|| CliError::Internal(format!("{path} has no parent")))?;
    let entries = session.store.subtree(&node);
    let rendered = tree::render_entries(output_format(config, global), &entries)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

//! `watch`: bind scenes and stream state changes until interrupted.

use std::time::Duration;

use clap::ValueEnum;
use futures_util::StreamExt;
use tracing::info;

use scenebridge_config::Config;
use scenebridge_core::StateChange;

use super::{Session, output_format, press};
use crate::cli::{GlobalOpts, SceneAction, WatchArgs};
use crate::error::CliError;
use crate::output;

/// Parse a `<scene>:<run|stop>` press spec.
pub fn parse_press(spec: &str) -> Result<(String, SceneAction), CliError> {
    let invalid = |reason: &str| CliError::Validation {
        field: "--press".into(),
        reason: format!("'{spec}': {reason}"),
    };
    let (scene, action) = spec
        .split_once(':')
        .ok_or_else(|| invalid("expected <scene>:<run|stop>"))?;
    if scene.is_empty() {
        return Err(invalid("missing scene id"));
    }
    let action = SceneAction::from_str(action, true).map_err(|_| invalid("action must be run or stop"))?;
    Ok((scene.to_string(), action))
}

pub fn change_line(change: &StateChange) -> String {
    match &change.state {
        Some(s) if s.ack => format!("{} = {} (ack)", change.path, s.val),
        Some(s) => format!("{} = {} (requested)", change.path, s.val),
        None => format!("{} deleted", change.path),
    }
}

pub async fn handle(args: WatchArgs, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let presses = args
        .presses
        .iter()
        .map(|spec| parse_press(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let format = output_format(config, global);

    // Subscribe before binding so provisioning shows up too.
    let store = Session::new_store();
    let mut changes = store.subscribe_changes();
    let session = Session::bind(store, config).await?;

    for (scene, action) in &presses {
        let path = press::target_path(&session, scene, *action)?;
        press::request(&session, &path, true).await?;
    }

    let deadline = async {
        match args.duration_ms {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            change = changes.next() => {
                let Some(change) = change else { break };
                let line = output::render_event(format, change.as_ref(), change_line)?;
                output::print_output(&line, global.quiet);
            }
            () = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let released = session.handlers.dispose_all();
    info!(released, "watch finished, handlers disposed");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use scenebridge_core::{State, StatePath};

    #[test]
    fn press_specs_parse_scene_and_action() {
        let (scene, action) = parse_press("3:Stop").unwrap();
        assert_eq!(scene, "3");
        assert_eq!(action, SceneAction::Stop);
        assert!(parse_press("3").is_err());
        assert!(parse_press(":run").is_err());
        assert!(parse_press("3:pause").is_err());
    }

    #[test]
    fn change_lines_mark_acknowledgement() {
        let change = StateChange {
            path: StatePath::new("scenes.3.run").unwrap(),
            state: Some(State::new(true, true)),
        };
        assert_eq!(change_line(&change), "scenes.3.run = true (ack)");

        let deleted = StateChange {
            path: StatePath::new("scenes.3.run").unwrap(),
            state: None,
        };
        assert_eq!(change_line(&deleted), "scenes.3.run deleted");
    }
}

//! `tree`: bind scenes and print the state tree.

use tabled::Tabled;

use scenebridge_config::Config;
use scenebridge_core::TreeEntry;

use super::{Session, SETTLE, output_format, parse_path};
use crate::cli::{GlobalOpts, OutputFormat, TreeArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
pub struct TreeRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Access")]
    access: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Ack")]
    ack: String,
}

impl From<&TreeEntry> for TreeRow {
    fn from(entry: &TreeEntry) -> Self {
        match entry {
            TreeEntry::Node { path, common } => Self {
                path: path.to_string(),
                kind: "channel",
                name: common.name.clone(),
                role: common.role.clone(),
                access: "",
                value: String::new(),
                ack: String::new(),
            },
            TreeEntry::Leaf {
                path,
                common,
                state,
            } => Self {
                path: path.to_string(),
                kind: "state",
                name: common.name.clone(),
                role: common.role.clone(),
                access: access(common.read, common.write),
                value: state.as_ref().map(|s| s.val.to_string()).unwrap_or_default(),
                ack: state
                    .as_ref()
                    .map(|s| if s.ack { "yes" } else { "no" }.to_string())
                    .unwrap_or_default(),
            },
        }
    }
}

fn access(read: bool, write: bool) -> &'static str {
    match (read, write) {
        (true, true) => "rw",
        (true, false) => "r",
        (false, true) => "w",
        (false, false) => "-",
    }
}

/// One-line rendering used by `plain` output.
pub fn entry_line(entry: &TreeEntry) -> String {
    match entry {
        TreeEntry::Node { path, common } => format!("{path}/ ({})", common.name),
        TreeEntry::Leaf { path, state, .. } => match state {
            Some(s) if s.ack => format!("{path} = {}", s.val),
            Some(s) => format!("{path} = {} (requested)", s.val),
            None => format!("{path} = <unset>"),
        },
    }
}

pub fn render_entries(format: OutputFormat, entries: &[TreeEntry]) -> Result<String, CliError> {
    output::render_list(format, entries, |e| TreeRow::from(e), entry_line)
}

pub async fn handle(args: TreeArgs, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let root = args.root.as_deref().map(parse_path).transpose()?;
    let session = Session::start(config).await?;
    tokio::time::sleep(SETTLE).await;

    let entries = match &root {
        Some(root) => session.store.subtree(root),
        None => session.store.snapshot(),
    };
    let rendered = render_entries(output_format(config, global), &entries)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use scenebridge_core::{LeafCommon, NodeCommon, State, StatePath};

    fn leaf(raw: &str, state: Option<State>) -> TreeEntry {
        TreeEntry::Leaf {
            path: StatePath::new(raw).unwrap(),
            common: LeafCommon::boolean("stop").access(false, true),
            state,
        }
    }

    #[test]
    fn plain_lines_distinguish_requested_values() {
        assert_eq!(
            entry_line(&leaf("scenes.1.stop", Some(State::new(true, false)))),
            "scenes.1.stop = true (requested)"
        );
        assert_eq!(
            entry_line(&leaf("scenes.1.stop", Some(State::new(false, true)))),
            "scenes.1.stop = false"
        );
        assert_eq!(entry_line(&leaf("scenes.1.stop", None)), "scenes.1.stop = <unset>");
    }

    #[test]
    fn rows_show_access_and_channel_kind() {
        let row = TreeRow::from(&leaf("scenes.1.stop", None));
        assert_eq!(row.access, "w");

        let node = TreeEntry::Node {
            path: StatePath::new("scenes.1").unwrap(),
            common: NodeCommon::new("Evening", "scene"),
        };
        let row = TreeRow::from(&node);
        assert_eq!((row.kind, row.name.as_str()), ("channel", "Evening"));
    }
}

//! Implementation of the `forkline backends` command.

use super::{load_config, load_explicit, repo_root};
use crate::cli::BackendsArgs;
use forkline::backend::BackendKind;
use forkline::config::Config;
use forkline::error::Result;

/// Execute the `forkline backends` command.
///
/// Works outside a repository too, using the default config.
pub fn cmd_backends(args: BackendsArgs) -> Result<()> {
    let config = match (repo_root(), args.config.as_deref()) {
        (Ok(root), explicit) => load_config(&root, explicit)?,
        (Err(_), Some(path)) => load_explicit(path)?,
        (Err(_), None) => Config::default(),
    };
    let selected = BackendKind::from_id(&config.backend);

    println!("Backends:");
    for kind in BackendKind::ALL {
        let marker = if kind == selected { "*" } else { " " };
        let mode = if kind.is_interactive(&config) {
            "interactive"
        } else {
            "headless"
        };
        println!("{} {:10} {:12} {}", marker, kind.id(), mode, describe(kind, &config));
    }
    println!();
    println!("* selected. Interactive backends cannot be used for concurrent runs.");

    Ok(())
}

fn describe(kind: BackendKind, config: &Config) -> String {
    let configured = config
        .backend_settings(kind.id())
        .and_then(|s| s.command.clone());

    match (kind, configured, kind.preset()) {
        (BackendKind::Native, _, _) => format!("built-in agent, model {}", config.native.model),
        (_, Some(command), _) => command,
        (_, None, Some(preset)) => preset.command.to_string(),
        (_, None, None) => "(set backends.custom.command)".to_string(),
    }
}

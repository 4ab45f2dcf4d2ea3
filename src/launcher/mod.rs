//! Local application launcher.
//!
//! The backend half ([`server`]) answers `POST /open-app`; the assistant half
//! ([`client`]) sends those requests. Resolution and spawning live here so
//! both halves agree on what a name means.

use std::process::Stdio;

use log::{debug, info, warn};
use tokio::process::Command;

use crate::config::AppEntry;
use crate::error::Error;

pub mod client;
pub mod server;

/// Finds the first entry with a pattern contained in `name` (case-insensitive).
pub fn resolve<'a>(apps: &'a [AppEntry], name: &str) -> Option<&'a AppEntry> {
    let name = name.to_lowercase();
    if name.trim().is_empty() {
        return None;
    }
    apps.iter().find(|entry| {
        entry
            .patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && name.contains(&pattern.to_lowercase()))
    })
}

/// Starts `command` without waiting for it to exit.
///
/// The command line is split on whitespace and executed directly, no shell
/// is involved. The child is reaped by a background task. Must be called
/// from within a tokio runtime.
pub fn spawn(app: &str, command: &str) -> Result<(), Error> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or_else(|| Error::LaunchFailed {
        app: app.to_string(),
        reason: "empty command".to_string(),
    })?;

    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| Error::LaunchFailed {
            app: app.to_string(),
            reason: format!("{program}: {err}"),
        })?;
    info!("Started `{command}` for {app}");

    let command = command.to_string();
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => debug!("`{command}` exited"),
            Ok(status) => warn!("`{command}` exited with {status}"),
            Err(err) => warn!("Could not wait on `{command}`: {err}"),
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LauncherConfig;

    #[test]
    fn test_resolve_defaults() {
        let apps = LauncherConfig::default().apps;
        assert_eq!(resolve(&apps, "vs code").unwrap().command, "code");
        assert_eq!(resolve(&apps, "VSCode").unwrap().command, "code");
        assert_eq!(resolve(&apps, "the notepad app").unwrap().command, "notepad");
        assert_eq!(resolve(&apps, "calculator").unwrap().command, "calc");
        assert!(resolve(&apps, "spotify").is_none());
        assert!(resolve(&apps, "").is_none());
    }

    #[test]
    fn test_resolve_first_entry_wins() {
        let apps = vec![
            AppEntry::new(&["code"], "first"),
            AppEntry::new(&["vs code"], "second"),
        ];
        assert_eq!(resolve(&apps, "vs code").unwrap().command, "first");
    }

    #[test]
    fn test_resolve_ignores_empty_patterns() {
        let apps = vec![AppEntry::new(&[""], "anything")];
        assert!(resolve(&apps, "calculator").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_existing_program() {
        assert!(spawn("test", "true --ignored-arg").is_ok());
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let err = spawn("ghost", "hark-no-such-program").unwrap_err();
        assert!(matches!(err, Error::LaunchFailed { ref app, .. } if app == "ghost"));
    }

    #[tokio::test]
    async fn test_spawn_empty_command() {
        assert!(matches!(
            spawn("blank", "   "),
            Err(Error::LaunchFailed { .. })
        ));
    }
}

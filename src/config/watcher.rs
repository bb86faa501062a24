//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself: editors
//! that save by writing a temporary file and renaming it over the original
//! would otherwise leave the watch attached to a deleted inode.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::BridgeConfig;

/// Sends a validated [`BridgeConfig`] every time the config file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<BridgeConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for reloaded configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<BridgeConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Reloads stop when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = watch_root(&self.path);
        let file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| notify::Error::generic("config path has no file name"))?;

        let path = self.path.clone();
        let tx = self.update_tx;
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = %e, "Config watch error");
                    return;
                }
            };
            if !(event.kind.is_modify() || event.kind.is_create()) {
                return;
            }
            if !touches(&event, &file_name) {
                return;
            }

            match load_config(&path) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        backends = config.backends.len(),
                        "Config reloaded"
                    );
                    let _ = tx.send(config);
                }
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Config reload rejected, keeping current configuration"
                ),
            }
        })?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %self.path.display(), dir = %directory.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn watch_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    const VALID: &str = r#"
[discord]
webhook_url = "https://discord.com/api/webhooks/1/token"

[[backends]]
name = "lobby"
address = "127.0.0.1:25566"
"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "discord-bridge-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    async fn drain(rx: &mut mpsc::UnboundedReceiver<BridgeConfig>, quiet: Duration) {
        while tokio::time::timeout(quiet, rx.recv()).await.is_ok() {}
    }

    #[test]
    fn watch_root_of_bare_file_name_is_cwd() {
        assert_eq!(watch_root(Path::new("config.toml")), PathBuf::from("."));
        assert_eq!(
            watch_root(Path::new("config/config.toml")),
            PathBuf::from("config")
        );
    }

    #[tokio::test]
    async fn rewrite_sends_validated_config_and_invalid_rewrite_sends_nothing() {
        let dir = scratch_dir("watch-rewrite");
        let path = dir.join("config.toml");
        fs::write(&path, VALID).unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _guard = watcher.run().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let grown = format!("{}\n[[backends]]\nname = \"survival\"\naddress = \"127.0.0.1:25567\"\n", VALID);
        fs::write(&path, grown).unwrap();

        let config = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(config.backends.len(), 2);
        drain(&mut rx, Duration::from_millis(300)).await;

        fs::write(&path, "[monitor]\ninterval_secs = 0\n").unwrap();
        assert!(tokio::time::timeout(Duration::from_millis(800), rx.recv())
            .await
            .is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn replace_by_rename_keeps_reloading() {
        let dir = scratch_dir("watch-rename");
        let path = dir.join("config.toml");
        fs::write(&path, VALID).unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _guard = watcher.run().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        for round in 0..2 {
            let staged = dir.join(format!("config.toml.{}.tmp", round));
            let body = VALID.replace("25566", &format!("2557{}", round));
            fs::write(&staged, body).unwrap();
            fs::rename(&staged, &path).unwrap();

            let config = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(config.backends[0].address, format!("127.0.0.1:2557{}", round));
            drain(&mut rx, Duration::from_millis(300)).await;
        }

        let _ = fs::remove_dir_all(&dir);
    }
}

//! Migration of the keystore location used by older Docker-wrapper releases.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use archway_core::{ChainError, Prompt};

use crate::client::ClientHandle;

/// What happened to a keystore found at the legacy location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// Nothing to do: not Docker, no legacy dir, or it is the configured home.
    NotNeeded,
    /// The operator chose to leave it where it is.
    Declined,
    Moved,
    /// Prompting or moving failed; the command carries on regardless.
    Failed,
}

/// Offer to move a keystore from `legacy` into the client's home.
///
/// Never fails: every problem is reported as a warning so the command the
/// operator actually asked for still runs.
pub fn migrate_legacy_home(
    client: &ClientHandle,
    prompt: &dyn Prompt,
    legacy: &Path,
) -> Migration {
    if !client.is_docker() || client.home() == legacy || !legacy.exists() {
        return Migration::NotNeeded;
    }

    match ask_and_move(client.home(), prompt, legacy) {
        Ok(true) => {
            info!(from = %legacy.display(), to = %client.home().display(), "moved keystore");
            Migration::Moved
        }
        Ok(false) => Migration::Declined,
        Err(MoveFailure::Prompt(ChainError::UserCancelled)) => {
            warn!("cancelled moving keystore");
            Migration::Failed
        }
        Err(MoveFailure::Prompt(e)) => {
            warn!(error = %e, "could not ask about keystore migration");
            Migration::Failed
        }
        Err(MoveFailure::Io(path, e)) => {
            warn!(path = %path.display(), error = %e, "failed to move keystore directory");
            Migration::Failed
        }
    }
}

enum MoveFailure {
    Prompt(ChainError),
    Io(PathBuf, std::io::Error),
}

impl From<ChainError> for MoveFailure {
    fn from(e: ChainError) -> Self {
        MoveFailure::Prompt(e)
    }
}

fn ask_and_move(home: &Path, prompt: &dyn Prompt, legacy: &Path) -> Result<bool, MoveFailure> {
    let question = format!(
        "I've found a keystore in {}. Would you like to move it to {}?",
        legacy.display(),
        home.display()
    );
    if !prompt.confirm(&question, true)? {
        return Ok(false);
    }

    if home.exists() {
        let question = format!(
            "The directory {} is not empty. Would you like to overwrite its contents?",
            home.display()
        );
        if !prompt.confirm(&question, true)? {
            return Ok(false);
        }
    }

    replace_home(legacy, home, move_dir)?;
    Ok(true)
}

/// Put `legacy` at `home`. An existing home is set aside first and is only
/// deleted once the keystore is in place; if the move fails it is restored.
fn replace_home<F>(legacy: &Path, home: &Path, mover: F) -> Result<(), MoveFailure>
where
    F: Fn(&Path, &Path) -> Result<(), MoveFailure>,
{
    let backup = if home.exists() {
        let backup = backup_path(home);
        if backup.exists() {
            return Err(move_error(
                &backup,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "backup already exists"),
            ));
        }
        std::fs::rename(home, &backup).map_err(|e| move_error(home, e))?;
        Some(backup)
    } else {
        None
    };

    if let Err(failure) = mover(legacy, home) {
        if let Some(backup) = &backup {
            if let Err(e) = std::fs::rename(backup, home) {
                warn!(
                    backup = %backup.display(),
                    error = %e,
                    "could not restore previous home; it is kept at the backup path"
                );
            }
        }
        return Err(failure);
    }

    if let Some(backup) = backup {
        if let Err(e) = std::fs::remove_dir_all(&backup) {
            warn!(path = %backup.display(), error = %e, "could not remove previous home");
        }
    }
    Ok(())
}

/// Sibling of `home` that holds its previous contents during a migration.
fn backup_path(home: &Path) -> PathBuf {
    let name = home
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archway-home".to_string());
    home.with_file_name(format!("{name}.bak-{}", Utc::now().format("%Y%m%dT%H%M%SZ")))
}

/// Rename `from` to `to`, or copy then delete when a rename is impossible
/// (`/var/tmp` and the home usually sit on different filesystems).
fn move_dir(from: &Path, to: &Path) -> Result<(), MoveFailure> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| move_error(parent, e))?;
    }
    match std::fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) => debug!(error = %e, "rename failed, copying keystore instead"),
    }

    if let Err(e) = copy_dir(from, to) {
        let _ = std::fs::remove_dir_all(to);
        return Err(move_error(from, e));
    }
    if let Err(e) = std::fs::remove_dir_all(from) {
        warn!(path = %from.display(), error = %e, "keystore copied but old copy not removed");
    }
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        let kind = entry.file_type()?;
        if kind.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else if kind.is_symlink() {
            copy_symlink(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(std::fs::read_link(from)?, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::copy(from, to).map(|_| ())
}

fn move_error(path: &Path, e: std::io::Error) -> MoveFailure {
    MoveFailure::Io(path.to_path_buf(), e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use zeroize::Zeroizing;

    struct Answers(Mutex<Vec<bool>>);

    impl Prompt for Answers {
        fn confirm(&self, _message: &str, _default: bool) -> Result<bool, ChainError> {
            self.0.lock().unwrap().pop().ok_or(ChainError::UserCancelled)
        }

        fn secret(&self, _message: &str) -> Result<Zeroizing<String>, ChainError> {
            Err(ChainError::UserCancelled)
        }
    }

    fn answers(mut a: Vec<bool>) -> Answers {
        a.reverse();
        Answers(Mutex::new(a))
    }

    #[test]
    fn binary_clients_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("legacy");
        std::fs::create_dir_all(&legacy).unwrap();
        let client = ClientHandle::binary(dir.path().join("home"));
        assert_eq!(
            migrate_legacy_home(&client, &answers(vec![]), &legacy),
            Migration::NotNeeded
        );
    }

    #[test]
    fn moves_into_missing_home() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("legacy");
        std::fs::create_dir_all(legacy.join("keyring-file")).unwrap();
        let home = dir.path().join("home");
        let client = ClientHandle::docker(&home, None, None);

        assert_eq!(
            migrate_legacy_home(&client, &answers(vec![true]), &legacy),
            Migration::Moved
        );
        assert!(home.join("keyring-file").is_dir());
        assert!(!legacy.exists());
    }

    #[test]
    fn declining_overwrite_keeps_both() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("legacy");
        std::fs::create_dir_all(&legacy).unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(home.join("config")).unwrap();
        let client = ClientHandle::docker(&home, None, None);

        assert_eq!(
            migrate_legacy_home(&client, &answers(vec![true, false]), &legacy),
            Migration::Declined
        );
        assert!(legacy.exists());
        assert!(home.join("config").exists());
    }

    #[test]
    fn cancelled_prompt_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("legacy");
        std::fs::create_dir_all(&legacy).unwrap();
        let client = ClientHandle::docker(dir.path().join("home"), None, None);

        assert_eq!(
            migrate_legacy_home(&client, &answers(vec![]), &legacy),
            Migration::Failed
        );
        assert!(legacy.exists());
    }

    #[test]
    fn overwrite_replaces_home_and_drops_backup() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("legacy");
        std::fs::create_dir_all(legacy.join("keyring-file")).unwrap();
        std::fs::write(legacy.join("keyring-file").join("validator.info"), "key").unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(home.join("config")).unwrap();
        let client = ClientHandle::docker(&home, None, None);

        assert_eq!(
            migrate_legacy_home(&client, &answers(vec![true, true]), &legacy),
            Migration::Moved
        );
        assert!(home.join("keyring-file").join("validator.info").is_file());
        assert!(!home.join("config").exists());
        assert!(!legacy.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1, "backup removed");
    }

    #[test]
    fn failed_move_restores_existing_home() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("legacy");
        std::fs::create_dir_all(&legacy).unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(home.join("keyring-file")).unwrap();
        std::fs::write(home.join("keyring-file").join("tester1.info"), "key").unwrap();

        let result = replace_home(&legacy, &home, |from, _| {
            Err(move_error(
                from,
                std::io::Error::new(std::io::ErrorKind::Other, "Invalid cross-device link"),
            ))
        });

        assert!(matches!(result, Err(MoveFailure::Io(..))));
        assert!(home.join("keyring-file").join("tester1.info").is_file());
        assert!(legacy.exists());
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(entries.iter().all(|n| !n.contains(".bak-")), "{entries:?}");
    }

    #[test]
    fn overwrite_across_filesystems_keeps_keystore() {
        // tmpfs is a separate filesystem from the temp dir on most Linux hosts,
        // which forces the copy path.
        let shm = Path::new("/dev/shm");
        let legacy_root = if shm.is_dir() {
            tempfile::tempdir_in(shm).unwrap()
        } else {
            tempfile::tempdir().unwrap()
        };
        let legacy = legacy_root.path().join(".archwayd");
        std::fs::create_dir_all(legacy.join("keyring-file")).unwrap();
        std::fs::write(legacy.join("keyring-file").join("validator.info"), "key").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(home.join("config")).unwrap();
        let client = ClientHandle::docker(&home, None, None);

        assert_eq!(
            migrate_legacy_home(&client, &answers(vec![true, true]), &legacy),
            Migration::Moved
        );
        assert_eq!(
            std::fs::read_to_string(home.join("keyring-file").join("validator.info")).unwrap(),
            "key"
        );
        assert!(!legacy.exists());
    }

    #[test]
    fn copy_dir_copies_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from");
        std::fs::create_dir_all(from.join("keyring-file")).unwrap();
        std::fs::write(from.join("keyring-file").join("keyhash"), "hash").unwrap();
        std::fs::write(from.join("top"), "t").unwrap();
        let to = dir.path().join("to");

        copy_dir(&from, &to).unwrap();
        assert_eq!(std::fs::read_to_string(to.join("keyring-file").join("keyhash")).unwrap(), "hash");
        assert_eq!(std::fs::read_to_string(to.join("top")).unwrap(), "t");
        assert!(from.exists());
    }
}

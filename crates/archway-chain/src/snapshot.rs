use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::info;

use archway_core::constants::{DATA_DIR_NAME, SNAPSHOT_FILE_PREFIX};
use archway_core::ChainError;
use archway_daemon::ClientHandle;

/// `chaindata_<basic ISO-8601 UTC timestamp>.tar.gz`, unique per second.
pub fn snapshot_file_name(at: DateTime<Utc>) -> String {
    format!("{SNAPSHOT_FILE_PREFIX}{}.tar.gz", at.format("%Y%m%dT%H%M%SZ"))
}

/// Archive the client's data directory into its snapshots directory.
/// Returns the path of the new archive.
pub async fn make_snapshot(client: &ClientHandle) -> Result<PathBuf, ChainError> {
    let data_dir = client.data_dir();
    let snapshots_dir = client.snapshots_dir();
    tokio::task::spawn_blocking(move || archive_data_dir(&data_dir, &snapshots_dir, Utc::now()))
        .await
        .map_err(|e| ChainError::Snapshot(format!("archiving task failed: {e}")))?
}

/// Write `data_dir` as `data/` into a gzip tarball under `snapshots_dir`.
///
/// Never overwrites: an existing archive with the same name is an error. A
/// partially written archive is removed.
pub fn archive_data_dir(
    data_dir: &Path,
    snapshots_dir: &Path,
    at: DateTime<Utc>,
) -> Result<PathBuf, ChainError> {
    if !data_dir.is_dir() {
        return Err(ChainError::Snapshot(format!(
            "data directory {} does not exist",
            data_dir.display()
        )));
    }
    std::fs::create_dir_all(snapshots_dir).map_err(|e| {
        ChainError::Snapshot(format!("creating {}: {e}", snapshots_dir.display()))
    })?;

    let target = snapshots_dir.join(snapshot_file_name(at));
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
        .map_err(|e| ChainError::Snapshot(format!("creating {}: {e}", target.display())))?;

    if let Err(e) = write_archive(file, data_dir) {
        let _ = std::fs::remove_file(&target);
        return Err(ChainError::Snapshot(format!(
            "archiving {}: {e}",
            data_dir.display()
        )));
    }

    info!(path = %target.display(), "snapshot written");
    Ok(target)
}

fn write_archive(file: File, data_dir: &Path) -> std::io::Result<()> {
    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(encoder);
    tar.append_dir_all(DATA_DIR_NAME, data_dir)?;
    let file = tar.into_inner()?.finish()?;
    file.sync_all()
}

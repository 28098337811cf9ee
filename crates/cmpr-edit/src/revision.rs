//! Revision persistence and the `.bak` working-file swap (§4.4 step 7,
//! §6 on-disk layout).
//!
//! Grounded on `core-state::undo`'s snapshot-then-mutate discipline,
//! retargeted from in-memory undo snapshots to on-disk revision snapshots:
//! the new file contents are durably written to `revs/` *before* the
//! working file is touched, so a crash mid-swap never loses data.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path, source: io::Error) -> RevisionError {
    RevisionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Format a timestamp as `YYYYMMDD-HHMMSS` (§6 revision/tmp/api-call
/// filenames), using civil-calendar arithmetic over days-since-epoch so the
/// workspace does not need a date/time crate dependency the teacher never
/// pulled in either.
pub fn format_timestamp(t: SystemTime) -> String {
    let secs = t
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    let days = secs.div_euclid(86_400);
    let time_of_day = secs.rem_euclid(86_400);
    let (y, m, d) = civil_from_days(days);
    let hh = time_of_day / 3600;
    let mm = (time_of_day % 3600) / 60;
    let ss = time_of_day % 60;
    format!("{y:04}{m:02}{d:02}-{hh:02}{mm:02}{ss:02}")
}

/// Howard Hinnant's `civil_from_days`: days-since-epoch to `(year, month, day)`.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as i64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Write `new_contents` to `<cmprdir>/revs/<timestamp>[-N]`, never clobbering
/// an existing revision (disambiguating same-second edits with a numeric
/// suffix — a deliberate deviation from the original's refuse-to-clobber
/// behavior, recorded in DESIGN.md).
pub fn write_revision(
    cmprdir: &Path,
    timestamp: &str,
    new_contents: &[u8],
) -> Result<PathBuf, RevisionError> {
    let revs_dir = cmprdir.join("revs");
    fs::create_dir_all(&revs_dir).map_err(|e| io_err(&revs_dir, e))?;

    let mut candidate = revs_dir.join(timestamp);
    let mut n = 1u32;
    while candidate.exists() {
        candidate = revs_dir.join(format!("{timestamp}-{n}"));
        n += 1;
    }
    fs::write(&candidate, new_contents).map_err(|e| io_err(&candidate, e))?;
    Ok(candidate)
}

/// Swap a revision file in as the new working file: back up the existing
/// working file with a `.bak` suffix, copy the revision over the working
/// path, and restore the original permission bits.
pub fn swap_in_revision(working_path: &Path, revision_path: &Path) -> Result<(), RevisionError> {
    let prior_mode = fs::metadata(working_path).ok().map(|m| m.permissions().mode());

    if working_path.exists() {
        let bak = backup_path(working_path);
        fs::rename(working_path, &bak).map_err(|e| io_err(working_path, e))?;
    }

    fs::copy(revision_path, working_path).map_err(|e| io_err(working_path, e))?;

    if let Some(mode) = prior_mode {
        let perms = fs::Permissions::from_mode(mode);
        fs::set_permissions(working_path, perms).map_err(|e| io_err(working_path, e))?;
    }
    Ok(())
}

fn backup_path(working_path: &Path) -> PathBuf {
    let mut s = working_path.as_os_str().to_os_string();
    s.push(".bak");
    PathBuf::from(s)
}

/// Best-effort removal of the caller's temp file (§4.4 step 7). Not
/// treated as fatal: the edit itself already succeeded by this point.
pub fn remove_temp_file(path: &Path) {
    let _ = fs::remove_file(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn format_timestamp_known_epoch_values() {
        assert_eq!(format_timestamp(UNIX_EPOCH), "19700101-000000");
        assert_eq!(
            format_timestamp(UNIX_EPOCH + Duration::from_secs(86_400 + 3661)),
            "19700102-010101"
        );
    }

    #[test]
    fn write_revision_disambiguates_same_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let ts = "20240101-000000";
        let p1 = write_revision(dir.path(), ts, b"first").unwrap();
        let p2 = write_revision(dir.path(), ts, b"second").unwrap();
        assert_ne!(p1, p2);
        assert_eq!(fs::read(&p1).unwrap(), b"first");
        assert_eq!(fs::read(&p2).unwrap(), b"second");
    }

    #[test]
    fn swap_in_revision_backs_up_and_restores_mode() {
        let dir = tempfile::tempdir().unwrap();
        let working = dir.path().join("file.c");
        fs::write(&working, b"old").unwrap();
        let mut perms = fs::metadata(&working).unwrap().permissions();
        perms.set_mode(0o640);
        fs::set_permissions(&working, perms).unwrap();

        let rev = dir.path().join("rev1");
        fs::write(&rev, b"new").unwrap();

        swap_in_revision(&working, &rev).unwrap();

        assert_eq!(fs::read(&working).unwrap(), b"new");
        assert_eq!(fs::read(backup_path(&working)).unwrap(), b"old");
        let mode = fs::metadata(&working).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn swap_in_revision_without_prior_working_file() {
        let dir = tempfile::tempdir().unwrap();
        let working = dir.path().join("new_file.c");
        let rev = dir.path().join("rev1");
        fs::write(&rev, b"content").unwrap();
        swap_in_revision(&working, &rev).unwrap();
        assert_eq!(fs::read(&working).unwrap(), b"content");
    }
}

use crate::utils::error::{EtlError, Result};
use crate::utils::validation::DATE_FORMAT;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct PruneReport {
    pub deleted: Vec<PathBuf>,
    pub kept: usize,
    pub skipped: Vec<EtlError>,
    /// Expired files that could not be removed.
    pub failed: Vec<(PathBuf, EtlError)>,
}

/// Reads the date out of a log file name: the part before the first `.`
/// must be `YYYY-MM-DD`.
pub fn parse_log_date(file_name: &str) -> Result<NaiveDate> {
    let stem = file_name.split('.').next().unwrap_or_default();
    NaiveDate::parse_from_str(stem, DATE_FORMAT).map_err(|_| EtlError::FilenameParseError {
        file_name: file_name.to_string(),
    })
}

/// Deletes regular files in `log_dir` whose name-date is older than
/// `now - max_age_days`. Files with other names are reported and left alone.
pub fn prune_logs(log_dir: &Path, max_age_days: u32, now: NaiveDateTime) -> Result<PruneReport> {
    prune_with(log_dir, max_age_days, now, |path| std::fs::remove_file(path))
}

fn prune_with<F>(
    log_dir: &Path,
    max_age_days: u32,
    now: NaiveDateTime,
    mut remove: F,
) -> Result<PruneReport>
where
    F: FnMut(&Path) -> std::io::Result<()>,
{
    std::fs::create_dir_all(log_dir)?;

    let mut report = PruneReport::default();
    // A cutoff before the earliest representable date means nothing can be old enough.
    let Some(cutoff) = now.checked_sub_signed(Duration::days(i64::from(max_age_days))) else {
        tracing::debug!("Retention of {} days reaches past any log date", max_age_days);
        return Ok(report);
    };

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();

        match parse_log_date(&file_name) {
            Ok(date) => {
                if date.and_time(NaiveTime::MIN) >= cutoff {
                    report.kept += 1;
                    continue;
                }
                match remove(&path) {
                    Ok(()) => {
                        tracing::info!("Removed old log file: {}", path.display());
                        report.deleted.push(path);
                    }
                    Err(e) => {
                        tracing::warn!("Could not remove old log file {}: {}", path.display(), e);
                        report.failed.push((path, EtlError::IoError(e)));
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Skipped log file with unexpected name: {}", path.display());
                report.skipped.push(e);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_date() {
        assert_eq!(
            parse_log_date("2023-01-30.log").unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 30).unwrap()
        );
        assert!(parse_log_date("2023-01-30").is_ok());
        assert!(parse_log_date("2023-01-30.log.1").is_ok());
        assert!(matches!(
            parse_log_date("notes.txt"),
            Err(EtlError::FilenameParseError { .. })
        ));
        assert!(parse_log_date("").is_err());
    }

    #[test]
    fn test_failed_removal_does_not_stop_pruning() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["2023-01-01.log", "2023-01-02.log", "2023-01-03.log"] {
            std::fs::write(dir.path().join(name), "old").unwrap();
        }
        let now = NaiveDate::from_ymd_opt(2023, 6, 3)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let locked = dir.path().join("2023-01-02.log");

        let report = prune_with(dir.path(), 3, now, |path| {
            if path == locked {
                Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "locked",
                ))
            } else {
                std::fs::remove_file(path)
            }
        })
        .unwrap();

        assert_eq!(report.deleted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, locked);
        assert!(matches!(report.failed[0].1, EtlError::IoError(_)));
        assert!(locked.exists());
        assert!(!dir.path().join("2023-01-01.log").exists());
        assert!(!dir.path().join("2023-01-03.log").exists());
    }
}

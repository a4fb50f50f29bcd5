use anyhow::Result;
use attempt_etl::utils::retention::prune_logs;
use attempt_etl::EtlError;
use chrono::NaiveDate;
use tempfile::TempDir;

fn at(year: i32, month: u32, day: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

#[test]
fn test_prunes_only_expired_logs() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("2023-01-01.log"), "old")?;
    std::fs::write(dir.path().join("2023-06-01.log"), "recent")?;

    let report = prune_logs(dir.path(), 3, at(2023, 6, 3))?;

    assert_eq!(report.deleted, vec![dir.path().join("2023-01-01.log")]);
    assert_eq!(report.kept, 1);
    assert!(!dir.path().join("2023-01-01.log").exists());
    assert!(dir.path().join("2023-06-01.log").exists());
    Ok(())
}

#[test]
fn test_cutoff_boundary() -> Result<()> {
    let dir = TempDir::new()?;
    // now - 3 days = 2023-05-31 09:30; midnight of 05-31 is older, 06-01 is not.
    std::fs::write(dir.path().join("2023-05-31.log"), "")?;
    std::fs::write(dir.path().join("2023-05-30.log"), "")?;
    std::fs::write(dir.path().join("2023-06-01.log"), "")?;

    let report = prune_logs(dir.path(), 3, at(2023, 6, 3))?;

    assert_eq!(report.deleted.len(), 2);
    assert!(dir.path().join("2023-06-01.log").exists());
    Ok(())
}

#[test]
fn test_unparsable_names_are_skipped_not_deleted() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("notes.txt"), "keep me")?;
    std::fs::write(dir.path().join("2023-13-45.log"), "bad date")?;
    std::fs::create_dir(dir.path().join("2000-01-01"))?;

    let report = prune_logs(dir.path(), 3, at(2023, 6, 3))?;

    assert!(report.deleted.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert!(report
        .skipped
        .iter()
        .all(|e| matches!(e, EtlError::FilenameParseError { .. })));
    assert!(dir.path().join("notes.txt").exists());
    assert!(dir.path().join("2023-13-45.log").exists());
    assert!(dir.path().join("2000-01-01").is_dir());
    Ok(())
}

#[test]
fn test_missing_directory_is_created() -> Result<()> {
    let dir = TempDir::new()?;
    let log_dir = dir.path().join("logs");

    let report = prune_logs(&log_dir, 3, at(2023, 6, 3))?;

    assert!(log_dir.is_dir());
    assert!(report.deleted.is_empty());
    Ok(())
}

#[test]
fn test_huge_retention_keeps_everything() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("1970-01-01.log"), "ancient")?;

    let report = prune_logs(dir.path(), u32::MAX, at(2023, 6, 3))?;

    assert!(report.deleted.is_empty());
    assert!(report.failed.is_empty());
    assert!(dir.path().join("1970-01-01.log").exists());
    Ok(())
}

/*!
 * Tests for the SQLite job store through the `JobStore` contract
 */

use anyhow::Result;
use std::sync::Arc;
use vidcaption::captions::{Position, StyleOptions};
use vidcaption::database::{DatabaseConnection, JobRecord, Repository};
use vidcaption::jobs::{JobStatus, JobStore};

use crate::common;

fn styled_record(id: &str) -> JobRecord {
    let style = StyleOptions {
        font: "DejaVu Sans".to_string(),
        font_size: 48,
        position: Position::Top,
        shadow: true,
        max_chars: 30,
        ..Default::default()
    };
    JobRecord::new(
        id,
        format!("/tmp/{}_input.mp4", id),
        format!("/tmp/{}_output.mp4", id),
        "holiday.mp4",
        style,
    )
}

/// Test that a job written to a database file is visible after reopening it
#[test]
fn test_repository_afterReopen_shouldKeepJobAndStyle() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("jobs.db");
    let record = styled_record("persisted");

    tokio_test::block_on(async {
        let repo = Repository::new(DatabaseConnection::new(&db_path)?);
        repo.create(&record).await?;
        repo.update_progress("persisted", JobStatus::Processing, 50).await?;
        Ok::<_, anyhow::Error>(())
    })?;

    let reopened = tokio_test::block_on(async {
        let repo = Repository::new(DatabaseConnection::new(&db_path)?);
        Ok::<_, anyhow::Error>(repo.read("persisted").await?)
    })?;

    let reopened = reopened.expect("job should survive reopening the database");
    assert_eq!(reopened.status, JobStatus::Processing);
    assert_eq!(reopened.progress, 50);
    assert_eq!(reopened.style, record.style);
    assert_eq!(reopened.original_filename, "holiday.mp4");

    Ok(())
}

/// Test the full checkpoint sequence followed by completion
#[test]
fn test_repository_checkpointSequence_shouldEndCompleted() -> Result<()> {
    tokio_test::block_on(async {
        let repo = Repository::new_in_memory()?;
        repo.create(&styled_record("seq")).await?;

        assert!(repo.update_progress("seq", JobStatus::NotStarted, 10).await?);
        for progress in [25, 50, 65] {
            assert!(repo.update_progress("seq", JobStatus::Processing, progress).await?);
        }
        assert!(repo.mark_completed("seq").await?);

        let job = repo.read("seq").await?.expect("job exists");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.completed_at.is_some());
        assert_eq!(job.download_url, "/jobs/seq/download");
        assert!(job.failure_message.is_empty());

        Ok(())
    })
}

/// Test that a failed job cannot later be marked completed
#[test]
fn test_repository_failedJob_shouldRejectCompletion() -> Result<()> {
    tokio_test::block_on(async {
        let repo = Repository::new_in_memory()?;
        repo.create(&styled_record("failed")).await?;

        assert!(repo.mark_failed("failed", "Error: boom").await?);
        assert!(!repo.mark_completed("failed").await?);
        assert!(!repo.update_progress("failed", JobStatus::Processing, 50).await?);

        let job = repo.read("failed").await?.expect("job exists");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 0);
        assert_eq!(job.failure_message, "Error: boom");

        Ok(())
    })
}

/// Test that concurrent jobs on one store do not interfere
#[tokio::test]
async fn test_repository_concurrentJobs_shouldStayIndependent() -> Result<()> {
    let repo = Arc::new(Repository::new_in_memory()?);
    let ids: Vec<String> = (0..8).map(|i| format!("job-{}", i)).collect();

    for id in &ids {
        repo.create(&styled_record(id)).await?;
    }

    let tasks = ids.iter().cloned().enumerate().map(|(i, id)| {
        let repo = Arc::clone(&repo);
        tokio::spawn(async move {
            repo.update_progress(&id, JobStatus::Processing, 25).await?;
            if i % 2 == 0 {
                repo.mark_completed(&id).await
            } else {
                repo.mark_failed(&id, "Error: odd job").await
            }
        })
    });

    for result in futures::future::join_all(tasks).await {
        assert!(result??);
    }

    for (i, id) in ids.iter().enumerate() {
        let job = repo.read(id).await?.expect("job exists");
        let expected = if i % 2 == 0 { JobStatus::Completed } else { JobStatus::Failed };
        assert_eq!(job.status, expected, "unexpected status for {}", id);
    }

    let stats = repo.stats()?;
    assert_eq!(stats.total_jobs, 8);
    assert_eq!(stats.completed_jobs, 4);
    assert_eq!(stats.failed_jobs, 4);

    Ok(())
}

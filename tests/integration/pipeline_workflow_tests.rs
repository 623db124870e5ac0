/*!
 * Integration tests for the captioning pipeline running against fake stages
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use vidcaption::captions::{LayerKind, StyleOptions};
use vidcaption::jobs::JobStatus;
use vidcaption::pipeline::orchestrator::NO_OUTPUT_MESSAGE;
use vidcaption::stages::mock::{MockBehavior, MockRenderer, MockTranscriber};

use crate::common::{self, StoreWrite, TestHarness};

fn audio_path_for(input: &std::path::Path) -> PathBuf {
    input.with_extension("mp3")
}

/// Test a successful run from upload to completed job
#[tokio::test]
async fn test_pipeline_withWorkingStages_shouldCompleteJob() -> Result<()> {
    let harness = TestHarness::new(MockTranscriber::working(), MockRenderer::working())?;
    let video = common::create_test_video(&harness.uploads_dir()?, "holiday.mp4")?;

    let (job, handle) = harness.controller.submit(&video, StyleOptions::default()).await?;
    let terminal = handle.await?;

    assert_eq!(terminal, JobStatus::Completed);
    assert_eq!(
        harness.store.writes(),
        vec![
            StoreWrite::Progress(JobStatus::NotStarted, 10),
            StoreWrite::Progress(JobStatus::Processing, 25),
            StoreWrite::Progress(JobStatus::Processing, 50),
            StoreWrite::Progress(JobStatus::Processing, 65),
            StoreWrite::Completed,
        ]
    );

    let status = harness.controller.status(&job.job_id).await?;
    assert_eq!(status.status_name, "Completed");
    assert_eq!(status.progress, 100);
    assert_eq!(status.download_url, format!("/jobs/{}/download", job.job_id));
    assert!(status.completed_at.is_some());
    assert!(status.failure_message.is_empty());

    // Staged upload and intermediate audio are gone, the rendered video stays
    assert!(!job.input_path.exists());
    assert!(!audio_path_for(&job.input_path).exists());
    assert!(job.output_path.exists());
    assert!(video.exists());

    Ok(())
}

/// Test that the renderer receives one caption layer per segmented line
#[tokio::test]
async fn test_pipeline_withSampleWords_shouldRenderSegmentedLines() -> Result<()> {
    let harness = TestHarness::new(MockTranscriber::working(), MockRenderer::working())?;
    let video = common::create_test_video(&harness.uploads_dir()?, "clip.mov")?;

    let (_, handle) = harness.controller.submit(&video, StyleOptions::default()).await?;
    assert_eq!(handle.await?, JobStatus::Completed);

    let rendered = harness.renderer.rendered_layers();
    assert_eq!(rendered.len(), 1);

    let layers = &rendered[0];
    let texts: Vec<&str> = layers.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello world", "today"]);
    assert!(layers.iter().all(|l| l.kind == LayerKind::Caption));
    assert!(layers.iter().all(|l| (l.y - 540.0).abs() < 1e-9));
    assert_eq!(layers[1].start, 3.0);

    Ok(())
}

/// Test that shadow styling adds a blurred layer group before the captions
#[tokio::test]
async fn test_pipeline_withShadow_shouldRenderShadowsFirst() -> Result<()> {
    let harness = TestHarness::new(MockTranscriber::working(), MockRenderer::working())?;
    let video = common::create_test_video(&harness.uploads_dir()?, "clip.mp4")?;
    let style = StyleOptions {
        shadow: true,
        ..Default::default()
    };

    let (_, handle) = harness.controller.submit(&video, style).await?;
    assert_eq!(handle.await?, JobStatus::Completed);

    let layers = harness.renderer.rendered_layers().remove(0);
    let kinds: Vec<LayerKind> = layers.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![LayerKind::Shadow, LayerKind::Shadow, LayerKind::Caption, LayerKind::Caption]
    );
    assert!(layers[0].blur_sigma.is_some());
    assert!(layers[0].stroke.is_none());

    Ok(())
}

/// Test that an SRT sidecar is written for every job
#[tokio::test]
async fn test_pipeline_shouldWriteSubtitleSidecar() -> Result<()> {
    let harness = TestHarness::new(MockTranscriber::working(), MockRenderer::working())?;
    let video = common::create_test_video(&harness.uploads_dir()?, "clip.mp4")?;

    let (job, handle) = harness.controller.submit(&video, StyleOptions::default()).await?;
    handle.await?;

    let sidecar = harness
        .controller
        .config()
        .storage
        .subtitle_dir
        .join(format!("{}.srt", job.job_id));
    let srt = fs::read_to_string(sidecar)?;

    assert!(srt.starts_with("1\n00:00:00,000 --> "));
    assert!(srt.contains("Hello world"));
    assert!(srt.contains("\n2\n00:00:03,000 --> "));

    Ok(())
}

/// Test that a stage failure fails the job and skips later stages
#[tokio::test]
async fn test_pipeline_withFailingTranscriber_shouldFailJob() -> Result<()> {
    let harness = TestHarness::new(MockTranscriber::failing(), MockRenderer::working())?;
    let video = common::create_test_video(&harness.uploads_dir()?, "clip.mp4")?;

    let (job, handle) = harness.controller.submit(&video, StyleOptions::default()).await?;
    assert_eq!(handle.await?, JobStatus::Failed);

    assert_eq!(
        harness.store.writes(),
        vec![
            StoreWrite::Progress(JobStatus::NotStarted, 10),
            StoreWrite::Progress(JobStatus::Processing, 25),
            StoreWrite::Failed("Error: Transcription failed: mock transcription failure".to_string()),
        ]
    );

    let status = harness.controller.status(&job.job_id).await?;
    assert_eq!(status.status_name, "Failed");
    assert_eq!(status.progress, 0);
    assert!(status.failure_message.starts_with("Error: "));
    assert!(status.completed_at.is_none());

    assert!(harness.renderer.rendered_layers().is_empty());
    assert!(!job.input_path.exists());
    assert!(!audio_path_for(&job.input_path).exists());
    assert!(!job.output_path.exists());

    Ok(())
}

/// Test that a renderer reporting success without output fails the job
#[tokio::test]
async fn test_pipeline_withMissingRenderOutput_shouldFailJob() -> Result<()> {
    let harness = TestHarness::new(MockTranscriber::working(), MockRenderer::no_output())?;
    let video = common::create_test_video(&harness.uploads_dir()?, "clip.mp4")?;

    let (job, handle) = harness.controller.submit(&video, StyleOptions::default()).await?;
    assert_eq!(handle.await?, JobStatus::Failed);

    let status = harness.controller.status(&job.job_id).await?;
    assert_eq!(status.failure_message, NO_OUTPUT_MESSAGE);
    assert_eq!(status.progress, 0);

    Ok(())
}

/// Test that a job whose staged input vanished fails without calling any stage
#[tokio::test]
async fn test_pipeline_withMissingInput_shouldFailBeforeExtraction() -> Result<()> {
    let harness = TestHarness::new(MockTranscriber::working(), MockRenderer::working())?;
    let job = harness
        .controller
        .manager()
        .create_job("ghost.mp4", StyleOptions::default())
        .await?;

    let terminal = harness
        .controller
        .pipeline()
        .run_pipeline(
            job.job_id.clone(),
            job.input_path.clone(),
            job.output_path.clone(),
            StyleOptions::default(),
        )
        .await;

    assert_eq!(terminal, JobStatus::Failed);
    assert_eq!(harness.extractor.call_count(), 0);

    let status = harness.controller.status(&job.job_id).await?;
    assert!(status.failure_message.starts_with("Error: Input video not found"));

    Ok(())
}

/// Test that running a finished job again leaves its outcome unchanged
#[tokio::test]
async fn test_pipeline_rerunOfCompletedJob_shouldKeepOutcome() -> Result<()> {
    let harness = TestHarness::new(MockTranscriber::working(), MockRenderer::working())?;
    let video = common::create_test_video(&harness.uploads_dir()?, "clip.mp4")?;

    let (job, handle) = harness.controller.submit(&video, StyleOptions::default()).await?;
    assert_eq!(handle.await?, JobStatus::Completed);
    let before = harness.controller.status(&job.job_id).await?;

    // The staged input was removed, so this run fails; the store must ignore it
    harness
        .controller
        .pipeline()
        .run_pipeline(
            job.job_id.clone(),
            job.input_path.clone(),
            job.output_path.clone(),
            StyleOptions::default(),
        )
        .await;

    let after = harness.controller.status(&job.job_id).await?;
    assert_eq!(after, before);

    Ok(())
}

/// Test that a concurrency cap still lets every job finish
#[tokio::test]
async fn test_pipeline_withConcurrencyCap_shouldFinishAllJobs() -> Result<()> {
    let harness = TestHarness::with_config(
        MockTranscriber::working(),
        MockRenderer::new(MockBehavior::Slow { delay_ms: 20 }),
        |config| config.max_concurrent_jobs = Some(1),
    )?;
    let uploads = harness.uploads_dir()?;

    let mut handles = Vec::new();
    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        let video = common::create_test_video(&uploads, name)?;
        let (job, handle) = harness.controller.submit(&video, StyleOptions::default()).await?;
        handles.push((job, handle));
    }

    for (job, handle) in handles {
        assert_eq!(handle.await?, JobStatus::Completed);
        assert!(job.output_path.exists());
    }
    assert_eq!(harness.renderer.rendered_layers().len(), 3);

    Ok(())
}

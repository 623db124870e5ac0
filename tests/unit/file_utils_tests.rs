/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use vidcaption::file_utils::FileManager;

use crate::common;

/// Test file existence check
#[test]
fn test_fileExists_shouldDistinguishFilesFromDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "clip.mp4", b"video")?;

    assert!(FileManager::file_exists(&file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.mp4")));

    Ok(())
}

/// Test that copying creates missing parent directories
#[test]
fn test_copyFile_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "clip.mp4", b"video bytes")?;
    let target = temp_dir.path().join("nested").join("deeper").join("copy.mp4");

    FileManager::copy_file(&source, &target)?;

    assert_eq!(fs::read(&target)?, b"video bytes");
    assert!(source.exists());

    Ok(())
}

/// Test that copying a missing source fails
#[test]
fn test_copyFile_withMissingSource_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let result = FileManager::copy_file(
        temp_dir.path().join("missing.mp4"),
        temp_dir.path().join("copy.mp4"),
    );

    assert!(result.is_err());
    assert!(!temp_dir.path().join("copy.mp4").exists());

    Ok(())
}

/// Test cleanup of a directory that does not exist
#[test]
fn test_cleanupDir_withMissingDir_shouldRemoveNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    assert_eq!(FileManager::cleanup_dir(temp_dir.path().join("absent"))?, 0);

    Ok(())
}

/// Test video detection across the supported containers
#[test]
fn test_isVideoFile_withCommonContainers_shouldMatch() {
    for name in ["a.mp4", "b.MOV", "c.webm", "d.m2ts", "e.Mkv"] {
        assert!(FileManager::is_video_file(name), "{} should be a video", name);
    }
    for name in ["a.mp3", "b.srt", "c.json", "archive.tar.gz", ".mp4"] {
        assert!(!FileManager::is_video_file(name), "{} should not be a video", name);
    }
}

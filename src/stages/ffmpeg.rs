/*!
 * ffmpeg-backed audio extraction and caption rendering.
 *
 * Rendering builds a single filter graph. Shadow layers are drawn onto a
 * transparent copy of the frame, blurred, and overlaid on the base video; caption
 * layers are then drawn on top. Each layer's text is passed through a text file
 * with expansion disabled, so `%` and `\\` in a transcript are drawn as written.
 */

use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::{path_arg, run_tool, AudioExtractor, Renderer};
use crate::captions::layers::SHADOW_BLUR_SIGMA;
use crate::captions::{CaptionLayer, LayerKind, VideoSize};
use crate::errors::StageError;

/// Characters the filter option parser treats specially
static OPTION_SPECIAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\':]").expect("static regex is valid"));

/// Characters the filter graph parser treats specially
static GRAPH_SPECIAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\'\[\],;]").expect("static regex is valid"));

/// Escape a value for an unquoted filter option inside a filter graph
///
/// ffmpeg unescapes twice: once when splitting the graph and once when parsing
/// the option list, so the option level is escaped first.
pub fn escape_filter_value(value: &str) -> String {
    let option_level = OPTION_SPECIAL_CHARS.replace_all(value, r"\$0");
    GRAPH_SPECIAL_CHARS.replace_all(&option_level, r"\$0").into_owned()
}

/// File extension for an ffmpeg audio encoder
fn audio_extension(codec: &str) -> &'static str {
    match codec {
        "libmp3lame" | "mp3" => "mp3",
        "pcm_s16le" | "pcm_s24le" => "wav",
        "aac" => "m4a",
        "flac" => "flac",
        "libopus" => "opus",
        _ => "mka",
    }
}

/// Audio extraction through `ffmpeg -vn`
#[derive(Debug, Clone)]
pub struct FfmpegAudioExtractor {
    ffmpeg_path: String,
    audio_codec: String,
}

impl FfmpegAudioExtractor {
    pub fn new(ffmpeg_path: impl Into<String>, audio_codec: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            audio_codec: audio_codec.into(),
        }
    }

    /// Where the audio for `video` is written: next to it, same stem
    pub fn audio_path_for(&self, video: &Path) -> PathBuf {
        video.with_extension(audio_extension(&self.audio_codec))
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudioExtractor {
    async fn extract(&self, video: &Path) -> Result<PathBuf, StageError> {
        if !video.exists() {
            return Err(StageError::Extraction(format!(
                "Input video not found: {}",
                video.display()
            )));
        }

        let audio = self.audio_path_for(video);
        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(video),
            "-vn".to_string(),
            "-acodec".to_string(),
            self.audio_codec.clone(),
            path_arg(&audio),
        ];

        run_tool(&self.ffmpeg_path, &args)
            .await
            .map_err(|e| StageError::Extraction(e.to_string()))?;

        if !audio.exists() {
            return Err(StageError::Extraction(format!(
                "ffmpeg produced no audio file at {}",
                audio.display()
            )));
        }

        debug!("Extracted audio to {}", audio.display());
        Ok(audio)
    }
}

/// Probing through ffprobe and compositing through ffmpeg `drawtext`
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    ffmpeg_path: String,
    ffprobe_path: String,
    video_codec: String,
}

impl FfmpegRenderer {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        ffprobe_path: impl Into<String>,
        video_codec: impl Into<String>,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            video_codec: video_codec.into(),
        }
    }

    /// Parse width and height from `ffprobe -print_format json -show_entries stream=width,height`
    pub fn parse_probe_output(stdout: &str) -> Result<VideoSize, StageError> {
        let json: Value = serde_json::from_str(stdout)
            .map_err(|e| StageError::Probe(format!("Invalid ffprobe JSON output: {}", e)))?;

        let stream = json
            .get("streams")
            .and_then(|s| s.as_array())
            .and_then(|s| s.first())
            .ok_or_else(|| StageError::Probe("No video stream found".to_string()))?;

        let dimension = |key: &str| {
            stream
                .get(key)
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .ok_or_else(|| StageError::Probe(format!("Video stream has no valid {}", key)))
        };

        Ok(VideoSize::new(dimension("width")?, dimension("height")?))
    }

    /// Build the filter graph for `layers`, reading text from `text_files[i]`
    ///
    /// The graph reads `[0:v]` and produces `[out]`.
    pub fn build_filter_graph(layers: &[CaptionLayer], text_files: &[PathBuf]) -> String {
        let drawtext = |layer: &CaptionLayer, text_file: &Path| {
            let mut filter = format!(
                "drawtext=font={}:textfile={}:expansion=none:fontsize={}:fontcolor={}:x=(w-text_w)/2:y={:.0}",
                escape_filter_value(&layer.font),
                escape_filter_value(&text_file.to_string_lossy()),
                layer.font_size,
                layer.color,
                layer.y,
            );
            if let Some((color, width)) = &layer.stroke {
                let _ = write!(filter, ":borderw={}:bordercolor={}", width, color);
            }
            let _ = write!(
                filter,
                ":enable='between(t,{:.3},{:.3})'",
                layer.start,
                layer.end()
            );
            filter
        };

        let chain = |kind: LayerKind| {
            layers
                .iter()
                .zip(text_files)
                .filter(|(layer, _)| layer.kind == kind)
                .map(|(layer, file)| drawtext(layer, file))
                .collect::<Vec<_>>()
                .join(",")
        };

        let shadows = chain(LayerKind::Shadow);
        let captions = chain(LayerKind::Caption);

        let mut graph = String::new();
        let base = if shadows.is_empty() {
            "[0:v]"
        } else {
            let sigma = layers
                .iter()
                .find_map(|l| l.blur_sigma)
                .unwrap_or(SHADOW_BLUR_SIGMA);
            let _ = write!(
                graph,
                "[0:v]split[base][canvas];\
                 [canvas]format=rgba,colorchannelmixer=aa=0,{},gblur=sigma={}[shadow];\
                 [base][shadow]overlay=0:0[shadowed];",
                shadows, sigma
            );
            "[shadowed]"
        };

        if captions.is_empty() {
            let _ = write!(graph, "{}null[out]", base);
        } else {
            let _ = write!(graph, "{}{}[out]", base, captions);
        }

        graph
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn video_size(&self, video: &Path) -> Result<VideoSize, StageError> {
        let args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "stream=width,height".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            path_arg(video),
        ];

        let stdout = run_tool(&self.ffprobe_path, &args)
            .await
            .map_err(|e| StageError::Probe(e.to_string()))?;

        Self::parse_probe_output(&String::from_utf8_lossy(&stdout))
    }

    async fn render(
        &self,
        video: &Path,
        layers: &[CaptionLayer],
        output: &Path,
    ) -> Result<(), StageError> {
        // Holds the per-layer text files until ffmpeg exits
        let text_dir = tempfile::tempdir()
            .map_err(|e| StageError::Rendering(format!("Failed to create text directory: {}", e)))?;

        let mut text_files = Vec::with_capacity(layers.len());
        for (i, layer) in layers.iter().enumerate() {
            let path = text_dir.path().join(format!("layer_{}.txt", i));
            tokio::fs::write(&path, &layer.text)
                .await
                .map_err(|e| StageError::Rendering(format!("Failed to write layer text: {}", e)))?;
            text_files.push(path);
        }

        let graph = Self::build_filter_graph(layers, &text_files);
        debug!("Filter graph: {}", graph);

        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(video),
            "-filter_complex".to_string(),
            graph,
            "-map".to_string(),
            "[out]".to_string(),
            "-map".to_string(),
            "0:a?".to_string(),
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-c:a".to_string(),
            "copy".to_string(),
            path_arg(output),
        ];

        run_tool(&self.ffmpeg_path, &args)
            .await
            .map_err(|e| StageError::Rendering(e.to_string()))?;

        info!("Rendered {} layers into {}", layers.len(), output.display());
        Ok(())
    }
}

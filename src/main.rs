// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::path::{Path, PathBuf};

use vidcaption::app_config::{self, Config};
use vidcaption::captions::{segment_with, srt, Position, StyleOptions};
use vidcaption::stages::whisper::parse_word_list;
use vidcaption::Controller;

/// Verbosity accepted by --log-level
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Verbosity {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn level_filter(self) -> LevelFilter {
        let level: app_config::LogLevel = match self {
            Verbosity::Error => app_config::LogLevel::Error,
            Verbosity::Warn => app_config::LogLevel::Warn,
            Verbosity::Info => app_config::LogLevel::Info,
            Verbosity::Debug => app_config::LogLevel::Debug,
            Verbosity::Trace => app_config::LogLevel::Trace,
        };
        level.to_level_filter()
    }
}

/// CLI Wrapper for Position to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPosition {
    Bottom,
    Center,
    Top,
}

impl From<CliPosition> for Position {
    fn from(cli_position: CliPosition) -> Self {
        match cli_position {
            CliPosition::Bottom => Position::Bottom,
            CliPosition::Center => Position::Center,
            CliPosition::Top => Position::Top,
        }
    }
}

/// Caption styling overrides; unset flags fall back to the configured style
#[derive(Args, Debug, Clone, Default)]
struct StyleArgs {
    /// Font family
    #[arg(long)]
    font: Option<String>,

    /// Font size in points
    #[arg(long)]
    font_size: Option<u32>,

    /// Text color (e.g., 'white', '#FFCC00')
    #[arg(long)]
    font_color: Option<String>,

    /// Outline color
    #[arg(long)]
    stroke_color: Option<String>,

    /// Outline width in pixels
    #[arg(long)]
    stroke_width: Option<u32>,

    /// Vertical placement of the captions
    #[arg(long, value_enum)]
    position: Option<CliPosition>,

    /// Draw a blurred drop shadow beneath the captions
    #[arg(long, overrides_with = "no_shadow")]
    shadow: bool,

    /// Turn off a drop shadow enabled in the config
    #[arg(long, overrides_with = "shadow")]
    no_shadow: bool,

    /// Characters per line before a break
    #[arg(long)]
    max_chars: Option<usize>,

    /// Seconds of speech per line before a break
    #[arg(long)]
    max_duration: Option<f64>,

    /// Pause in seconds that forces a break
    #[arg(long)]
    max_gap: Option<f64>,
}

impl StyleArgs {
    fn apply(self, base: StyleOptions) -> StyleOptions {
        StyleOptions {
            font: self.font.unwrap_or(base.font),
            font_size: self.font_size.unwrap_or(base.font_size),
            font_color: self.font_color.unwrap_or(base.font_color),
            stroke_color: self.stroke_color.unwrap_or(base.stroke_color),
            stroke_width: self.stroke_width.unwrap_or(base.stroke_width),
            position: self.position.map(Position::from).unwrap_or(base.position),
            shadow: match (self.shadow, self.no_shadow) {
                (true, _) => true,
                (_, true) => false,
                _ => base.shadow,
            },
            max_chars: self.max_chars.unwrap_or(base.max_chars),
            max_duration: self.max_duration.unwrap_or(base.max_duration),
            max_gap: self.max_gap.unwrap_or(base.max_gap),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Caption one or more videos
    Process {
        /// Video files to caption
        #[arg(value_name = "VIDEO", required = true)]
        videos: Vec<PathBuf>,

        /// Directory for the captioned videos (defaults to each video's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Print the status of a job as JSON
    Status {
        /// Job identifier
        job_id: String,
    },

    /// Copy a completed job's captioned video
    Download {
        /// Job identifier
        job_id: String,

        /// Destination directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Segment a word list (whisper JSON or [{start, end, text}]) and print SRT
    Segment {
        /// JSON file with timed words
        #[arg(value_name = "WORDS_JSON")]
        words: PathBuf,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Delete every file in the temp directory
    Cleanup,

    /// Generate shell completions for vidcaption
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// vidcaption - burned-in captions for videos
///
/// Extracts the audio track, transcribes it with whisper, segments the words into
/// subtitle lines and renders them onto the video with ffmpeg.
#[derive(Parser, Debug)]
#[command(name = "vidcaption")]
#[command(version)]
#[command(about = "Automatic burned-in captions for videos")]
#[command(long_about = "vidcaption transcribes a video's speech and burns the captions into a copy of it.

EXAMPLES:
    vidcaption process talk.mp4                          # Caption using default config
    vidcaption process -o out/ a.mp4 b.mov               # Caption several videos concurrently
    vidcaption process --position top --shadow talk.mp4  # Top captions with drop shadow
    vidcaption status 1b4e28ba-2fa1-11d2-883f-0016d3cca427
    vidcaption segment words.json > talk.srt             # Segment an existing transcript
    vidcaption completions bash > vidcaption.bash        # Generate bash completions

CONFIGURATION:
    Settings live in conf.json unless --config-path points elsewhere; a missing
    file is written out with defaults on first run. TEMP_DIR and SUBTITLE_DIR
    override the configured directories.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Override the configured log level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<Verbosity>,

    /// Directory for uploads and rendered videos
    #[arg(long, env = "TEMP_DIR", global = true)]
    temp_dir: Option<PathBuf>,

    /// Directory for generated subtitle files
    #[arg(long, env = "SUBTITLE_DIR", global = true)]
    subtitle_dir: Option<PathBuf>,
}

/// Colored stderr sink; filtering is left to `log::max_level`
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

fn level_style(level: Level) -> (&'static str, &'static str) {
    match level {
        Level::Error => ("\x1B[1;31m", "ERROR"),
        Level::Warn => ("\x1B[1;33m", "WARN "),
        Level::Info => ("\x1B[1;32m", "INFO "),
        Level::Debug => ("\x1B[1;36m", "DEBUG"),
        Level::Trace => ("\x1B[1;35m", "TRACE"),
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let (color, tag) = level_style(record.level());
        let timestamp = chrono::Local::now().format("%H:%M:%S.%3f");
        let mut out = std::io::stderr().lock();

        // Module paths only help once someone is debugging
        let _ = if record.level() >= Level::Debug {
            writeln!(out, "{}{} {} [{}] {}\x1B[0m", color, timestamp, tag, record.target(), record.args())
        } else {
            writeln!(out, "{}{} {} {}\x1B[0m", color, timestamp, tag, record.args())
        };
    }

    fn flush(&self) {
        let _ = std::io::stderr().lock().flush();
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    log::set_logger(&LOGGER).map_err(|e| anyhow!("Could not install logger: {}", e))?;
    log::set_max_level(LevelFilter::Info);

    let CommandLineOptions {
        command,
        config_path,
        log_level,
        temp_dir,
        subtitle_dir,
    } = CommandLineOptions::parse();

    if let Some(verbosity) = log_level {
        log::set_max_level(verbosity.level_filter());
    }
    let apply_log_level = log_level.is_none();

    match command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "vidcaption", &mut std::io::stdout());
        }
        Commands::Segment { words, style } => {
            let config = load_config(&config_path, apply_log_level, None, None)?;
            run_segment(words, style.apply(config.style)).await?;
        }
        Commands::Process {
            videos,
            output_dir,
            style,
        } => {
            let config = load_config(&config_path, apply_log_level, temp_dir, subtitle_dir)?;
            Controller::prepare_workspace(&config)?;
            let style = style.apply(config.style.clone());
            style.validate().context("Invalid caption style")?;

            let controller = Controller::with_config(config)?;
            let total = videos.len();
            let results = controller.process_videos(videos, output_dir, style).await;

            let mut failed = 0;
            for result in &results {
                match result {
                    Ok(processed) => match &processed.output {
                        Some(output) => println!("{}", output.display()),
                        None => {
                            failed += 1;
                            error!(
                                "{}: {}",
                                processed.source.display(),
                                processed.status.failure_message
                            );
                        }
                    },
                    Err(_) => failed += 1,
                }
            }

            if failed > 0 {
                return Err(anyhow!("{} of {} videos failed", failed, total));
            }
        }
        Commands::Status { job_id } => {
            let config = load_config(&config_path, apply_log_level, temp_dir, subtitle_dir)?;
            let controller = Controller::with_config(config)?;
            let status = controller.status(&job_id).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Download { job_id, output_dir } => {
            let config = load_config(&config_path, apply_log_level, temp_dir, subtitle_dir)?;
            let controller = Controller::with_config(config)?;
            let target = controller.download(&job_id, &output_dir).await?;
            println!("{}", target.display());
        }
        Commands::Cleanup => {
            let config = load_config(&config_path, apply_log_level, temp_dir, subtitle_dir)?;
            let removed = Controller::prepare_workspace(&config)?;
            info!("Removed {} files from {}", removed, config.storage.temp_dir.display());
        }
    }

    Ok(())
}

fn load_config(
    path: &Path,
    apply_log_level: bool,
    temp_dir: Option<PathBuf>,
    subtitle_dir: Option<PathBuf>,
) -> Result<Config> {
    let mut config = Config::load_or_create(path)?;

    if let Some(temp_dir) = temp_dir {
        config.storage.temp_dir = temp_dir;
    }
    if let Some(subtitle_dir) = subtitle_dir {
        config.storage.subtitle_dir = subtitle_dir;
    }

    config.validate().context("Configuration validation failed")?;

    // A --log-level flag wins over the configured level
    if apply_log_level {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

async fn run_segment(words_path: PathBuf, style: StyleOptions) -> Result<()> {
    style.validate().context("Invalid segmentation limits")?;

    let json = tokio::fs::read_to_string(&words_path)
        .await
        .with_context(|| format!("Failed to read word list: {}", words_path.display()))?;

    let words = parse_word_list(&json)
        .with_context(|| format!("Failed to parse word list: {}", words_path.display()))?;

    let lines = segment_with(&words, &style);
    info!("Segmented {} words into {} lines", words.len(), lines.len());
    print!("{}", srt::to_srt(&lines));

    Ok(())
}

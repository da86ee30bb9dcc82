//! # Scribe - WAV to LilyPond transcriber
//!
//! Command-line front end for `scribe-core`. Decodes a WAV file, runs the
//! transcription pipeline and writes the LilyPond score (and optionally the
//! full analysis as JSON).
//!
//! Configuration is layered: built-in defaults, then an optional JSON file,
//! then individual flags.

mod wav;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use scribe_core::{tuning, Clef, NotationConfig, SampleBuffer, Transcriber, TranscriptionConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Transcribe a WAV recording into a LilyPond score")]
struct Args {
    /// Recording to transcribe
    input: PathBuf,

    /// Score to write (default: input path with a .ly extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with `transcription` and `notation` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tempo in beats per minute
    #[arg(long)]
    tempo: Option<f32>,

    /// Windows per beat (4 = sixteenth notes)
    #[arg(long)]
    subdivisions: Option<u32>,

    /// Frequency of A4 in Hz
    #[arg(long)]
    tuning: Option<f32>,

    /// Analysis threads (0 = one per CPU)
    #[arg(long)]
    workers: Option<usize>,

    /// Score title (default: input file name)
    #[arg(long)]
    title: Option<String>,

    /// Staff clef
    #[arg(long, value_parser = parse_clef)]
    clef: Option<Clef>,

    /// Also write the full analysis as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

/// On-disk configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    transcription: TranscriptionConfig,
    notation: FileNotation,
}

/// `notation` section of the config file. Unset fields keep their defaults;
/// an unset title falls back to the input file name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileNotation {
    title: Option<String>,
    clef: Option<Clef>,
    lilypond_version: Option<String>,
}

fn parse_clef(value: &str) -> Result<Clef, String> {
    match value.to_ascii_lowercase().as_str() {
        "treble" => Ok(Clef::Treble),
        "bass" => Ok(Clef::Bass),
        "alto" => Ok(Clef::Alto),
        "tenor" => Ok(Clef::Tenor),
        other => Err(format!("unknown clef `{other}` (treble, bass, alto, tenor)")),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Applies defaults, the config file and flags, in that order.
///
/// # Arguments
/// * `args` - Parsed command line
/// * `file` - Contents of `--config`, or the empty default
fn resolve_configs(args: &Args, file: FileConfig) -> (TranscriptionConfig, NotationConfig) {
    let mut transcription = file.transcription;
    if let Some(tempo) = args.tempo {
        transcription.tempo_bpm = tempo;
    }
    if let Some(subdivisions) = args.subdivisions {
        transcription.subdivisions = subdivisions;
    }
    if let Some(tuning) = args.tuning {
        transcription.tuning_hz = tuning;
    }
    if let Some(workers) = args.workers {
        transcription.workers = workers;
    }

    let stem = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    let defaults = NotationConfig::default();
    let notation = NotationConfig {
        title: args
            .title
            .clone()
            .or(file.notation.title)
            .or(stem)
            .unwrap_or(defaults.title),
        clef: args.clef.or(file.notation.clef).unwrap_or(defaults.clef),
        lilypond_version: file
            .notation
            .lilypond_version
            .unwrap_or(defaults.lilypond_version),
    };

    (transcription, notation)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let file = match &args.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    let (transcription_config, notation_config) = resolve_configs(&args, file);
    let transcriber = Transcriber::new(transcription_config, notation_config)
        .context("invalid configuration")?;

    let decoded = wav::read_wav(&args.input)?;
    let buffer =
        SampleBuffer::from_interleaved(&decoded.samples, decoded.channels, decoded.sample_rate)
            .with_context(|| format!("unusable audio in {}", args.input.display()))?;

    let result = transcriber
        .transcribe(&buffer)
        .with_context(|| format!("failed to transcribe {}", args.input.display()))?;

    for warning in &result.warnings {
        log::warn!("[MAIN] {warning:?}");
    }
    let config = transcriber.config();
    for group in &result.groups {
        let freqs: Vec<String> = group
            .notes
            .iter()
            .map(|&note| tuning::note_frequency(note, config.temperament, config.tuning_hz))
            .map(|freq| format!("{freq:.1}"))
            .collect();
        log::debug!(
            "[MAIN] {:<24} {} window(s) [{}] Hz",
            group.text,
            group.window_count,
            freqs.join(", ")
        );
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("ly"));
    fs::write(&output, &result.lilypond)
        .with_context(|| format!("failed to write score {}", output.display()))?;
    log::info!(
        "[MAIN] Wrote {} groups in {} major to {}",
        result.groups.len(),
        result.key_name,
        output.display()
    );

    if let Some(json_path) = &args.json {
        let json = serde_json::to_string_pretty(&result).context("failed to serialise analysis")?;
        fs::write(json_path, json)
            .with_context(|| format!("failed to write analysis {}", json_path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults_and_title_comes_from_file_name() {
        let args = Args::parse_from([
            "scribe",
            "takes/Vontmer_Short.wav",
            "--tempo",
            "90",
            "--clef",
            "Bass",
        ]);
        let (transcription, notation) = resolve_configs(&args, FileConfig::default());
        assert_eq!(transcription.tempo_bpm, 90.0);
        assert_eq!(transcription.subdivisions, 4);
        assert_eq!(notation.title, "Vontmer_Short");
        assert_eq!(notation.clef, Clef::Bass);
    }

    #[test]
    fn config_file_sections_are_optional() {
        let file: FileConfig =
            serde_json::from_str(r#"{ "transcription": { "subdivisions": 2 } }"#).unwrap();
        assert_eq!(file.transcription.subdivisions, 2);
        assert!(file.notation.title.is_none());
        assert!(file.notation.clef.is_none());
    }

    #[test]
    fn notation_section_without_title_keeps_the_file_name() {
        let file: FileConfig =
            serde_json::from_str(r#"{ "notation": { "clef": "tenor" } }"#).unwrap();
        let args = Args::parse_from(["scribe", "takes/Etude.wav"]);
        let (_, notation) = resolve_configs(&args, file);
        assert_eq!(notation.title, "Etude");
        assert_eq!(notation.clef, Clef::Tenor);
        assert_eq!(notation.lilypond_version, NotationConfig::default().lilypond_version);
    }

    #[test]
    fn title_precedence_is_flag_then_file_then_file_name() {
        let titled = r#"{ "notation": { "title": "Etude No. 1" } }"#;
        let args = Args::parse_from(["scribe", "takes/Etude.wav"]);
        let file: FileConfig = serde_json::from_str(titled).unwrap();
        assert_eq!(resolve_configs(&args, file).1.title, "Etude No. 1");

        let file: FileConfig = serde_json::from_str(titled).unwrap();
        let args = Args::parse_from(["scribe", "takes/Etude.wav", "--title", "Take 3"]);
        assert_eq!(resolve_configs(&args, file).1.title, "Take 3");
    }

    #[test]
    fn unknown_clef_is_rejected() {
        assert!(parse_clef("soprano").is_err());
        assert_eq!(parse_clef("ALTO"), Ok(Clef::Alto));
    }
}

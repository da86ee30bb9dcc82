//! # Transcription Pipeline
//!
//! Two explicit phases:
//!
//! 1. **Per-window analysis**: spectrum, peak isolation and quantization.
//!    Windows are independent, so this phase can fan out over a pool of
//!    worker threads fed from a `crossbeam-channel` job queue. Results are
//!    put back in window order before phase 2.
//! 2. **Score assembly**: key inference over all windows, run-length
//!    grouping, rhythm encoding and rendering. Key inference needs every
//!    window, so this phase starts only once phase 1 has fully succeeded.
//!
//! Either a complete [`Transcription`] comes out or an error does.

use crate::audio::SampleBuffer;
use crate::config::{NotationConfig, TranscriptionConfig};
use crate::error::{Error, Result, Stage};
use crate::fft::SpectrumAnalyzer;
use crate::grouping::group_runs;
use crate::key::infer_key;
use crate::notation::{key_name, render_document, render_group, spell_note, PitchSpelling};
use crate::pitch::{isolate_peaks, Peak};
use crate::rhythm::{GridDuration, RhythmToken};
use crate::slicer;
use crate::tables::{self, TemperamentTable};
use crate::tuning::{quantize_peaks, NoteSet};
use crate::{RenderedGroup, Transcription, Warning};
use serde::Serialize;
use std::thread;

/// Phase 1 output for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowAnalysis {
    /// Position of the window in the recording.
    pub index: usize,
    /// Peaks that survived isolation.
    pub peaks: Vec<Peak>,
    /// Quantized notes; empty for silence.
    pub notes: NoteSet,
}

/// A validated pipeline ready to transcribe buffers.
#[derive(Debug, Clone)]
pub struct Transcriber {
    config: TranscriptionConfig,
    notation: NotationConfig,
    table: &'static TemperamentTable,
}

impl Transcriber {
    /// Validates the configuration up front.
    ///
    /// # Errors
    /// * `InvalidConfig` - a non-positive tempo, tuning, temperament or grid
    /// * `UnsupportedTemperament` - no tables for the temperament
    pub fn new(config: TranscriptionConfig, notation: NotationConfig) -> Result<Self> {
        config.validate()?;
        let table = tables::table_for(config.temperament)?;
        Ok(Self { config, notation, table })
    }

    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }

    /// Runs both phases over a buffer.
    pub fn transcribe(&self, buffer: &SampleBuffer) -> Result<Transcription> {
        let windows = self.analyze_windows(buffer)?;
        Ok(self.assemble(windows))
    }

    /// Phase 1: slices the buffer and analyses every window.
    ///
    /// # Errors
    /// * `DegenerateSlice` - the window length rounds down to zero
    /// * `TooShort` - the buffer does not fill a single window
    /// * `Analysis` - a window could not be analysed
    pub fn analyze_windows(&self, buffer: &SampleBuffer) -> Result<Vec<WindowAnalysis>> {
        let slice_size = slicer::slice_size(
            buffer.sample_rate(),
            self.config.tempo_bpm,
            self.config.subdivisions,
        )?;
        let samples = buffer.normalized();
        let windows: Vec<&[f32]> = slicer::slices(&samples, slice_size)?.collect();

        log::info!(
            "[SLICER] {} Hz, {} windows of {} samples",
            buffer.sample_rate(),
            windows.len(),
            slice_size
        );

        let analyzer = SpectrumAnalyzer::new(slice_size, buffer.sample_rate());
        let analyze =
            |index: usize, window: &[f32]| analyze_window(index, window, &analyzer, &self.config);
        let workers = self.config.effective_workers().min(windows.len());
        if workers <= 1 {
            windows
                .iter()
                .enumerate()
                .map(|(index, window)| analyze(index, *window))
                .collect()
        } else {
            analyze_in_pool(&windows, workers, analyze)
        }
    }

    /// Phase 2: builds the score from ordered window results.
    pub fn assemble(&self, windows: Vec<WindowAnalysis>) -> Transcription {
        let estimate = infer_key(windows.iter().map(|w| &w.notes), self.table);
        let key = estimate.key;
        log::info!("[KEY] Key of {} major", key_name(key, self.table));

        let groups = group_runs(windows.iter().map(|w| &w.notes));
        log::debug!("[GROUPS] {} windows collapsed into {} groups", windows.len(), groups.len());

        let mut warnings = Vec::new();
        let mut rendered = Vec::with_capacity(groups.len());
        for (index, group) in groups.into_iter().enumerate() {
            let grid = GridDuration::from_windows(group.window_count, self.config.subdivisions);
            if !grid.is_exact() {
                log::warn!(
                    "[RHYTHM] Group {} lasts {:.3} sixteenths, written as {}",
                    index,
                    grid.exact,
                    grid.sixteenths
                );
                warnings.push(Warning::InexactRhythm {
                    group: index,
                    window_count: group.window_count,
                    exact_sixteenths: grid.exact,
                    snapped_sixteenths: grid.sixteenths,
                });
            }

            let rhythm = RhythmToken::new(grid.sixteenths, group.is_rest());
            let pitches: Vec<PitchSpelling> = group
                .notes
                .iter()
                .map(|&note| spell_note(note, key, self.table))
                .collect();
            let text = render_group(&pitches, &rhythm);

            rendered.push(RenderedGroup {
                notes: group.notes,
                window_count: group.window_count,
                pitches,
                rhythm,
                text,
            });
        }

        let tokens: Vec<String> = rendered.iter().map(|group| group.text.clone()).collect();
        let lilypond = render_document(&tokens, key, self.table, &self.notation);

        Transcription {
            key,
            key_name: key_name(key, self.table),
            key_candidates: estimate.candidates,
            windows,
            groups: rendered,
            warnings,
            lilypond,
        }
    }
}

fn analyze_window(
    index: usize,
    window: &[f32],
    analyzer: &SpectrumAnalyzer,
    config: &TranscriptionConfig,
) -> Result<WindowAnalysis> {
    let spectrum = analyzer.magnitude_spectrum(window).ok_or_else(|| Error::Analysis {
        window: index,
        stage: Stage::Spectrum,
        reason: format!("expected {} samples, got {}", analyzer.window_len(), window.len()),
    })?;
    if spectrum.iter().any(|(magnitude, _)| !magnitude.is_finite()) {
        return Err(Error::Analysis {
            window: index,
            stage: Stage::Spectrum,
            reason: "non-finite magnitude".to_string(),
        });
    }

    let peaks = isolate_peaks(&spectrum);
    let notes = quantize_peaks(&peaks, config.temperament, config.tuning_hz).map_err(|freq| {
        Error::Analysis {
            window: index,
            stage: Stage::Quantize,
            reason: format!("cannot quantize {freq} Hz"),
        }
    })?;

    log::trace!("[WINDOW {index}] {} peaks -> notes {:?}", peaks.len(), notes);
    Ok(WindowAnalysis { index, peaks, notes })
}

/// Runs `analyze` over every window on `workers` scoped threads and
/// restores window order.
///
/// # Returns
/// * `Ok` - one result per window, in window order
/// * `Err` - the error of the earliest failing window, or an `Analysis`
///   error naming the first window a panicking worker left unanalysed
fn analyze_in_pool<F>(
    windows: &[&[f32]],
    workers: usize,
    analyze: F,
) -> Result<Vec<WindowAnalysis>>
where
    F: Fn(usize, &[f32]) -> Result<WindowAnalysis> + Sync,
{
    let (job_tx, job_rx) = crossbeam_channel::unbounded::<usize>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<Result<WindowAnalysis>>();

    for index in 0..windows.len() {
        // The receiver is still held here, so sending cannot fail.
        let _ = job_tx.send(index);
    }
    drop(job_tx);

    log::debug!("[POOL] Analysing {} windows on {} workers", windows.len(), workers);

    let analyze = &analyze;
    let panicked = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for index in job_rx.iter() {
                        let outcome = analyze(index, windows[index]);
                        let failed = outcome.is_err();
                        if result_tx.send(outcome).is_err() || failed {
                            break;
                        }
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .filter(|joined| joined.is_err())
            .count()
    });
    drop(result_tx);

    let mut slots: Vec<Option<WindowAnalysis>> = vec![None; windows.len()];
    let mut first_error: Option<Error> = None;
    for outcome in result_rx.iter() {
        match outcome {
            Ok(analysis) => {
                let index = analysis.index;
                slots[index] = Some(analysis);
            }
            Err(err) => {
                // Report the earliest failing window.
                let earlier = match (&err, &first_error) {
                    (_, None) => true,
                    (
                        Error::Analysis { window: new, .. },
                        Some(Error::Analysis { window: old, .. }),
                    ) => new < old,
                    _ => false,
                };
                if earlier {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| Error::Analysis {
                window: index,
                stage: Stage::Spectrum,
                reason: if panicked > 0 {
                    format!("{panicked} worker thread(s) panicked")
                } else {
                    "window was never analysed".to_string()
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, samples: usize) -> Vec<i32> {
        (0..samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (10_000.0 * (2.0 * std::f32::consts::PI * freq * t).sin()).round() as i32
            })
            .collect()
    }

    fn config(workers: usize) -> TranscriptionConfig {
        // 8 kHz at 120 BPM: 4000-sample windows, 2 Hz per bin.
        TranscriptionConfig {
            tempo_bpm: 120.0,
            workers,
            ..Default::default()
        }
    }

    #[test]
    fn pool_matches_sequential_analysis() {
        let mut samples = sine(440.0, 8_000, 4_000 * 3);
        samples.extend(vec![0; 4_000 * 2]);
        samples.extend(sine(660.0, 8_000, 4_000 * 3));
        let buffer = SampleBuffer::mono(&samples, 8_000).unwrap();

        let sequential = Transcriber::new(config(1), NotationConfig::default())
            .unwrap()
            .analyze_windows(&buffer)
            .unwrap();
        let pooled = Transcriber::new(config(4), NotationConfig::default())
            .unwrap()
            .analyze_windows(&buffer)
            .unwrap();

        assert_eq!(sequential.len(), 8);
        assert_eq!(sequential, pooled);
        assert!(pooled.iter().enumerate().all(|(i, w)| w.index == i));
    }

    #[test]
    fn assemble_works_from_window_results_alone() {
        let transcriber =
            Transcriber::new(TranscriptionConfig::default(), NotationConfig::default()).unwrap();
        let notes: [&[i32]; 6] = [&[49], &[49], &[49], &[49], &[], &[49, 56]];
        let windows = notes
            .iter()
            .enumerate()
            .map(|(index, notes)| WindowAnalysis {
                index,
                peaks: Vec::new(),
                notes: notes.iter().copied().collect(),
            })
            .collect();

        let transcription = transcriber.assemble(windows);
        let tokens: Vec<&str> = transcription.groups.iter().map(|g| g.text.as_str()).collect();
        // A and E: A major is the lowest key holding both.
        assert_eq!(transcription.key, 1);
        assert_eq!(tokens, vec!["a'4", "r16", "<a' e''>16"]);
        assert!(transcription.warnings.is_empty());
    }

    fn silent_window(index: usize, _window: &[f32]) -> Result<WindowAnalysis> {
        Ok(WindowAnalysis {
            index,
            peaks: Vec::new(),
            notes: NoteSet::new(),
        })
    }

    #[test]
    fn pool_reports_the_earliest_failing_window() {
        let samples = vec![0.0_f32; 10];
        let windows: Vec<&[f32]> = samples.chunks_exact(1).collect();

        let result = analyze_in_pool(&windows, 4, |index, window: &[f32]| {
            if index == 3 || index == 7 {
                Err(Error::Analysis {
                    window: index,
                    stage: Stage::Quantize,
                    reason: "rejected".to_string(),
                })
            } else {
                silent_window(index, window)
            }
        });

        assert!(matches!(
            result,
            Err(Error::Analysis { window: 3, stage: Stage::Quantize, .. })
        ));
    }

    #[test]
    fn pool_turns_a_worker_panic_into_an_error() {
        let samples = vec![0.0_f32; 6];
        let windows: Vec<&[f32]> = samples.chunks_exact(1).collect();

        let result = analyze_in_pool(&windows, 2, |index, window: &[f32]| {
            if index == 2 {
                panic!("analysis blew up");
            }
            silent_window(index, window)
        });

        match result {
            Err(Error::Analysis { window, reason, .. }) => {
                assert_eq!(window, 2);
                assert!(reason.contains("panicked"));
            }
            other => panic!("expected an analysis error, got {other:?}"),
        }
    }

    #[test]
    fn pool_keeps_window_order() {
        let samples = vec![0.0_f32; 9];
        let windows: Vec<&[f32]> = samples.chunks_exact(1).collect();
        let analyses = analyze_in_pool(&windows, 3, silent_window).unwrap();
        let indices: Vec<usize> = analyses.iter().map(|w| w.index).collect();
        assert_eq!(indices, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn off_grid_groups_are_flagged() {
        let config = TranscriptionConfig {
            subdivisions: 3,
            ..Default::default()
        };
        let transcriber = Transcriber::new(config, NotationConfig::default()).unwrap();
        let windows = (0..2)
            .map(|index| WindowAnalysis {
                index,
                peaks: Vec::new(),
                notes: [49].into_iter().collect(),
            })
            .collect();

        let transcription = transcriber.assemble(windows);
        assert_eq!(transcription.groups[0].text, "a'8.");
        assert!(matches!(
            transcription.warnings.as_slice(),
            [Warning::InexactRhythm { group: 0, window_count: 2, snapped_sixteenths: 3, .. }]
        ));
    }
}

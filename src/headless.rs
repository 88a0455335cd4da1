//! Offline rendering: frames and audio without a window or audio device.
//!
//! Plays the generated buffer "virtually": each frame feeds the analyser the
//! samples the device would have played during that frame, then renders the
//! scene and saves it as a numbered PNG.

use image::RgbaImage;
use tracing::info;

use crate::audio::Analyser;
use crate::error::{NoiseFieldError, Result};
use crate::noise::{NoiseGenerator, NoiseParameters};
use crate::params::{AnalyserConfig, PlaybackConfig, RecordingConfig, RenderConfig};
use crate::visual::{PointerState, Scene};

/// Everything an offline run needs
#[derive(Debug, Clone)]
pub struct HeadlessJob {
    pub params: NoiseParameters,
    pub sample_rate: u32,
    pub seed: Option<u64>,
    pub analyser: AnalyserConfig,
    pub playback: PlaybackConfig,
    pub render: RenderConfig,
    pub recording: RecordingConfig,
}

/// What an offline run produced
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSummary {
    pub frames_written: usize,
    pub samples_generated: usize,
    /// Mean of the per-frame spectrum averages
    pub mean_level: f32,
}

/// The `len` samples the output would play from `start`.
///
/// Looped buffers wrap around; one-shot buffers are padded with silence.
fn played_chunk(samples: &[f32], start: usize, len: usize, looped: bool) -> Vec<f32> {
    (start..start + len)
        .map(|pos| match samples.get(pos) {
            Some(&sample) => sample,
            None if looped && !samples.is_empty() => samples[pos % samples.len()],
            None => 0.0,
        })
        .collect()
}

/// Render `job.recording.total_frames()` frames and the audio file
pub fn run(job: &HeadlessJob) -> Result<HeadlessSummary> {
    job.playback.validate()?;
    if job.recording.fps == 0 {
        return Err(NoiseFieldError::invalid("fps", "must be > 0"));
    }

    let mut generator = NoiseGenerator::new(job.sample_rate, job.seed)?;
    let buffer = generator.generate_secs(&job.params, job.playback.buffer_seconds)?;

    job.recording.create_dirs()?;
    buffer.write_wav(job.recording.audio_path())?;
    info!(
        "Wrote {:.2}s of {} noise to {}",
        buffer.duration_secs(),
        job.params.kind,
        job.recording.audio_path().display()
    );

    let mut analyser = Analyser::new(job.analyser.clone())?;
    let scene = Scene::new(job.render.clone());
    let pointer = PointerState {
        x: job.params.x_bias,
        y: job.params.y_bias,
    };
    let mut frame = RgbaImage::new(job.render.window_width.max(1), job.render.window_height.max(1));

    let samples_per_frame = (job.sample_rate / job.recording.fps).max(1) as usize;
    let total_frames = job.recording.total_frames();
    let mut position = 0usize;
    let mut level_sum = 0.0f32;

    for frame_num in 0..total_frames {
        let chunk = played_chunk(buffer.samples(), position, samples_per_frame, job.playback.looped);
        analyser.push_samples(&chunk);
        position += samples_per_frame;

        let snapshot = analyser.byte_frequency_data();
        level_sum += snapshot.average();
        scene.render(&mut frame, pointer, Some(&snapshot));
        frame.save(job.recording.frame_path(frame_num))?;
    }

    info!(
        "Rendered {} frame(s) to {}",
        total_frames,
        job.recording.frames_dir().display()
    );

    Ok(HeadlessSummary {
        frames_written: total_frames,
        samples_generated: buffer.len(),
        mean_level: if total_frames > 0 {
            level_sum / total_frames as f32
        } else {
            0.0
        },
    })
}

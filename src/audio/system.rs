//! Playback of generated noise on the default output device.
//!
//! A [`PlaybackSession`] owns everything attached to the output for one
//! buffer: the running stream, the shared buffer and the analyser fed by the
//! stream. Stopping or dropping the session pauses and releases all of it
//! together. The [`PlaybackController`] keeps at most one session alive.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{info, warn};

use super::analyser::{Analyser, FrequencySnapshot, SampleTap};
use crate::error::{NoiseFieldError, Result};
use crate::noise::{NoiseBuffer, NoiseGenerator, NoiseParameters};
use crate::params::{AnalyserConfig, PlaybackConfig};

/// Output gain shared with the audio callback (thread-safe, lock-free)
#[derive(Debug, Clone)]
pub struct Volume {
    bits: Arc<AtomicU32>,
}

impl Volume {
    pub fn new(level: f32) -> Self {
        let volume = Self {
            bits: Arc::new(AtomicU32::new(0.0f32.to_bits())),
        };
        volume.set(level);
        volume
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Set the gain, clamped to [0, 1]; returns the applied value
    pub fn set(&self, level: f32) -> f32 {
        let level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
        self.bits.store(level.to_bits(), Ordering::Relaxed);
        level
    }

    /// Nudge the gain by `delta`; returns the applied value
    pub fn step(&self, delta: f32) -> f32 {
        self.set(self.get() + delta)
    }
}

/// Read position over a buffer
struct BufferCursor {
    buffer: NoiseBuffer,
    position: usize,
    looped: bool,
    limit: f32,
}

impl BufferCursor {
    fn new(buffer: NoiseBuffer, playback: &PlaybackConfig) -> Self {
        Self {
            buffer,
            position: 0,
            looped: playback.looped,
            limit: playback.output_limit.abs(),
        }
    }

    /// Next buffer sample as generated (0 once a one-shot buffer ends)
    fn next_raw(&mut self) -> f32 {
        let samples = self.buffer.samples();
        if self.position >= samples.len() {
            if !self.looped || samples.is_empty() {
                return 0.0;
            }
            self.position = 0;
        }
        let sample = samples[self.position];
        self.position += 1;
        sample
    }

    /// Speaker value for a raw sample: gain first, then the hard clip
    fn shape(&self, raw: f32, gain: f32) -> f32 {
        (raw * gain).clamp(-self.limit, self.limit)
    }

    fn next_sample(&mut self, gain: f32) -> f32 {
        let raw = self.next_raw();
        self.shape(raw, gain)
    }
}

/// Everything the device callback needs to produce one session's audio
pub struct OutputFeed {
    cursor: BufferCursor,
    volume: Volume,
    tap: SampleTap,
}

impl OutputFeed {
    /// Fill interleaved `data`, writing the mono sample to every channel.
    ///
    /// The tap receives the signal before the volume, so the spectrum does
    /// not follow the volume setting.
    pub fn fill(&mut self, data: &mut [f32], channels: usize) {
        let gain = self.volume.get();
        let cursor = &mut self.cursor;
        self.tap.push(data.chunks_mut(channels.max(1)).map(|frame| {
            let raw = cursor.next_raw();
            frame.fill(cursor.shape(raw, gain));
            raw
        }));
    }
}

/// A started output stream; dropping it releases the stream
pub trait ActiveStream {
    fn pause(&self) -> Result<()>;
}

impl ActiveStream for cpal::Stream {
    fn pause(&self) -> Result<()> {
        StreamTrait::pause(self)
            .map_err(|e| NoiseFieldError::Stream(format!("failed to pause output stream: {}", e)))
    }
}

/// Sink that sessions play into
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;

    /// Start pulling samples from `feed` until the returned stream is dropped
    fn start_stream(&self, feed: OutputFeed) -> Result<Box<dyn ActiveStream>>;
}

/// Default output device with a usable f32 stream configuration
pub struct OutputDevice {
    device: cpal::Device,
    config: cpal::StreamConfig,
    name: String,
}

impl OutputDevice {
    /// Open the host's default output device
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            NoiseFieldError::UnsupportedDevice("no audio output device found".to_string())
        })?;

        let supported = device.default_output_config().map_err(|e| {
            NoiseFieldError::UnsupportedDevice(format!("failed to get output config: {}", e))
        })?;

        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(NoiseFieldError::UnsupportedDevice(format!(
                "sample format {:?} is not supported (need f32)",
                supported.sample_format()
            )));
        }

        let config: cpal::StreamConfig = supported.into();
        if config.channels == 0 {
            return Err(NoiseFieldError::UnsupportedDevice(
                "output device reports zero channels".to_string(),
            ));
        }

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!(
            "Audio: {} @ {}Hz, {} channel(s)",
            name, config.sample_rate.0, config.channels
        );

        Ok(Self {
            device,
            config,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

impl AudioOutput for OutputDevice {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start_stream(&self, mut feed: OutputFeed) -> Result<Box<dyn ActiveStream>> {
        let channels = self.channels() as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    feed.fill(data, channels);
                },
                |err| tracing::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| NoiseFieldError::Stream(format!("failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| NoiseFieldError::Stream(format!("failed to start output stream: {}", e)))?;

        Ok(Box::new(stream))
    }
}

/// One buffer attached to an output
pub struct PlaybackSession {
    stream: Option<Box<dyn ActiveStream>>,
    buffer: NoiseBuffer,
    params: NoiseParameters,
    tap: SampleTap,
    analyser: Analyser,
}

impl PlaybackSession {
    /// Start playing `buffer`; its sample rate must match the output
    pub fn open<O: AudioOutput + ?Sized>(
        output: &O,
        buffer: NoiseBuffer,
        params: NoiseParameters,
        analyser_config: &AnalyserConfig,
        playback: &PlaybackConfig,
        volume: Volume,
    ) -> Result<Self> {
        if buffer.sample_rate() != output.sample_rate() {
            return Err(NoiseFieldError::invalid(
                "sample_rate",
                format!(
                    "buffer is {}Hz but the output runs at {}Hz",
                    buffer.sample_rate(),
                    output.sample_rate()
                ),
            ));
        }
        if buffer.is_empty() {
            return Err(NoiseFieldError::invalid("buffer", "cannot play an empty buffer"));
        }

        let analyser = Analyser::new(analyser_config.clone())?;
        let tap = analyser.tap();
        let feed = OutputFeed {
            cursor: BufferCursor::new(buffer.clone(), playback),
            volume,
            tap: tap.clone(),
        };
        let stream = output.start_stream(feed)?;

        info!(
            "Playing {} noise (x={:.2}, y={:.2}, {:.2}s buffer)",
            params.kind,
            params.x_bias,
            params.y_bias,
            buffer.duration_secs()
        );

        Ok(Self {
            stream: Some(stream),
            buffer,
            params,
            tap,
            analyser,
        })
    }

    pub fn buffer(&self) -> &NoiseBuffer {
        &self.buffer
    }

    pub fn params(&self) -> &NoiseParameters {
        &self.params
    }

    /// Byte spectrum of what the output played most recently
    pub fn frequency_snapshot(&mut self) -> FrequencySnapshot {
        self.analyser.byte_frequency_data()
    }

    /// Stop playback and release the stream, buffer and analyser
    pub fn stop(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("{}", e);
            }
            drop(stream);
            self.tap.clear();
            info!("Stopped {} noise", self.params.kind);
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Owns the output and at most one playing session
pub struct PlaybackController<O: AudioOutput = OutputDevice> {
    output: O,
    generator: NoiseGenerator,
    analyser_config: AnalyserConfig,
    playback: PlaybackConfig,
    volume: Volume,
    session: Option<PlaybackSession>,
}

impl PlaybackController<OutputDevice> {
    /// Open the default output device and prepare a generator at its rate
    pub fn new(
        analyser_config: AnalyserConfig,
        playback: PlaybackConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        let device = OutputDevice::open_default()?;
        Self::with_output(device, analyser_config, playback, seed)
    }
}

impl<O: AudioOutput> PlaybackController<O> {
    pub fn with_output(
        output: O,
        analyser_config: AnalyserConfig,
        playback: PlaybackConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        analyser_config.validate()?;
        playback.validate()?;

        let generator = NoiseGenerator::new(output.sample_rate(), seed)?;
        let volume = Volume::new(playback.volume);

        Ok(Self {
            output,
            generator,
            analyser_config,
            playback,
            volume,
            session: None,
        })
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Parameters of the playing session, if any
    pub fn params(&self) -> Option<&NoiseParameters> {
        self.session.as_ref().map(|s| s.params())
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    /// Change the gain of the playing and all later sessions
    pub fn set_volume(&self, level: f32) -> f32 {
        self.volume.set(level)
    }

    /// Generate and play a buffer; no-op while a session is already playing
    pub fn start(&mut self, params: NoiseParameters) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let buffer = self
            .generator
            .generate_secs(&params, self.playback.buffer_seconds)?;
        let session = PlaybackSession::open(
            &self.output,
            buffer,
            params,
            &self.analyser_config,
            &self.playback,
            self.volume.clone(),
        )?;
        self.session = Some(session);
        Ok(())
    }

    /// Tear down the playing session (if any) and start a fresh one
    pub fn restart(&mut self, params: NoiseParameters) -> Result<()> {
        self.stop();
        self.start(params)
    }

    /// Stop and release the playing session, if any
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop();
        }
    }

    /// Current spectrum, or `None` when nothing is playing
    pub fn frequency_snapshot(&mut self) -> Option<FrequencySnapshot> {
        self.session.as_mut().map(|s| s.frequency_snapshot())
    }
}

impl<O: AudioOutput> Drop for PlaybackController<O> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseType;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Output that records stream lifecycles and keeps every feed
    struct RecordingOutput {
        rate: u32,
        log: Log,
        feeds: Arc<Mutex<Vec<OutputFeed>>>,
    }

    struct RecordedStream {
        id: usize,
        log: Log,
    }

    impl ActiveStream for RecordedStream {
        fn pause(&self) -> Result<()> {
            self.log.lock().unwrap().push(format!("pause {}", self.id));
            Ok(())
        }
    }

    impl Drop for RecordedStream {
        fn drop(&mut self) {
            self.log.lock().unwrap().push(format!("close {}", self.id));
        }
    }

    impl AudioOutput for RecordingOutput {
        fn sample_rate(&self) -> u32 {
            self.rate
        }

        fn start_stream(&self, feed: OutputFeed) -> Result<Box<dyn ActiveStream>> {
            let mut feeds = self.feeds.lock().unwrap();
            feeds.push(feed);
            let id = feeds.len();
            self.log.lock().unwrap().push(format!("open {}", id));
            Ok(Box::new(RecordedStream {
                id,
                log: Arc::clone(&self.log),
            }))
        }
    }

    fn output() -> (RecordingOutput, Log, Arc<Mutex<Vec<OutputFeed>>>) {
        let log = Log::default();
        let feeds = Arc::new(Mutex::new(Vec::new()));
        let output = RecordingOutput {
            rate: 8000,
            log: Arc::clone(&log),
            feeds: Arc::clone(&feeds),
        };
        (output, log, feeds)
    }

    fn controller(output: RecordingOutput) -> PlaybackController<RecordingOutput> {
        let playback = PlaybackConfig {
            buffer_seconds: 0.05,
            ..Default::default()
        };
        PlaybackController::with_output(output, AnalyserConfig::default(), playback, Some(3))
            .unwrap()
    }

    fn params(kind: NoiseType) -> NoiseParameters {
        NoiseParameters::new(kind, 0.2, 0.1).unwrap()
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn cursor(samples: Vec<f32>, looped: bool, limit: f32) -> BufferCursor {
        let playback = PlaybackConfig {
            looped,
            output_limit: limit,
            ..Default::default()
        };
        BufferCursor::new(NoiseBuffer::new(samples, 44100), &playback)
    }

    #[test]
    fn test_cursor_loops_over_buffer() {
        let mut c = cursor(vec![0.1, 0.2, 0.3], true, 1.0);
        let out: Vec<f32> = (0..7).map(|_| c.next_sample(1.0)).collect();
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1]);
    }

    #[test]
    fn test_cursor_goes_silent_without_loop() {
        let mut c = cursor(vec![0.5, -0.5], false, 1.0);
        let out: Vec<f32> = (0..4).map(|_| c.next_sample(1.0)).collect();
        assert_eq!(out, vec![0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_cursor_clamps_to_output_limit() {
        let mut c = cursor(vec![3.2, -1.7, 0.25], true, 1.0);
        let out: Vec<f32> = (0..3).map(|_| c.next_sample(1.0)).collect();
        assert_eq!(out, vec![1.0, -1.0, 0.25]);
    }

    #[test]
    fn test_gain_is_applied_before_clamp() {
        let mut c = cursor(vec![3.0, -0.5], true, 1.0);
        // 3.0 * 0.5 = 1.5 clips to 1.0 (clipping first would give 0.5)
        assert_eq!(c.next_sample(0.5), 1.0);
        assert_eq!(c.next_sample(0.5), -0.25);
    }

    #[test]
    fn test_volume_clamps() {
        let volume = Volume::new(0.5);
        assert_eq!(volume.get(), 0.5);
        assert_eq!(volume.set(1.7), 1.0);
        assert_eq!(volume.step(-0.25), 0.75);
        assert_eq!(volume.set(f32::NAN), 0.0);
        assert_eq!(Volume::new(-2.0).get(), 0.0);
    }

    #[test]
    fn test_feed_duplicates_mono_and_taps_raw_signal() {
        let buffer = NoiseBuffer::new(vec![0.4, 0.8], 44100);
        let tap = SampleTap::new(3);
        let mut feed = OutputFeed {
            cursor: BufferCursor::new(buffer, &PlaybackConfig::default()),
            volume: Volume::new(0.5),
            tap: tap.clone(),
        };
        let mut data = [0.0f32; 6];
        feed.fill(&mut data, 2);
        assert_eq!(data, [0.2, 0.2, 0.4, 0.4, 0.2, 0.2]);

        let mut tapped = [0.0f32; 3];
        tap.copy_latest(&mut tapped);
        assert_eq!(tapped, [0.4, 0.8, 0.4]);
    }

    #[test]
    fn test_start_while_playing_is_a_no_op() {
        let (output, log, _feeds) = output();
        let mut controller = controller(output);

        controller.start(params(NoiseType::Pink)).unwrap();
        controller.start(params(NoiseType::Brown)).unwrap();

        assert_eq!(entries(&log), vec!["open 1"]);
        assert_eq!(controller.params().map(|p| p.kind), Some(NoiseType::Pink));
    }

    #[test]
    fn test_restart_tears_down_before_starting() {
        let (output, log, _feeds) = output();
        let mut controller = controller(output);

        controller.start(params(NoiseType::White)).unwrap();
        controller.restart(params(NoiseType::Brown)).unwrap();

        assert_eq!(entries(&log), vec!["open 1", "pause 1", "close 1", "open 2"]);
        assert_eq!(controller.params().map(|p| p.kind), Some(NoiseType::Brown));

        controller.stop();
        assert!(!controller.is_playing());
        assert!(controller.frequency_snapshot().is_none());
        assert_eq!(entries(&log).len(), 6);
    }

    #[test]
    fn test_dropping_releases_the_stream() {
        let (output, log, _feeds) = output();
        let session = PlaybackSession::open(
            &output,
            NoiseBuffer::new(vec![0.1; 64], 8000),
            params(NoiseType::White),
            &AnalyserConfig::default(),
            &PlaybackConfig::default(),
            Volume::new(1.0),
        )
        .unwrap();
        drop(session);
        assert_eq!(entries(&log), vec!["open 1", "pause 1", "close 1"]);

        let mut controller = controller(output);
        controller.start(params(NoiseType::Pink)).unwrap();
        drop(controller);
        assert_eq!(
            entries(&log),
            vec!["open 1", "pause 1", "close 1", "open 2", "pause 2", "close 2"]
        );
    }

    #[test]
    fn test_volume_changes_while_playing() {
        let (output, _log, feeds) = output();
        let mut controller = controller(output);
        controller.start(params(NoiseType::White)).unwrap();
        let first = controller.session().unwrap().buffer().samples()[0];

        controller.set_volume(0.25);
        let mut data = [0.0f32; 1];
        feeds.lock().unwrap()[0].fill(&mut data, 1);
        assert_eq!(data[0], first * 0.25);
        assert_eq!(controller.volume(), 0.25);
    }

    #[test]
    fn test_rate_mismatch_is_rejected() {
        let (output, log, _feeds) = output();
        let result = PlaybackSession::open(
            &output,
            NoiseBuffer::new(vec![0.1; 64], 44100),
            params(NoiseType::White),
            &AnalyserConfig::default(),
            &PlaybackConfig::default(),
            Volume::new(1.0),
        );
        assert!(result.is_err());
        assert!(entries(&log).is_empty());
    }
}

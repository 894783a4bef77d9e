use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::{AudioCommand, AudioOutput};

pub(crate) mod automation;
mod compressor;
mod engine;
mod filter;
mod voice;

pub use automation::Automation;
pub use filter::FilterSpec;
pub use voice::{Layer, Source, VoiceGraph, Waveform};

use engine::Engine;

const COMMAND_QUEUE: usize = 1024;
pub const DEFAULT_MASTER_GAIN: f32 = 0.8;

// ── Shared handle ─────────────────────────────────────────────────

/// Cloneable view of the audio output that the scheduler and synth hold.
/// Empty until `AudioEngine::init` runs; while empty the clock reads 0 and
/// nothing is played.
#[derive(Clone, Default)]
pub struct AudioBus {
    output: Arc<OnceLock<Arc<dyn AudioOutput>>>,
}

impl AudioBus {
    pub fn new() -> Self {
        Self::default()
    }

    // returns false if an output was already installed (the first one wins).
    pub fn install(&self, output: Arc<dyn AudioOutput>) -> bool {
        self.output.set(output).is_ok()
    }

    pub fn is_ready(&self) -> bool {
        self.output.get().is_some()
    }

    pub fn output(&self) -> Option<&Arc<dyn AudioOutput>> {
        self.output.get()
    }

    pub fn current_time(&self) -> f64 {
        self.output.get().map_or(0.0, |o| o.current_time())
    }
}

// ── Owner ─────────────────────────────────────────────────────────

// owns the output stream. Created cold; `init` opens the device, which
// should wait for the first key press.
pub struct AudioEngine {
    bus: AudioBus,
    master_gain: f32,
    _stream: Option<AudioHandle>, // keeps the device open
}

impl AudioEngine {
    pub fn new(master_gain: f32) -> Self {
        Self { bus: AudioBus::new(), master_gain, _stream: None }
    }

    // already-initialized engine around any output, no device involved
    #[cfg(test)]
    pub(crate) fn with_output(output: Arc<dyn AudioOutput>) -> Self {
        let engine = Self::new(DEFAULT_MASTER_GAIN);
        engine.bus.install(output);
        engine
    }

    pub fn bus(&self) -> AudioBus {
        self.bus.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.bus.is_ready()
    }

    // open the default output device. Calling again once ready does nothing.
    pub fn init(&mut self) -> anyhow::Result<()> {
        if self.bus.is_ready() {
            return Ok(());
        }
        let handle = start_audio(self.master_gain)?;
        log::info!(
            target: "audio",
            "output stream running at {} Hz, master gain {}",
            handle.output.sample_rate(),
            self.master_gain
        );
        self.bus.install(handle.output.clone());
        self._stream = Some(handle);
        Ok(())
    }
}

// ── cpal backed output ────────────────────────────────────────────

pub struct AudioHandle {
    output: Arc<CpalOutput>,
    _output_stream: cpal::Stream,
}

struct CpalOutput {
    tx: Sender<AudioCommand>,
    retired_rx: Receiver<VoiceGraph>,
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl AudioOutput for CpalOutput {
    fn current_time(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn submit(&self, graph: VoiceGraph) {
        // free whatever the engine finished with, out here and not in the callback
        while self.retired_rx.try_recv().is_ok() {}

        if self.tx.try_send(AudioCommand::Play(graph)).is_err() {
            log::warn!(target: "audio", "command queue full, dropping a voice");
        }
    }
}

pub fn start_audio(master_gain: f32) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE);
    let (retired_tx, retired_rx) = crossbeam_channel::bounded::<VoiceGraph>(COMMAND_QUEUE);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    let frames = Arc::new(AtomicU64::new(0));

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let engine = Engine::new(sample_rate, master_gain, Arc::clone(&frames), retired_tx);
            let output_stream = build_output_stream_f32(&device, &config.into(), rx, engine, channels)?;
            output_stream.play().context("failed to play output stream")?;

            Ok(AudioHandle {
                output: Arc::new(CpalOutput { tx, retired_rx, frames, sample_rate }),
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let err_fn = |err| log::error!(target: "audio", "output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }
            engine.render(data, channels);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

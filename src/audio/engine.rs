use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;

use super::compressor::{Compressor, CompressorSettings};
use super::voice::VoiceGraph;
use crate::audio_api::AudioCommand;

const MAX_VOICES: usize = 64; // hard cap so we wont malloc in audio callback
const SCRATCH_FRAMES: usize = 4096;

// Lives inside the cpal callback. Everything it touches is preallocated;
// finished graphs get shipped back to the control side to be freed there.
pub struct Engine {
    sample_rate: f32,
    voices: Vec<VoiceGraph>,
    scratch: Vec<f32>, // mono mix for one chunk
    master_gain: f32,
    compressor: Compressor,
    position: u64, // frames rendered so far, this is the clock
    clock: Arc<AtomicU64>,
    retired: Sender<VoiceGraph>,
}

impl Engine {
    pub fn new(sample_rate: u32, master_gain: f32, clock: Arc<AtomicU64>, retired: Sender<VoiceGraph>) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            voices: Vec::with_capacity(MAX_VOICES),
            scratch: vec![0.0; SCRATCH_FRAMES],
            master_gain,
            compressor: Compressor::new(CompressorSettings::default(), sample_rate as f32),
            position: 0,
            clock,
            retired,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Play(graph) => self.add_voice(graph),
        }
    }

    fn add_voice(&mut self, graph: VoiceGraph) {
        if self.voices.len() >= MAX_VOICES {
            // steal whichever voice started first
            let oldest = self
                .voices
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.start_time().total_cmp(&b.1.start_time()))
                .map(|(i, _)| i)
                .unwrap_or(0);
            let stolen = self.voices.swap_remove(oldest);
            self.retire(stolen);
        }
        self.voices.push(graph);
    }

    fn retire(&self, graph: VoiceGraph) {
        // if the control side isn't draining, dropping here is the lesser evil
        let _ = self.retired.try_send(graph);
    }

    #[cfg(test)]
    fn active_voices(&self) -> usize {
        self.voices.len()
    }

    // fill an interleaved device buffer. Mono mix copied to every channel.
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for chunk in data.chunks_mut(SCRATCH_FRAMES * channels) {
            let frames = chunk.len() / channels;
            let mix = &mut self.scratch[..frames];
            mix.fill(0.0);

            let mut i = 0;
            while i < self.voices.len() {
                if self.voices[i].render_into(mix, self.position, self.sample_rate) {
                    i += 1;
                } else {
                    let done = self.voices.swap_remove(i);
                    let _ = self.retired.try_send(done);
                }
            }

            for (frame, &dry) in chunk.chunks_mut(channels).zip(mix.iter()) {
                let wet = self.compressor.process(dry * self.master_gain).clamp(-1.0, 1.0);
                frame.fill(wet);
            }

            self.position += frames as u64;
        }
        self.clock.store(self.position, Ordering::Release);
    }
}

use arc_swap::ArcSwap;
use log::warn;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use std::f32::consts::PI;
use std::sync::{Arc, Mutex, PoisonError};

use super::NodeId;

pub const FFT_SIZE: usize = 2048;
pub const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
/// Reported for bins with no energy at all.
pub const MIN_DECIBELS: f32 = -200.0;

/// How many samples the audio thread records between snapshots.
const PUBLISH_INTERVAL: usize = 512;

/// A frequency-analysis unit. Audio passes through unchanged.
///
/// The audio thread records into an [`AnalyserTap`] and publishes the most
/// recent `FFT_SIZE` samples; readers turn that snapshot into a spectrum on
/// demand. Cloning shares both the snapshot and the smoothing state.
#[derive(Clone)]
pub struct AnalyserNode {
    id: NodeId,
    snapshot: Arc<ArcSwap<Vec<f32>>>,
    spectrum: Arc<Mutex<SpectrumState>>,
}

impl std::fmt::Debug for AnalyserNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyserNode").field("id", &self.id).finish()
    }
}

impl AnalyserNode {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            snapshot: Arc::new(ArcSwap::from_pointee(vec![0.0; FFT_SIZE])),
            spectrum: Arc::new(Mutex::new(SpectrumState::new())),
        }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub const fn fft_size(&self) -> usize {
        FFT_SIZE
    }

    pub const fn frequency_bin_count(&self) -> usize {
        FFT_SIZE / 2
    }

    /// The last `FFT_SIZE` samples that went through the node, oldest first.
    pub fn time_domain_data(&self) -> Arc<Vec<f32>> {
        self.snapshot.load_full()
    }

    /// Writes the smoothed spectrum in decibels, one value per bin.
    ///
    /// Only `min(out.len(), frequency_bin_count())` entries are written.
    pub fn float_frequency_data(&self, out: &mut [f32]) {
        let samples = self.snapshot.load();
        let mut state = self
            .spectrum
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        state.analyse(&samples, out);
    }

    pub(crate) fn tap(&self) -> AnalyserTap {
        AnalyserTap::new(Arc::clone(&self.snapshot))
    }
}

struct SpectrumState {
    r2c: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    output: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl SpectrumState {
    fn new() -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(FFT_SIZE);
        let input = r2c.make_input_vec();
        let output = r2c.make_output_vec();
        let scratch = r2c.make_scratch_vec();

        Self {
            r2c,
            window: blackman_window(FFT_SIZE),
            input,
            output,
            scratch,
            smoothed: vec![0.0; FFT_SIZE / 2],
        }
    }

    fn analyse(&mut self, samples: &[f32], out: &mut [f32]) {
        for ((dst, &sample), &w) in self.input.iter_mut().zip(samples).zip(&self.window) {
            *dst = sample * w;
        }

        if let Err(e) =
            self.r2c
                .process_with_scratch(&mut self.input, &mut self.output, &mut self.scratch)
        {
            warn!("Analyser FFT failed: {e}");
            out.fill(MIN_DECIBELS);
            return;
        }

        let scale = 1.0 / FFT_SIZE as f32;
        for (prev, bin) in self.smoothed.iter_mut().zip(&self.output) {
            let magnitude = bin.norm() * scale;
            *prev = SMOOTHING_TIME_CONSTANT.mul_add(*prev, (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude);
        }

        for (dst, &magnitude) in out.iter_mut().zip(&self.smoothed) {
            *dst = (20.0 * magnitude.log10()).max(MIN_DECIBELS);
        }
    }
}

fn blackman_window(len: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;

    (0..len)
        .map(|n| {
            let x = 2.0 * PI * n as f32 / len as f32;
            A2.mul_add((2.0 * x).cos(), A0 - A1 * x.cos())
        })
        .collect()
}

/// Audio-thread half of an [`AnalyserNode`].
pub(crate) struct AnalyserTap {
    ring: Vec<f32>,
    write_pos: usize,
    since_publish: usize,
    snapshot: Arc<ArcSwap<Vec<f32>>>,
}

impl AnalyserTap {
    fn new(snapshot: Arc<ArcSwap<Vec<f32>>>) -> Self {
        // Start from the published history so a plan rebuild keeps continuity
        let ring = snapshot.load().as_ref().clone();

        Self {
            ring,
            write_pos: 0,
            since_publish: 0,
            snapshot,
        }
    }

    pub(crate) fn process(&mut self, block: &[f32]) {
        for &sample in block {
            self.ring[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % FFT_SIZE;
            self.since_publish += 1;

            if self.since_publish >= PUBLISH_INTERVAL {
                self.since_publish = 0;
                self.publish();
            }
        }
    }

    fn publish(&self) {
        let mut ordered = Vec::with_capacity(FFT_SIZE);
        ordered.extend_from_slice(&self.ring[self.write_pos..]);
        ordered.extend_from_slice(&self.ring[..self.write_pos]);
        self.snapshot.store(Arc::new(ordered));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (2.0 * PI * freq * n as f32 / SAMPLE_RATE).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_silence_reports_floor() {
        let node = AnalyserNode::new(NodeId(0));
        let mut out = vec![0.0; node.frequency_bin_count()];
        node.float_frequency_data(&mut out);

        assert!(out.iter().all(|&db| db == MIN_DECIBELS));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let node = AnalyserNode::new(NodeId(0));
        let mut tap = node.tap();
        tap.process(&sine(1000.0, FFT_SIZE * 2));

        let mut out = vec![0.0; node.frequency_bin_count()];
        node.float_frequency_data(&mut out);

        let (peak_bin, _) = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        let bin_width = SAMPLE_RATE / FFT_SIZE as f32;
        let peak_freq = peak_bin as f32 * bin_width;

        assert!(
            (peak_freq - 1000.0).abs() <= 2.0 * bin_width,
            "peak at {peak_freq} Hz"
        );
    }

    #[test]
    fn test_tap_publishes_in_order() {
        let node = AnalyserNode::new(NodeId(0));
        let mut tap = node.tap();

        let ramp: Vec<f32> = (0..FFT_SIZE + PUBLISH_INTERVAL)
            .map(|n| n as f32)
            .collect();
        tap.process(&ramp);

        let snapshot = node.time_domain_data();
        assert_eq!(snapshot.len(), FFT_SIZE);
        assert_eq!(snapshot[0], PUBLISH_INTERVAL as f32);
        assert_eq!(snapshot[FFT_SIZE - 1], (FFT_SIZE + PUBLISH_INTERVAL - 1) as f32);
    }

    #[test]
    fn test_new_tap_keeps_history() {
        let node = AnalyserNode::new(NodeId(0));
        node.tap().process(&vec![0.25; FFT_SIZE]);

        let tap = node.tap();
        assert!(tap.ring.iter().all(|&s| s == 0.25));
    }
}

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, Sender, bounded, select, tick};
use log::{debug, error};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::graph::{AnalyserNode, AudioGraph};
use crate::utils::map_value;

pub const DEFAULT_REFRESH_RATE_HZ: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencySample {
    /// Centre frequency of the bin in Hz.
    pub frequency: f32,
    /// Level in dB.
    pub volume: f32,
}

/// Publishes the spectrum of the signal passing through it.
///
/// A refresh task owned by the effect resamples the analyser at the display
/// refresh rate. Dropping the effect stops and joins the task.
pub struct FrequencyVisualiserEffect {
    id: String,
    node: AnalyserNode,
    sample_rate: f32,
    refresh_rate_hz: u32,
    frequencies: Arc<ArcSwap<Vec<FrequencySample>>>,
    refresh: Option<RefreshTask>,
}

impl FrequencyVisualiserEffect {
    pub fn new(graph: &dyn AudioGraph, id: impl Into<String>) -> Result<Self> {
        Self::with_refresh_rate(graph, id, DEFAULT_REFRESH_RATE_HZ)
    }

    pub fn with_refresh_rate(
        graph: &dyn AudioGraph,
        id: impl Into<String>,
        refresh_rate_hz: u32,
    ) -> Result<Self> {
        let id = id.into();
        let refresh_rate_hz = refresh_rate_hz.max(1);
        let node = graph.create_analyser();
        let sample_rate = graph.sample_rate();
        let frequencies = Arc::new(ArcSwap::from_pointee(Vec::new()));
        let interval = Duration::from_secs_f64(1.0 / f64::from(refresh_rate_hz));

        let refresh = match RefreshTask::spawn(
            &id,
            node.clone(),
            sample_rate,
            Arc::clone(&frequencies),
            interval,
        ) {
            Ok(refresh) => refresh,
            Err(e) => {
                graph.remove(node.id());
                return Err(e);
            }
        };

        Ok(Self {
            id,
            node,
            sample_rate,
            refresh_rate_hz,
            frequencies,
            refresh: Some(refresh),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn node(&self) -> &AnalyserNode {
        &self.node
    }

    pub const fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub const fn refresh_rate_hz(&self) -> u32 {
        self.refresh_rate_hz
    }

    /// The latest published spectrum, lowest frequency first.
    pub fn frequencies(&self) -> Arc<Vec<FrequencySample>> {
        self.frequencies.load_full()
    }
}

impl Drop for FrequencyVisualiserEffect {
    fn drop(&mut self) {
        if let Some(task) = self.refresh.take() {
            task.stop();
        }
    }
}

/// Reads the analyser into `buffer` and pairs each bin with its frequency.
pub fn sample_frequencies(
    node: &AnalyserNode,
    sample_rate: f32,
    buffer: &mut [f32],
) -> Vec<FrequencySample> {
    node.float_frequency_data(buffer);

    let len = buffer.len() as f32;
    buffer
        .iter()
        .enumerate()
        .map(|(i, &volume)| FrequencySample {
            frequency: map_value(i as f32, (0.0, len), (0.0, sample_rate / 2.0)),
            volume,
        })
        .collect()
}

struct RefreshTask {
    tx_stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    fn spawn(
        id: &str,
        node: AnalyserNode,
        sample_rate: f32,
        frequencies: Arc<ArcSwap<Vec<FrequencySample>>>,
        interval: Duration,
    ) -> Result<Self> {
        let (tx_stop, rx_stop) = bounded(1);

        let handle = thread::Builder::new()
            .name(format!("visualiser-{id}"))
            .spawn(move || run(&node, sample_rate, &frequencies, interval, &rx_stop))
            .context("failed to spawn visualiser refresh thread")?;

        Ok(Self { tx_stop, handle })
    }

    fn stop(self) {
        let _ = self.tx_stop.try_send(());
        if self.handle.join().is_err() {
            error!("Visualiser refresh thread panicked");
        }
    }
}

fn run(
    node: &AnalyserNode,
    sample_rate: f32,
    frequencies: &ArcSwap<Vec<FrequencySample>>,
    interval: Duration,
    rx_stop: &Receiver<()>,
) {
    let ticker = tick(interval);
    let mut buffer = vec![0.0; node.frequency_bin_count()];

    debug!("Visualiser refresh started for {}", node.id());

    loop {
        select! {
            recv(rx_stop) -> _ => break,
            recv(ticker) -> _ => {
                let samples = sample_frequencies(node, sample_rate, &mut buffer);
                frequencies.store(Arc::new(samples));
            }
        }
    }

    debug!("Visualiser refresh stopped for {}", node.id());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use std::time::Instant;

    const SAMPLE_RATE: usize = 48_000;

    #[test]
    fn test_sample_frequencies_maps_bins_to_nyquist() {
        let (graph, _renderer) = Graph::new(SAMPLE_RATE, 128);
        let node = graph.create_analyser();
        let mut buffer = vec![0.0; node.frequency_bin_count()];

        let samples = sample_frequencies(&node, SAMPLE_RATE as f32, &mut buffer);

        assert_eq!(samples.len(), 1024);
        assert_eq!(samples[0].frequency, 0.0);
        assert_eq!(samples[512].frequency, 12_000.0);
        assert!(samples.windows(2).all(|w| w[1].frequency > w[0].frequency));
    }

    #[test]
    fn test_refresh_task_publishes() -> Result<()> {
        let (graph, _renderer) = Graph::new(SAMPLE_RATE, 128);
        let effect = FrequencyVisualiserEffect::with_refresh_rate(&graph, "0", 200)?;

        let deadline = Instant::now() + Duration::from_secs(5);
        while effect.frequencies().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(effect.frequencies().len(), effect.node().frequency_bin_count());
        Ok(())
    }

    #[test]
    fn test_refresh_rate_is_at_least_one_hz() -> Result<()> {
        let (graph, _renderer) = Graph::new(SAMPLE_RATE, 128);

        assert_eq!(FrequencyVisualiserEffect::with_refresh_rate(&graph, "0", 0)?.refresh_rate_hz(), 1);
        assert_eq!(FrequencyVisualiserEffect::with_refresh_rate(&graph, "1", 30)?.refresh_rate_hz(), 30);
        Ok(())
    }

    #[test]
    fn test_drop_stops_refresh_task() -> Result<()> {
        let (graph, _renderer) = Graph::new(SAMPLE_RATE, 128);
        let effect = FrequencyVisualiserEffect::new(&graph, "0")?;
        let frequencies = Arc::clone(&effect.frequencies);

        drop(effect);

        // The joined thread released its handle on the shared spectrum
        assert_eq!(Arc::strong_count(&frequencies), 1);
        Ok(())
    }
}

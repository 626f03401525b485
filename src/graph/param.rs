use std::sync::atomic::{AtomicU32, Ordering};

/// A live `f32` parameter shared between the control and audio threads.
///
/// Writes are picked up by the next rendered block without smoothing.
#[derive(Debug)]
pub struct AudioParam {
    bits: AtomicU32,
}

impl AudioParam {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_value(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

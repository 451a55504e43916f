//! Small utilities to manage bounded history buffers for charts.

use std::collections::VecDeque;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if dq.len() == cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

// Keeps a history deque per core with a fixed capacity
pub struct PerCoreHistory {
    pub deques: Vec<VecDeque<u64>>,
    cap: usize,
}

impl PerCoreHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            deques: Vec::new(),
            cap,
        }
    }

    // Push a new sample set for all cores (values 0..=100); resets on core count change
    pub fn push_samples(&mut self, samples: &[f64]) {
        if self.deques.len() != samples.len() {
            self.deques = (0..samples.len())
                .map(|_| VecDeque::with_capacity(self.cap))
                .collect();
        }
        for (dq, v) in self.deques.iter_mut().zip(samples) {
            push_capped(dq, v.clamp(0.0, 100.0).round() as u64, self.cap);
        }
    }
}

//! Progress bar projection.
//!
//! Ratios are recomputed from controller state on every read and never
//! stored, so bars cannot drift from the controller.

/// Fill ratio of bar `index` given the current position.
pub fn fill_ratio(index: usize, current_index: usize, elapsed_ms: u64, duration_ms: u64) -> f32 {
    use std::cmp::Ordering;
    match index.cmp(&current_index) {
        Ordering::Less => 1.0,
        Ordering::Greater => 0.0,
        Ordering::Equal => {
            if duration_ms == 0 {
                return 0.0;
            }
            (elapsed_ms as f64 / duration_ms as f64).clamp(0.0, 1.0) as f32
        }
    }
}

/// One ratio per queue slot.
pub fn progress_ratios(len: usize, current_index: usize, elapsed_ms: u64, duration_ms: u64) -> Vec<f32> {
    (0..len)
        .map(|i| fill_ratio(i, current_index, elapsed_ms, duration_ms))
        .collect()
}

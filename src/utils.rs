use rand::Rng;

/// Draws `⌊random() * len⌋` with random() uniform in [0, 1).
/// `len` must be non-zero.
pub fn random_offset<R: Rng>(rng: &mut R, len: u64) -> u64 {
    offset_for(rng.gen::<f64>(), len)
}

/// Scales a unit sample onto `0..len`. Clamped so float rounding never lands on `len`.
pub fn offset_for(sample: f64, len: u64) -> u64 {
    let scaled = (sample * len as f64).floor() as u64;
    scaled.min(len.saturating_sub(1))
}

// Minimal PRNG (no external crates).
//
// This is NOT cryptographically secure.
// It drives update order and stochastic activation, and makes recall reproducible.

/// Source of randomness consumed by relaxation.
///
/// Anything that can produce uniform draws works; tests use a seeded [`Prng`].
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_f64_01(&mut self) -> f64;

    /// Uniform integer in `[low, high)`. Returns `low` when the range is empty.
    fn gen_range_usize(&mut self, low: usize, high: usize) -> usize;

    /// In-place Fisher-Yates shuffle.
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.gen_range_usize(0, i + 1);
            items.swap(i, j);
        }
    }

    /// A uniformly random permutation of `0..n`.
    fn permutation(&mut self, n: usize) -> Vec<usize>
    where
        Self: Sized,
    {
        let mut order: Vec<usize> = (0..n).collect();
        self.shuffle(&mut order);
        order
    }
}

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    /// Seed from the wall clock. Only for interactive use; tests should pass a seed.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos)
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }
}

impl RandomSource for Prng {
    #[inline]
    fn next_f64_01(&mut self) -> f64 {
        // Top 53 bits -> [0,1).
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    #[inline]
    fn gen_range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = (high - low) as u64;
        low + (self.next_u64() % span) as usize
    }
}

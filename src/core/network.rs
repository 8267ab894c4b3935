use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pattern::{Cell, Pattern, PatternStore};
use crate::prng::{Prng, RandomSource};

/// Type alias for connection weights.
pub type Weight = f64;

/// Type alias for network energy (lower is more stable).
pub type Energy = f64;

/// Relaxation passes `run` allows before giving up on a fixed point.
pub const DEFAULT_MAX_CYCLES: usize = 10;

/// Patterns per neuron a Hebbian memory holds before recall degrades.
pub const CAPACITY_RATIO: f64 = 0.138;

/// Per-neuron decision applied during a relaxation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UpdateRule {
    /// Hard threshold: +1 when the net input is >= 0, otherwise -1.
    #[default]
    Deterministic,
    /// Boltzmann-style: +1 with probability `sigmoid(net_input)`.
    Stochastic,
}

impl UpdateRule {
    /// New state for a neuron receiving `net_input`.
    ///
    /// A net input of exactly zero resolves to +1 under the deterministic rule.
    #[inline]
    pub fn activate<R: RandomSource>(self, net_input: f64, rng: &mut R) -> Cell {
        match self {
            Self::Deterministic => {
                if net_input >= 0.0 {
                    1
                } else {
                    -1
                }
            }
            Self::Stochastic => {
                if rng.next_f64_01() < sigmoid(net_input) {
                    1
                } else {
                    -1
                }
            }
        }
    }
}

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MemoryConfig {
    /// Flattened pattern length; the weight matrix is `num_neurons x num_neurons`.
    pub num_neurons: usize,

    /// Upper bound on relaxation passes per recall.
    pub max_cycles: usize,

    pub rule: UpdateRule,

    // If set, makes recall reproducible.
    pub seed: Option<u64>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            num_neurons: 64,
            max_cycles: DEFAULT_MAX_CYCLES,
            rule: UpdateRule::Deterministic,
            seed: None,
        }
    }
}

impl MemoryConfig {
    /// Minimum allowed neuron count.
    ///
    /// A single neuron has no connections, so its net input is always 0 and the tie rule
    /// forces it to +1: a stored `[-1]` could never be recalled.
    pub const MIN_NEURONS: usize = 2;

    pub fn with_neurons(num_neurons: usize) -> Self {
        Self {
            num_neurons,
            ..Default::default()
        }
    }

    /// Validate the configuration, returning an error message if invalid.
    pub fn validate(&self) -> core::result::Result<(), &'static str> {
        if self.num_neurons < Self::MIN_NEURONS {
            return Err("num_neurons must be >= 2 (a lone neuron always ties to +1)");
        }
        if self
            .num_neurons
            .checked_mul(self.num_neurons)
            .and_then(|cells| cells.checked_mul(core::mem::size_of::<Weight>()))
            .is_none()
        {
            return Err("num_neurons overflows the weight matrix size");
        }
        Ok(())
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_rule(mut self, rule: UpdateRule) -> Self {
        self.rule = rule;
        self
    }

    /// Set the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Generator for this config: seeded when `seed` is set, clock-seeded otherwise.
    pub fn rng(&self) -> Prng {
        match self.seed {
            Some(seed) => Prng::new(seed),
            None => Prng::from_clock(),
        }
    }

    /// Bytes taken by the dense weight matrix.
    pub fn estimated_memory_bytes(&self) -> usize {
        self.num_neurons * self.num_neurons * core::mem::size_of::<Weight>()
    }
}

/// Dense square weight matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    size: usize,
    data: Vec<Weight>,
}

impl WeightMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// Hebbian rule: `W = (1/P) * sum_p outer(p, p)` with a zeroed diagonal.
    ///
    /// Every pattern must have exactly `size` cells and `patterns` must be non-empty.
    fn hebbian(size: usize, patterns: &[&[Cell]]) -> Self {
        let mut w = Self::zeros(size);
        for p in patterns {
            for (i, &pi) in p.iter().enumerate() {
                let row = &mut w.data[i * size..(i + 1) * size];
                for (wij, &pj) in row.iter_mut().zip(p.iter()) {
                    *wij += f64::from(pi) * f64::from(pj);
                }
            }
        }
        for i in 0..size {
            w.data[i * size + i] = 0.0;
        }
        let scale = 1.0 / patterns.len() as f64;
        for wij in &mut w.data {
            *wij *= scale;
        }
        w
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Weight {
        self.data[i * self.size + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[Weight] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }

    pub fn has_zero_diagonal(&self) -> bool {
        (0..self.size).all(|i| self.get(i, i) == 0.0)
    }

    /// Mean |w_ij| over the off-diagonal entries.
    pub fn mean_abs_off_diagonal(&self) -> f64 {
        let n = self.size;
        if n < 2 {
            return 0.0;
        }
        let total: f64 = self.data.iter().map(|w| w.abs()).sum();
        // Diagonal entries are zero, so they add nothing to the total.
        total / (n * (n - 1)) as f64
    }
}

#[inline]
fn net_input(row: &[Weight], state: &[Cell]) -> f64 {
    row.iter().zip(state).map(|(w, &s)| w * f64::from(s)).sum()
}

/// `E = -0.5 * s^T W s`. Lengths must already agree.
fn quadratic_energy(weights: &WeightMatrix, state: &[Cell]) -> Energy {
    let mut acc = 0.0;
    for (i, &si) in state.iter().enumerate() {
        acc += f64::from(si) * net_input(weights.row(i), state);
    }
    // Adding 0.0 turns -0.0 into 0.0.
    -0.5 * acc + 0.0
}

/// One asynchronous relaxation pass over `state`, in place.
///
/// Neurons are visited in a random permutation drawn from `rng`; each one sees the
/// values already updated earlier in the same pass.
pub fn relax_pass<R: RandomSource>(
    weights: &WeightMatrix,
    rule: UpdateRule,
    state: &mut [Cell],
    rng: &mut R,
) -> Result<()> {
    if state.len() != weights.size() {
        return Err(Error::DimensionMismatch {
            expected: weights.size(),
            actual: state.len(),
        });
    }
    for i in rng.permutation(state.len()) {
        let h = net_input(weights.row(i), state);
        state[i] = rule.activate(h, rng);
    }
    Ok(())
}

/// Outcome of a multi-pass recall.
#[derive(Debug, Clone, PartialEq)]
pub struct Recall {
    /// Final state, in the probe's grid shape.
    pub pattern: Pattern,
    /// Passes actually executed.
    pub cycles: usize,
    /// True when the last pass left the state unchanged.
    pub converged: bool,
    /// Energy of the probe followed by the energy after each pass.
    pub energies: Vec<Energy>,
}

impl Recall {
    pub fn initial_energy(&self) -> Energy {
        self.energies.first().copied().unwrap_or_default()
    }

    pub fn final_energy(&self) -> Energy {
        self.energies.last().copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    pub num_neurons: usize,
    pub trained_patterns: usize,
    /// Approximate number of patterns that can be stored reliably (`0.138 * N`, at least 1).
    /// The ratio is an asymptotic result; for small networks it is only a rough hint.
    pub capacity: usize,
    pub overloaded: bool,
    pub mean_abs_weight: f64,
}

/// Best match of a state against a list of patterns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    /// Normalized dot product in [-1, 1]; -1 means the exact inversion.
    pub overlap: f64,
}

/// Normalized dot product `sum(a_i * b_i) / N`. Patterns must have the same length.
pub fn overlap(a: &Pattern, b: &Pattern) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 0.0;
    }
    let dot: i64 = a
        .cells()
        .iter()
        .zip(b.cells())
        .map(|(&x, &y)| i64::from(x) * i64::from(y))
        .sum();
    dot as f64 / a.len() as f64
}

/// Stored pattern with the largest |overlap| against `pattern`. Inversions count as
/// matches and show up with a negative overlap. Patterns of another length are skipped.
pub fn closest_match(pattern: &Pattern, stored: &[Pattern]) -> Option<Match> {
    let mut best: Option<Match> = None;
    for (index, candidate) in stored.iter().enumerate() {
        if candidate.len() != pattern.len() {
            continue;
        }
        let m = overlap(pattern, candidate);
        if best.is_none_or(|b| m.abs() > b.overlap.abs()) {
            best = Some(Match { index, overlap: m });
        }
    }
    best
}

/// Hopfield associative memory: a Hebbian weight matrix plus a relaxation rule.
///
/// The stochastic (Boltzmann-style) variant is the same memory configured with
/// [`UpdateRule::Stochastic`].
#[derive(Debug, Clone)]
pub struct AssociativeMemory {
    cfg: MemoryConfig,
    weights: WeightMatrix,
    trained_patterns: usize,
}

impl AssociativeMemory {
    pub fn new(cfg: MemoryConfig) -> Result<Self> {
        cfg.validate().map_err(Error::InvalidConfig)?;
        Ok(Self {
            weights: WeightMatrix::zeros(cfg.num_neurons),
            cfg,
            trained_patterns: 0,
        })
    }

    /// Deterministic memory with default settings.
    pub fn with_neurons(num_neurons: usize) -> Result<Self> {
        Self::new(MemoryConfig::with_neurons(num_neurons))
    }

    /// Stochastic memory with default settings.
    pub fn stochastic(num_neurons: usize) -> Result<Self> {
        Self::new(MemoryConfig::with_neurons(num_neurons).with_rule(UpdateRule::Stochastic))
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.cfg
    }

    pub fn num_neurons(&self) -> usize {
        self.cfg.num_neurons
    }

    pub fn rule(&self) -> UpdateRule {
        self.cfg.rule
    }

    /// Switch the update rule. The trained weights are kept.
    pub fn set_rule(&mut self, rule: UpdateRule) {
        self.cfg.rule = rule;
    }

    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }

    pub fn trained_patterns(&self) -> usize {
        self.trained_patterns
    }

    /// Rebuild the weight matrix from `patterns`.
    ///
    /// The previous matrix is discarded, not merged: to add memories, pass the full
    /// cumulative set. On error the previous matrix is left untouched.
    pub fn train(&mut self, patterns: &[Pattern]) -> Result<()> {
        if patterns.is_empty() {
            return Err(Error::InvalidInput("cannot train on an empty pattern set"));
        }
        for p in patterns {
            self.check_len(p.len())?;
        }

        let cells: Vec<&[Cell]> = patterns.iter().map(Pattern::cells).collect();
        self.weights = WeightMatrix::hebbian(self.cfg.num_neurons, &cells);
        self.trained_patterns = patterns.len();

        debug!(
            neurons = self.cfg.num_neurons,
            patterns = patterns.len(),
            "trained hebbian weights"
        );
        Ok(())
    }

    /// Train on everything in a store.
    pub fn train_store(&mut self, store: &PatternStore) -> Result<()> {
        self.train(store.patterns())
    }

    /// One asynchronous pass over a copy of `pattern`, returned in the same shape.
    pub fn step<R: RandomSource>(&self, pattern: &Pattern, rng: &mut R) -> Result<Pattern> {
        self.check_len(pattern.len())?;
        let mut state = pattern.cells().to_vec();
        relax_pass(&self.weights, self.cfg.rule, &mut state, rng)?;
        Ok(Pattern::from_bipolar(
            pattern.rows(),
            pattern.columns(),
            state,
        ))
    }

    /// Relax `pattern` for at most `max_cycles` passes and return the final state.
    pub fn run<R: RandomSource>(
        &self,
        pattern: &Pattern,
        max_cycles: usize,
        rng: &mut R,
    ) -> Result<Pattern> {
        Ok(self.recall(pattern, max_cycles, rng)?.pattern)
    }

    /// Relax `pattern` until a pass changes nothing or `max_cycles` passes have run.
    ///
    /// Hitting the cycle limit is not an error; `converged` is false in that case.
    pub fn recall<R: RandomSource>(
        &self,
        pattern: &Pattern,
        max_cycles: usize,
        rng: &mut R,
    ) -> Result<Recall> {
        self.check_len(pattern.len())?;

        let mut state = pattern.cells().to_vec();
        let mut next = state.clone();
        let mut energies = Vec::with_capacity(max_cycles + 1);
        energies.push(quadratic_energy(&self.weights, &state));

        let mut cycles = 0;
        let mut converged = false;
        while cycles < max_cycles {
            next.copy_from_slice(&state);
            relax_pass(&self.weights, self.cfg.rule, &mut next, rng)?;
            cycles += 1;

            let e = quadratic_energy(&self.weights, &next);
            energies.push(e);
            trace!(cycle = cycles, energy = e, "relaxation pass");

            let fixed = next == state;
            core::mem::swap(&mut state, &mut next);
            if fixed {
                converged = true;
                break;
            }
        }

        debug!(
            cycles,
            converged,
            energy = energies.last().copied().unwrap_or_default(),
            rule = ?self.cfg.rule,
            "recall finished"
        );

        Ok(Recall {
            pattern: Pattern::from_bipolar(pattern.rows(), pattern.columns(), state),
            cycles,
            converged,
            energies,
        })
    }

    pub fn energy(&self, pattern: &Pattern) -> Result<Energy> {
        self.energy_of(pattern.cells())
    }

    /// Energy of a flat bipolar state.
    pub fn energy_of(&self, state: &[Cell]) -> Result<Energy> {
        self.check_len(state.len())?;
        Ok(quadratic_energy(&self.weights, state))
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let capacity = ((CAPACITY_RATIO * self.cfg.num_neurons as f64) as usize).max(1);
        Diagnostics {
            num_neurons: self.cfg.num_neurons,
            trained_patterns: self.trained_patterns,
            capacity,
            overloaded: self.trained_patterns > capacity,
            mean_abs_weight: self.weights.mean_abs_off_diagonal(),
        }
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.cfg.num_neurons {
            return Err(Error::DimensionMismatch {
                expected: self.cfg.num_neurons,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_pattern(rng: &mut Prng, rows: usize, columns: usize) -> Pattern {
        let cells: Vec<i32> = (0..rows * columns)
            .map(|_| if rng.next_f64_01() < 0.5 { 1 } else { -1 })
            .collect();
        Pattern::from_cells(rows, columns, &cells).unwrap()
    }

    fn reference_memory() -> AssociativeMemory {
        let mut mem = AssociativeMemory::with_neurons(4).unwrap();
        let patterns = [
            Pattern::from_rows(&[[1, 1, 1, -1]]).unwrap(),
            Pattern::from_rows(&[[-1, -1, -1, 1]]).unwrap(),
        ];
        mem.train(&patterns).unwrap();
        mem
    }

    fn glyph(rows: [[i32; 5]; 5]) -> Pattern {
        // Glyphs are drawn with 1/0; 0 becomes -1.
        Pattern::from_rows(&rows).unwrap()
    }

    #[test]
    fn training_yields_symmetric_matrix_with_zero_diagonal() {
        let mut rng = Prng::new(21);
        for count in 1..=5 {
            let patterns: Vec<Pattern> = (0..count)
                .map(|_| random_pattern(&mut rng, 3, 4))
                .collect();
            let mut mem = AssociativeMemory::with_neurons(12).unwrap();
            mem.train(&patterns).unwrap();
            assert!(mem.weights().is_symmetric());
            assert!(mem.weights().has_zero_diagonal());
            assert_eq!(mem.trained_patterns(), count);
        }
    }

    #[test]
    fn weights_are_averaged_outer_products() {
        let p = Pattern::from_rows(&[[1, -1, 1]]).unwrap();
        let q = Pattern::from_rows(&[[1, 1, -1]]).unwrap();
        let mut mem = AssociativeMemory::with_neurons(3).unwrap();
        mem.train(&[p.clone(), q.clone()]).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j {
                    0.0
                } else {
                    let (pi, pj) = (p.cells()[i] as f64, p.cells()[j] as f64);
                    let (qi, qj) = (q.cells()[i] as f64, q.cells()[j] as f64);
                    (pi * pj + qi * qj) / 2.0
                };
                assert_eq!(mem.weights().get(i, j), expected);
            }
        }

        // Storing a pattern twice does not change the normalized matrix.
        let mut once = AssociativeMemory::with_neurons(3).unwrap();
        once.train(core::slice::from_ref(&p)).unwrap();
        let mut twice = AssociativeMemory::with_neurons(3).unwrap();
        twice.train(&[p.clone(), p]).unwrap();
        assert_eq!(once.weights(), twice.weights());
    }

    #[test]
    fn empty_training_set_is_rejected_and_keeps_weights() {
        let mut mem = reference_memory();
        let before = mem.weights().clone();
        assert_eq!(
            mem.train(&[]).unwrap_err(),
            Error::InvalidInput("cannot train on an empty pattern set")
        );
        assert_eq!(mem.weights(), &before);
        assert_eq!(mem.trained_patterns(), 2);
    }

    #[test]
    fn wrong_length_training_pattern_keeps_weights() {
        let mut mem = reference_memory();
        let before = mem.weights().clone();
        let patterns = [
            Pattern::from_rows(&[[1, 1, -1, -1]]).unwrap(),
            Pattern::from_rows(&[[1, 1, -1]]).unwrap(),
        ];
        assert_eq!(
            mem.train(&patterns).unwrap_err(),
            Error::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        );
        assert_eq!(mem.weights(), &before);
    }

    #[test]
    fn retraining_replaces_previous_memories() {
        let mut rng = Prng::new(8);
        let a: Vec<Pattern> = (0..3).map(|_| random_pattern(&mut rng, 2, 5)).collect();
        let b: Vec<Pattern> = (0..2).map(|_| random_pattern(&mut rng, 2, 5)).collect();

        let mut retrained = AssociativeMemory::with_neurons(10).unwrap();
        retrained.train(&a).unwrap();
        retrained.train(&b).unwrap();

        let mut fresh = AssociativeMemory::with_neurons(10).unwrap();
        fresh.train(&b).unwrap();

        assert_eq!(retrained.weights(), fresh.weights());
        assert_eq!(retrained.trained_patterns(), 2);
    }

    #[test]
    fn single_stored_pattern_is_a_fixed_point() {
        let mut rng = Prng::new(1234);
        for n in 2..=16 {
            for _ in 0..8 {
                let p = random_pattern(&mut rng, 1, n);
                let mut mem = AssociativeMemory::with_neurons(n).unwrap();
                mem.train(core::slice::from_ref(&p)).unwrap();
                assert_eq!(mem.step(&p, &mut rng).unwrap(), p);
                assert_eq!(mem.step(&p.inverted(), &mut rng).unwrap(), p.inverted());
            }
        }
    }

    #[test]
    fn zero_net_input_resolves_to_plus_one() {
        // Untrained weights are all zero, so every neuron sees a tie.
        let mem = AssociativeMemory::with_neurons(6).unwrap();
        let probe = Pattern::from_rows(&[[-1, -1, -1], [1, -1, 1]]).unwrap();
        let out = mem.step(&probe, &mut Prng::new(2)).unwrap();
        assert!(out.cells().iter().all(|&c| c == 1));
        assert_eq!((out.rows(), out.columns()), (2, 3));
    }

    #[test]
    fn reference_probe_falls_into_stored_pattern() {
        let mem = reference_memory();
        let probe = Pattern::from_rows(&[[-1, -1, 1, 1]]).unwrap();

        for seed in 1..=20 {
            let recall = mem.recall(&probe, DEFAULT_MAX_CYCLES, &mut Prng::new(seed)).unwrap();
            assert_eq!(recall.pattern.cells(), &[-1, -1, -1, 1]);
            assert!(recall.converged);
            assert_eq!(recall.cycles, 2);
            assert_eq!(recall.initial_energy(), 0.0);
            assert_eq!(recall.final_energy(), -6.0);
            assert_eq!(mem.energy(&recall.pattern).unwrap(), -6.0);
        }
    }

    #[test]
    fn stored_pattern_is_recalled_in_one_cycle() {
        let mem = reference_memory();
        let stored = Pattern::from_rows(&[[1, 1, 1, -1]]).unwrap();
        let recall = mem.recall(&stored, DEFAULT_MAX_CYCLES, &mut Prng::new(5)).unwrap();
        assert_eq!(recall.pattern, stored);
        assert_eq!(recall.cycles, 1);
        assert!(recall.converged);
    }

    #[test]
    fn deterministic_energy_never_increases() {
        let mut rng = Prng::new(77);
        let patterns: Vec<Pattern> = (0..3).map(|_| random_pattern(&mut rng, 5, 5)).collect();
        let mut mem = AssociativeMemory::with_neurons(25).unwrap();
        mem.train(&patterns).unwrap();

        for _ in 0..50 {
            let probe = random_pattern(&mut rng, 5, 5);
            let recall = mem.recall(&probe, 20, &mut rng).unwrap();
            for pair in recall.energies.windows(2) {
                assert!(pair[1] <= pair[0] + 1e-9, "energy rose: {:?}", recall.energies);
            }
        }
    }

    #[test]
    fn noisy_glyph_is_cleaned_up() {
        let x = glyph([
            [1, 0, 0, 0, 1],
            [0, 1, 0, 1, 0],
            [0, 0, 1, 0, 0],
            [0, 1, 0, 1, 0],
            [1, 0, 0, 0, 1],
        ]);
        let plus = glyph([
            [0, 0, 1, 0, 0],
            [0, 0, 1, 0, 0],
            [1, 1, 1, 1, 1],
            [0, 0, 1, 0, 0],
            [0, 0, 1, 0, 0],
        ]);
        // Low crosstalk keeps two-cell noise inside each basin.
        assert!((overlap(&x, &plus) * 25.0).abs() <= 9.0);

        let mut mem = AssociativeMemory::with_neurons(25).unwrap();
        mem.train(&[x.clone(), plus.clone()]).unwrap();

        let mut rng = Prng::new(404);
        for target in [&x, &plus] {
            for _ in 0..10 {
                let noisy = target.with_noise(2, &mut rng);
                let out = mem.run(&noisy, DEFAULT_MAX_CYCLES, &mut rng).unwrap();
                assert_eq!(&out, target);
            }
        }
    }

    #[test]
    fn deterministic_run_hits_cycle_limit_without_error() {
        let mut mem = AssociativeMemory::with_neurons(4).unwrap();
        mem.train(&[Pattern::from_rows(&[[1, 1, 1, -1]]).unwrap()]).unwrap();
        let cue = Pattern::from_rows(&[[-1, -1, 1, 1]]).unwrap();

        for seed in 1..=10 {
            let recall = mem.recall(&cue, 1, &mut Prng::new(seed)).unwrap();
            // One pass reaches the inverted memory, but there is no second pass to confirm it.
            assert_eq!(recall.cycles, 1);
            assert!(!recall.converged);
            assert_eq!(recall.pattern.cells(), &[-1, -1, -1, 1]);
            assert_eq!(recall.energies, vec![0.0, -6.0]);

            let out = mem.run(&cue, 1, &mut Prng::new(seed)).unwrap();
            assert_eq!(out, recall.pattern);
        }
    }

    #[test]
    fn run_stops_at_max_cycles() {
        let mut rng = Prng::new(3);
        let patterns: Vec<Pattern> = (0..4).map(|_| random_pattern(&mut rng, 4, 4)).collect();
        let mut mem = AssociativeMemory::stochastic(16).unwrap();
        mem.train(&patterns).unwrap();

        let probe = random_pattern(&mut rng, 4, 4);
        for max_cycles in [1, 2, 3, 7] {
            let recall = mem.recall(&probe, max_cycles, &mut rng).unwrap();
            assert!(recall.cycles <= max_cycles);
            assert_eq!(recall.energies.len(), recall.cycles + 1);
        }

        let untouched = mem.recall(&probe, 0, &mut rng).unwrap();
        assert_eq!(untouched.pattern, probe);
        assert_eq!(untouched.cycles, 0);
        assert!(!untouched.converged);
    }

    #[test]
    fn probe_length_must_match_neuron_count() {
        let mem = reference_memory();
        let probe = Pattern::from_rows(&[[1, 1, 1]]).unwrap();
        let expected = Error::DimensionMismatch {
            expected: 4,
            actual: 3,
        };
        let mut rng = Prng::new(1);
        assert_eq!(mem.step(&probe, &mut rng).unwrap_err(), expected);
        assert_eq!(mem.run(&probe, 10, &mut rng).unwrap_err(), expected);
        assert_eq!(mem.energy(&probe).unwrap_err(), expected);

        let mut short: Vec<Cell> = vec![1; 5];
        assert!(relax_pass(mem.weights(), UpdateRule::Deterministic, &mut short, &mut rng).is_err());
    }

    #[test]
    fn probe_shape_is_preserved() {
        let mem = reference_memory();
        let probe = Pattern::from_rows(&[[-1, -1], [1, 1]]).unwrap();
        let out = mem.run(&probe, DEFAULT_MAX_CYCLES, &mut Prng::new(9)).unwrap();
        assert_eq!(out.to_rows(), vec![vec![-1, -1], vec![-1, 1]]);
    }

    #[test]
    fn config_validation() {
        assert!(AssociativeMemory::with_neurons(1).is_err());
        assert_eq!(
            AssociativeMemory::with_neurons(0).unwrap_err(),
            Error::InvalidConfig("num_neurons must be >= 2 (a lone neuron always ties to +1)")
        );
        let cfg = MemoryConfig::with_neurons(4).with_seed(3).with_max_cycles(4);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.estimated_memory_bytes(), 16 * 8);
    }

    #[test]
    fn large_grids_are_accepted() {
        // 80x80 and 200x200 grids; only the config is checked so nothing is allocated.
        assert!(MemoryConfig::with_neurons(80 * 80).validate().is_ok());
        assert!(MemoryConfig::with_neurons(200 * 200).validate().is_ok());
        assert_eq!(
            MemoryConfig::with_neurons(usize::MAX).validate(),
            Err("num_neurons overflows the weight matrix size")
        );
    }

    #[test]
    fn stochastic_rule_saturates_at_large_inputs() {
        let mut rng = Prng::new(10);
        for _ in 0..1000 {
            assert_eq!(UpdateRule::Stochastic.activate(50.0, &mut rng), 1);
            assert_eq!(UpdateRule::Stochastic.activate(-50.0, &mut rng), -1);
        }
        assert_eq!(sigmoid(0.0), 0.5);
    }

    #[test]
    fn stochastic_recall_is_reproducible_with_a_seed() {
        let mut mem = reference_memory();
        mem.set_rule(UpdateRule::Stochastic);
        let probe = Pattern::from_rows(&[[-1, 1, -1, 1]]).unwrap();

        let a = mem.recall(&probe, DEFAULT_MAX_CYCLES, &mut Prng::new(31)).unwrap();
        let b = mem.recall(&probe, DEFAULT_MAX_CYCLES, &mut Prng::new(31)).unwrap();
        assert_eq!(a, b);

        let mut rng_a = Prng::new(32);
        let mut rng_b = Prng::new(32);
        for _ in 0..5 {
            assert_eq!(
                mem.step(&probe, &mut rng_a).unwrap(),
                mem.step(&probe, &mut rng_b).unwrap()
            );
        }
    }

    #[test]
    fn stochastic_recall_concentrates_on_stored_patterns() {
        let mut mem = reference_memory();
        mem.set_rule(UpdateRule::Stochastic);
        let stored = Pattern::from_rows(&[[1, 1, 1, -1]]).unwrap();
        let probe = Pattern::from_rows(&[[-1, -1, 1, 1]]).unwrap();

        let runs = 200;
        let mut hits = 0;
        for seed in 0..runs {
            let out = mem.run(&probe, DEFAULT_MAX_CYCLES, &mut Prng::new(seed + 1)).unwrap();
            if out == stored || out == stored.inverted() {
                hits += 1;
            }
        }
        // Two of sixteen states are stored; uniform sampling would hit them 1/8 of the time.
        assert!(hits > runs / 2, "only {hits}/{runs} runs ended on a stored pattern");
    }

    #[test]
    fn closest_match_reports_inversions() {
        let p = Pattern::from_rows(&[[1, 1, 1, -1]]).unwrap();
        let q = Pattern::from_rows(&[[1, -1, 1, -1]]).unwrap();
        let m = closest_match(&p.inverted(), &[q, p]).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.overlap, -1.0);
        assert!(closest_match(&Pattern::from_rows(&[[1, 1]]).unwrap(), &[]).is_none());
    }

    #[test]
    fn diagnostics_track_capacity() {
        let mut rng = Prng::new(4);
        let patterns: Vec<Pattern> = (0..3).map(|_| random_pattern(&mut rng, 2, 5)).collect();
        let mut mem = AssociativeMemory::with_neurons(10).unwrap();
        mem.train(&patterns).unwrap();
        let d = mem.diagnostics();
        assert_eq!(d.num_neurons, 10);
        assert_eq!(d.trained_patterns, 3);
        assert_eq!(d.capacity, 1);
        assert!(d.overloaded);
        assert!(d.mean_abs_weight > 0.0);
    }

    #[test]
    fn small_networks_report_capacity_of_at_least_one() {
        let mut mem = AssociativeMemory::with_neurons(4).unwrap();
        mem.train(&[Pattern::from_rows(&[[1, 1, 1, -1]]).unwrap()]).unwrap();
        let d = mem.diagnostics();
        assert_eq!(d.capacity, 1);
        assert!(!d.overloaded);
    }

    #[test]
    fn zero_energy_is_never_negative_zero() {
        let mem = reference_memory();
        let cue = Pattern::from_rows(&[[-1, -1, 1, 1]]).unwrap();
        let e = mem.energy(&cue).unwrap();
        assert_eq!(e, 0.0);
        assert!(e.is_sign_positive());
        assert_eq!(format!("{e:?}"), "0.0");
    }
}

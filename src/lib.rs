//! # engram
//!
//! Hopfield-style associative memory: store bipolar patterns in a Hebbian weight
//! matrix, then recover them from noisy or partial probes by asynchronous relaxation.
//!
//! ## Quick Start
//!
//! ```
//! use engram::prelude::*;
//!
//! let mut store = PatternStore::new(1, 4);
//! store.add_pattern(&[[1, 1, 1, -1]]).unwrap();
//! store.add_pattern(&[[-1, -1, -1, 1]]).unwrap();
//!
//! let mut memory = AssociativeMemory::with_neurons(store.num_neurons()).unwrap();
//! memory.train_store(&store).unwrap();
//!
//! let probe = Pattern::from_rows(&[[-1, -1, 1, 1]]).unwrap();
//! let mut rng = Prng::new(42);
//! let found = memory.run(&probe, DEFAULT_MAX_CYCLES, &mut rng).unwrap();
//! assert_eq!(found.cells(), &[-1, -1, -1, 1]);
//! assert!(memory.energy(&found).unwrap() <= memory.energy(&probe).unwrap());
//! ```
//!
//! ## Update rules
//!
//! [`UpdateRule::Deterministic`] thresholds the net input and never raises the energy.
//! [`UpdateRule::Stochastic`] switches a neuron on with probability `sigmoid(net_input)`
//! (a Boltzmann-style sampler), which can escape shallow minima but need not converge.
//!
//! Randomness (update order, stochastic draws) always comes from a caller-supplied
//! [`RandomSource`], so runs are reproducible with a seeded [`Prng`].
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization of configs, diagnostics and observer reports
//!
//! ## Modules
//!
//! - [`network`]: weight matrix, training, relaxation and energy
//! - [`pattern`]: bipolar patterns and the validating pattern store
//! - [`prng`]: seedable random source
//! - [`observer`]: read-only snapshots and recall reports
//!
//! [`UpdateRule::Deterministic`]: network::UpdateRule::Deterministic
//! [`UpdateRule::Stochastic`]: network::UpdateRule::Stochastic
//! [`RandomSource`]: prng::RandomSource
//! [`Prng`]: prng::Prng

#[path = "core/error.rs"]
pub mod error;

#[path = "core/network.rs"]
pub mod network;

#[path = "core/pattern.rs"]
pub mod pattern;

#[path = "core/prng.rs"]
pub mod prng;

pub mod observer;

pub use error::{Error, Result};

/// Prelude module for convenient imports.
///
/// ```
/// use engram::prelude::*;
/// ```
pub mod prelude {
    pub use crate::network::{
        closest_match, overlap, AssociativeMemory, Diagnostics, Energy, Match, MemoryConfig,
        Recall, UpdateRule, Weight, WeightMatrix, DEFAULT_MAX_CYCLES,
    };
    pub use crate::observer::{MemoryAdapter, MemorySnapshot, RecallReport};
    pub use crate::pattern::{Cell, Pattern, PatternStore};
    pub use crate::prng::{Prng, RandomSource};
}

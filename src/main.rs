use std::cmp::Reverse;
use std::collections::HashMap;

use engram::network::{closest_match, AssociativeMemory, MemoryConfig, UpdateRule, DEFAULT_MAX_CYCLES};
use engram::pattern::{Pattern, PatternStore};
use engram::prng::Prng;

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h" || args[1] == "help") {
        print_help();
        return;
    }

    let result = match args.get(1).map(String::as_str) {
        None => run_reference_demo(),
        Some("letters") => run_letters_demo(),
        Some("sample") => run_sample_demo(),
        Some(other) => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_help() {
    println!("engram (Hopfield associative memory)");
    println!("usage:");
    println!("  cargo run");
    println!("  cargo run -- letters");
    println!("  cargo run -- sample");
    println!("  cargo run -- --help");
}

/// Four neurons, two stored patterns, one probe.
fn run_reference_demo() -> engram::Result<()> {
    let patterns = [
        Pattern::from_rows(&[[1, 1, 1, -1]])?,
        Pattern::from_rows(&[[-1, -1, -1, 1]])?,
    ];
    let mut memory = AssociativeMemory::with_neurons(4)?;
    memory.train(&patterns)?;

    let probe = Pattern::from_rows(&[[-1, -1, 1, 1]])?;
    let mut rng = Prng::new(1);
    let found = memory.run(&probe, DEFAULT_MAX_CYCLES, &mut rng)?;

    println!("Found pattern: {:?}", found.to_rows());
    println!("Energy of the pattern: {:.1}", memory.energy(&found)?);
    Ok(())
}

const GLYPHS: [[[i32; 5]; 5]; 3] = [
    [
        [1, 0, 0, 0, 1],
        [0, 1, 0, 1, 0],
        [0, 0, 1, 0, 0],
        [0, 1, 0, 1, 0],
        [1, 0, 0, 0, 1],
    ],
    [
        [0, 0, 1, 0, 0],
        [0, 0, 1, 0, 0],
        [1, 1, 1, 1, 1],
        [0, 0, 1, 0, 0],
        [0, 0, 1, 0, 0],
    ],
    [
        [1, 1, 1, 1, 1],
        [1, 0, 0, 0, 1],
        [1, 0, 0, 0, 1],
        [1, 0, 0, 0, 1],
        [1, 1, 1, 1, 1],
    ],
];

/// Store 5x5 glyphs, corrupt each one and watch the memory clean it up.
fn run_letters_demo() -> engram::Result<()> {
    let mut store = PatternStore::new(5, 5);
    for glyph in &GLYPHS {
        store.add_pattern(glyph)?;
    }
    println!("stored patterns:");
    println!("{}", store.display_patterns());

    let mut memory = AssociativeMemory::new(MemoryConfig::with_neurons(store.num_neurons()).with_seed(7))?;
    memory.train_store(&store)?;
    let diag = memory.diagnostics();
    println!(
        "neurons={} patterns={} capacity~{} overloaded={} mean|w|={:.3}",
        diag.num_neurons, diag.trained_patterns, diag.capacity, diag.overloaded, diag.mean_abs_weight
    );

    let mut rng = memory.config().rng();
    for (idx, stored) in store.patterns().iter().enumerate() {
        let probe = stored.with_noise(3, &mut rng);
        let recall = memory.recall(&probe, memory.config().max_cycles, &mut rng)?;
        let matched = closest_match(&recall.pattern, store.patterns());

        println!();
        println!("glyph #{idx}: probe (3 cells flipped)");
        println!("{probe}");
        println!(
            "recalled after {} cycle(s) converged={} energy {:.2} -> {:.2} match={:?}",
            recall.cycles,
            recall.converged,
            recall.initial_energy(),
            recall.final_energy(),
            matched
        );
        println!("{}", recall.pattern);
    }
    Ok(())
}

/// Sample the stochastic variant across many seeds and tally where it ends up.
fn run_sample_demo() -> engram::Result<()> {
    let stored = [
        Pattern::from_rows(&[[1, 1, 1, -1]])?,
        Pattern::from_rows(&[[-1, -1, -1, 1]])?,
    ];
    let mut memory = AssociativeMemory::stochastic(4)?;
    memory.train(&stored)?;

    let probe = Pattern::from_rows(&[[-1, -1, 1, 1]])?;
    let runs = 1000u64;
    let mut counts: HashMap<Pattern, usize> = HashMap::new();
    for seed in 1..=runs {
        let out = memory.run(&probe, DEFAULT_MAX_CYCLES, &mut Prng::new(seed))?;
        *counts.entry(out).or_default() += 1;
    }

    let mut tally: Vec<(Pattern, usize)> = counts.into_iter().collect();
    tally.sort_by_key(|(_, n)| Reverse(*n));

    println!("rule={:?} runs={runs} probe={:?}", UpdateRule::Stochastic, probe.cells());
    for (state, n) in tally {
        let inverse = state.inverted();
        let label = if let Some(i) = stored.iter().position(|p| *p == state) {
            format!("stored #{i}")
        } else if let Some(i) = stored.iter().position(|p| *p == inverse) {
            format!("inverse of #{i}")
        } else {
            "other".to_string()
        };
        println!(
            "  {:?} count={:4} energy={:+.2} {}",
            state.cells(),
            n,
            memory.energy(&state)?,
            label
        );
    }
    Ok(())
}

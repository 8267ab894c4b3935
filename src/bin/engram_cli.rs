//! Run recall jobs described in JSON files.
//!
//! Examples:
//!   engram-cli recall job.json
//!   engram-cli recall job.json --stochastic --seed 7 --json
//!   engram-cli inspect job.json
//!
//! A job file looks like:
//!   {
//!     "rows": 1, "columns": 4,
//!     "patterns": [[[1, 1, 1, -1]], [[-1, -1, -1, 1]]],
//!     "probe": [[-1, -1, 1, 1]],
//!     "config": { "max_cycles": 10, "rule": "deterministic", "seed": 1 }
//!   }
//!
//! `config` is optional; `num_neurons` is always taken from the grid shape.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use engram::network::{AssociativeMemory, MemoryConfig, UpdateRule};
use engram::observer::{MemoryAdapter, MemorySnapshot, RecallReport};
use engram::pattern::{Pattern, PatternStore};

#[derive(Debug, Error)]
enum CliError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse job: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Engram(#[from] engram::Error),
    #[error("job has no probe")]
    MissingProbe,
}

#[derive(Debug, Clone, Deserialize)]
struct Job {
    rows: usize,
    columns: usize,
    patterns: Vec<Vec<Vec<i32>>>,
    #[serde(default)]
    probe: Option<Vec<Vec<i32>>>,
    #[serde(default)]
    config: Option<MemoryConfig>,
}

#[derive(Debug, Serialize)]
struct Output {
    memory: MemorySnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    recall: Option<RecallReport>,
}

#[derive(Debug, Default)]
struct Overrides {
    seed: Option<u64>,
    stochastic: bool,
    max_cycles: Option<usize>,
    json: bool,
}

fn usage() -> ! {
    eprintln!("engram-cli (Hopfield associative memory jobs)");
    eprintln!("Usage: engram-cli <command> <job.json> [options]\n");
    eprintln!("Commands:");
    eprintln!("  recall <job.json>           Train on the job's patterns and relax its probe");
    eprintln!("  inspect <job.json>          Train and print memory diagnostics only");
    eprintln!("Options:");
    eprintln!("  --seed <u64>                Seed update order and stochastic draws");
    eprintln!("  --stochastic                Use the Boltzmann-style update rule");
    eprintln!("  --max-cycles <n>            Bound on relaxation passes");
    eprintln!("  --json                      Print a JSON report");
    process::exit(2);
}

fn parse_args() -> (String, PathBuf, Overrides) {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        usage();
    }

    let cmd = args[0].clone();
    let path = PathBuf::from(&args[1]);
    let mut overrides = Overrides::default();

    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--seed" => {
                let v = rest.next().unwrap_or_else(|| usage());
                overrides.seed = Some(v.parse().unwrap_or_else(|_| usage()));
            }
            "--max-cycles" => {
                let v = rest.next().unwrap_or_else(|| usage());
                overrides.max_cycles = Some(v.parse().unwrap_or_else(|_| usage()));
            }
            "--stochastic" => overrides.stochastic = true,
            "--json" => overrides.json = true,
            _ => {
                eprintln!("Unknown option: {flag}");
                usage();
            }
        }
    }

    (cmd, path, overrides)
}

fn load_job(path: &Path) -> Result<Job, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn build_config(job: &Job, overrides: &Overrides) -> MemoryConfig {
    let mut cfg = job.config.unwrap_or_default();
    cfg.num_neurons = job.rows * job.columns;
    if let Some(seed) = overrides.seed {
        cfg.seed = Some(seed);
    }
    if let Some(max_cycles) = overrides.max_cycles {
        cfg.max_cycles = max_cycles;
    }
    if overrides.stochastic {
        cfg.rule = UpdateRule::Stochastic;
    }
    cfg
}

fn run(cmd: &str, path: &Path, overrides: &Overrides) -> Result<Output, CliError> {
    let job = load_job(path)?;

    let mut store = PatternStore::new(job.rows, job.columns);
    for grid in &job.patterns {
        store.add_pattern(grid)?;
    }

    let cfg = build_config(&job, overrides);
    let mut memory = AssociativeMemory::new(cfg)?;
    memory.train_store(&store)?;
    let adapter = MemoryAdapter::new(&memory);

    if cmd == "inspect" {
        return Ok(Output {
            memory: adapter.snapshot(),
            recall: None,
        });
    }

    let grid = job.probe.as_ref().ok_or(CliError::MissingProbe)?;
    let probe = Pattern::from_rows(grid)?;
    let mut rng = cfg.rng();
    let recall = memory.recall(&probe, cfg.max_cycles, &mut rng)?;

    if !overrides.json {
        println!("probe:\n{probe}");
        println!("result:\n{}", recall.pattern);
    }

    Ok(Output {
        memory: adapter.snapshot(),
        recall: Some(adapter.report(&probe, &recall, store.patterns())),
    })
}

fn print_human(out: &Output) {
    let m = &out.memory;
    let d = &m.diagnostics;
    println!(
        "rule={:?} max_cycles={} seed={:?}",
        m.rule, m.max_cycles, m.seed
    );
    println!(
        "neurons={} patterns={} capacity~{} overloaded={} mean|w|={:.4}",
        d.num_neurons, d.trained_patterns, d.capacity, d.overloaded, d.mean_abs_weight
    );
    if let Some(r) = &out.recall {
        println!("cycles={} converged={}", r.cycles, r.converged);
        println!("energies={:?}", r.energies);
        match (r.matched_index, r.matched_overlap) {
            (Some(i), Some(o)) => println!("closest stored pattern: #{i} overlap={o:+.3}"),
            _ => println!("closest stored pattern: none"),
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let (cmd, path, overrides) = parse_args();
    if cmd != "recall" && cmd != "inspect" {
        eprintln!("Unknown command: {cmd}");
        usage();
    }

    let out = match run(&cmd, &path, &overrides) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if overrides.json {
        match serde_json::to_string_pretty(&out) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    } else {
        print_human(&out);
    }
}

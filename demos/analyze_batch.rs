//! Example: slice multiple audio files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- <file1> <file2> ...
//!
//! Parallelism is across files; each analysis stays single-threaded.

use rayon::prelude::*;
use slicer_dsp::{analyze_slices, SliceOptions};

fn main() {
    env_logger::init();

    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        eprintln!("usage: analyze_batch <file1> <file2> ...");
        std::process::exit(2);
    }

    let options = SliceOptions::default();

    let mut results: Vec<(String, Result<usize, String>)> = files
        .par_iter()
        .map(|path| {
            let outcome = analyze_slices(path, &options)
                .map(|r| r.onsets.len())
                .map_err(|e| e.to_string());
            (path.clone(), outcome)
        })
        .collect();
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut failures = 0;
    for (path, outcome) in results {
        match outcome {
            Ok(count) => println!("{}: {} slices", path, count),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {}", path, e);
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

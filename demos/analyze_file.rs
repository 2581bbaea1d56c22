//! Example: slice a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- <file> [method] [num_slices]

use slicer_dsp::{analyze_slices, SliceOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("usage: analyze_file <file> [method] [num_slices]");
            std::process::exit(2);
        }
    };

    let mut options = SliceOptions::default();
    if let Some(method) = args.next() {
        options.method = method;
    }
    if let Some(n) = args.next() {
        options.num_slices = n.parse()?;
    }

    let result = analyze_slices(&path, &options)?;

    let duration = result.samples.len() as f64 / result.sample_rate as f64;
    println!("Analyzed {}:", path);
    println!("  {:.2} s at {} Hz", duration, result.sample_rate);
    println!("  method: {}", options.method);
    println!("  {} slices:", result.onsets.len());
    for (i, onset) in result.onsets.iter().enumerate() {
        println!("    {:2}: {:.4} s", i + 1, onset);
    }

    Ok(())
}

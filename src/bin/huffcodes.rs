//! huffcodes CLI - Huffman code inspection tool
//!
//! Builds length-limited canonical codes for a symbol histogram and prints
//! the per-symbol lengths, codes and the code-length token stream.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use lossless_huffman::huffman::fits_depth_limit;
use lossless_huffman::{
    create_huffman_tree_with_options, token_histogram, HuffmanOptions, HuffmanTreeCode,
    MAX_ALLOWED_CODE_LENGTH,
};

/// Build canonical Huffman codes from symbol counts.
///
/// Counts may be separated by commas or whitespace.
#[derive(Parser, Debug)]
#[command(name = "huffcodes")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Symbol counts, in symbol order
    #[arg(value_name = "COUNT", value_delimiter = ',')]
    counts: Vec<u32>,

    /// Read counts from a file instead
    #[arg(short, long, value_name = "FILE", conflicts_with = "counts")]
    input: Option<PathBuf>,

    /// Maximum code length in bits
    #[arg(
        short = 'l',
        long,
        default_value_t = MAX_ALLOWED_CODE_LENGTH,
        value_parser = clap::value_parser!(u8).range(1..=MAX_ALLOWED_CODE_LENGTH as i64)
    )]
    max_length: u8,

    /// Use the counts as given, without run-length shaping
    #[arg(long)]
    exact: bool,

    /// Also print the code-length token stream
    #[arg(short, long)]
    tokens: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { Level::TRACE } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut histogram = match &args.input {
        Some(path) => parse_counts(&fs::read_to_string(path)?)?,
        None => args.counts.clone(),
    };
    if histogram.is_empty() {
        return Err("no counts given".into());
    }

    // Reshaping that would not fit is dropped by the builder, so only the
    // counts as given need checking.
    if !fits_depth_limit(&histogram, args.max_length) {
        let used = histogram.iter().filter(|&&c| c != 0).count();
        return Err(format!(
            "{used} used symbols do not fit in {}-bit codes (at most {})",
            args.max_length,
            1usize << args.max_length
        )
        .into());
    }

    let options = HuffmanOptions {
        max_code_length: args.max_length,
        optimize_for_rle: !args.exact,
    };
    let original = histogram.clone();
    let mut tree = HuffmanTreeCode::new(histogram.len());
    create_huffman_tree_with_options(&mut histogram, &options, &mut tree)?;

    println!("{:>6} {:>10} {:>10} {:>6}  code", "symbol", "count", "shaped", "bits");
    for (symbol, (&count, &shaped)) in original.iter().zip(&histogram).enumerate() {
        match tree.code(symbol) {
            Some((code, length)) => println!(
                "{symbol:>6} {count:>10} {shaped:>10} {length:>6}  {:0width$b}",
                code,
                width = usize::from(length)
            ),
            None => println!("{symbol:>6} {count:>10} {shaped:>10} {:>6}  -", 0),
        }
    }

    let total_bits: u64 = original
        .iter()
        .zip(&tree.code_lengths)
        .map(|(&count, &length)| u64::from(count) * u64::from(length))
        .sum();
    println!();
    println!(
        "used {} of {} symbols, max length {}, {} payload bits",
        tree.num_used(),
        tree.num_symbols(),
        tree.max_code_length(),
        total_bits
    );

    if args.tokens {
        let tokens = tree.tokens();
        println!();
        println!("{} tokens:", tokens.len());
        for token in &tokens {
            if token.extra_bit_count() > 0 {
                println!(
                    "  {:>2} +{:0width$b}",
                    token.code,
                    token.extra_bits,
                    width = usize::from(token.extra_bit_count())
                );
            } else {
                println!("  {:>2}", token.code);
            }
        }
        let meta = token_histogram(&tokens);
        println!("meta histogram: {meta:?}");
    }

    Ok(())
}

fn parse_counts(text: &str) -> Result<Vec<u32>, std::num::ParseIntError> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

//! Garbler - command-line driver for the character statistics model.
//!
//! Reads one or more corpus files, builds a `CorpusModel` from them and prints
//! the next-character distribution for a trailing sequence.
//!
//! Settings come from the confy config file (`garbler/config.toml`) and can be
//! overridden on the command line.

use clap::Parser;
use garbler::{Config, CorpusModel};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "garbler")]
#[command(about = "Next-character statistics over a word corpus")]
#[command(version)]
struct Args {
    /// Corpus files, one or more words per line
    #[arg(required = true)]
    corpus: Vec<PathBuf>,

    /// Trailing characters of the word being built
    #[arg(short, long)]
    sequence: Option<String>,

    /// Decay applied to evidence further from the end of the sequence
    #[arg(long)]
    decay: Option<f64>,

    /// Drop candidates whose share is below this value
    #[arg(long)]
    threshold: Option<f64>,

    /// Fold all input and queries to lowercase
    #[arg(long)]
    case_insensitive: bool,

    /// Word delimiters in addition to whitespace
    #[arg(long)]
    delimiters: Option<String>,

    /// Print the word length histogram
    #[arg(long)]
    word_lengths: bool,

    /// Write the effective settings back to the config file
    #[arg(long)]
    save_config: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load()?;
    if args.case_insensitive {
        config.case_sensitive = false;
    }
    if let Some(decay) = args.decay {
        config.decay = decay;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(delimiters) = args.delimiters {
        config.delimiters = delimiters;
    }
    config.validate()?;

    if args.save_config {
        config.save()?;
        info!("Saved config");
    }

    let mut model = CorpusModel::from_config(&config);
    for path in &args.corpus {
        let reader = BufReader::new(File::open(path)?);
        let mut words = 0;
        for line in reader.lines() {
            words += model.parse_line_with_delimiters(&line?, &config.delimiters)?;
        }
        info!("Loaded {} words from {}", words, path.display());
    }
    info!("Model tracks {} characters", model.len());

    if args.word_lengths {
        for (index, count) in model.word_lengths().iter().enumerate() {
            if count > 0 {
                println!("length {:>3}: {}", index + 1, count);
            }
        }
    }

    if let Some(sequence) = args.sequence {
        let distribution =
            model.next_character_distribution(&sequence, config.decay, config.threshold)?;

        let mut ranked: Vec<(char, f64)> = distribution.iter().map(|(c, &p)| (c, p)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (c, probability) in ranked {
            println!("{:?}\t{:.4}", c, probability);
        }
    }

    Ok(())
}

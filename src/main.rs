use std::fs;
use std::process::exit;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use zipcrack::{
    load_dictionary, strength, AttackConfig, AttackStrategy, Charset, Engine, Progress,
    RunStatus, Strength, Verifier, ZipVerifier,
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Dictionary,
    BruteForce,
    Hybrid,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, help = "The encrypted ZIP file", required_unless_present = "score")]
    pub file: Option<String>,
    #[arg(short, long, help = "Enables some extra logging")]
    pub verbose: bool,
    #[arg(short, long, value_enum, default_value_t = Mode::BruteForce)]
    pub mode: Mode,
    #[arg(
        short,
        long,
        default_value = "alphanumeric",
        help = "lower, upper, digits, symbols, letters, alphanumeric or all"
    )]
    pub charset: Charset,
    #[arg(
        short('l'),
        long,
        default_value_t = 1,
        help = "The minimum length of the password"
    )]
    pub min_length: usize,
    #[arg(
        short('L'),
        long,
        default_value_t = 6,
        help = "The maximum length of the password"
    )]
    pub max_length: usize,
    #[arg(
        short,
        long,
        default_value_t = 2,
        help = "Length of the brute-forced suffix in hybrid mode"
    )]
    pub suffix_length: usize,
    #[arg(short, long, help = "Word list, one password per line")]
    pub dictionary: Option<String>,
    #[arg(
        short,
        long,
        default_value_t = 0,
        help = "Number of threads to use, 0 defaults to the number of CPU cores"
    )]
    pub thread_count: usize,
    #[arg(long, help = "Read the attack configuration from a TOML file")]
    pub config: Option<String>,
    #[arg(long, help = "Write the attack history to this JSON file")]
    pub history_json: Option<String>,
    #[arg(long, value_name = "PASSWORD", help = "Score password strength and exit")]
    pub score: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if !args.score.is_empty() {
        print_scores(&args.score);
        return Ok(());
    }

    let Some(file) = args.file.clone() else {
        anyhow::bail!("--file is required");
    };
    let config = build_config(&args)?;

    let verifier = ZipVerifier::open(&file)
        .with_context(|| format!("Failed reading the ZIP file: {file}"))?;
    if !verifier.requires_password()? {
        println!("{file} is not encrypted");
        return Ok(());
    }
    if let Some(entry) = verifier.entry_name() {
        info!("Testing passwords against {entry}");
    }

    let engine = Engine::new();
    let attack = engine.attack(file.clone(), config)?;

    println!(
        "Starting {} using {} threads",
        attack.strategy(),
        attack.thread_count()
    );

    let progress = ProgressBar::new(attack.total());
    progress.set_style(ProgressStyle::with_template(
        "{spinner:.green} {percent:>3}% [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta} remaining)",
    )?);
    let bar = progress.clone();
    let run = attack
        .observe(move |p: &Progress| {
            bar.set_position(p.attempts);
            bar.set_message(format!("{:.0} passwords/s", p.throughput));
        })
        .run(&verifier);
    progress.finish_and_clear();

    if let Some(path) = &args.history_json {
        fs::write(path, engine.history().to_json()?)
            .with_context(|| format!("Failed writing history to {path}"))?;
    }

    println!(
        "Tried {} passwords in {:.2} seconds ({:.2} passwords/s)",
        run.attempts, run.elapsed_secs, run.throughput
    );
    match (run.status, run.found, run.failure) {
        (RunStatus::Success, Some(password), _) => {
            println!("Password found: {password}");
            Ok(())
        }
        (_, _, Some(cause)) => {
            eprintln!("Attack failed: {cause:?}");
            exit(3);
        }
        _ => {
            println!("Password not found in provided search space.");
            exit(2);
        }
    }
}

fn build_config(args: &Args) -> Result<AttackConfig> {
    let mut config = match &args.config {
        Some(path) => AttackConfig::load(path)?,
        None => {
            let strategy = match args.mode {
                Mode::Dictionary => AttackStrategy::Dictionary { words: vec![] },
                Mode::BruteForce => AttackStrategy::BruteForce {
                    charset: args.charset,
                    min_len: args.min_length,
                    max_len: args.max_length,
                },
                Mode::Hybrid => AttackStrategy::Hybrid {
                    words: vec![],
                    charset: args.charset,
                    suffix_len: args.suffix_length,
                },
            };
            AttackConfig::new(strategy).with_threads(config_threads(args))
        }
    };

    if let Some(path) = &args.dictionary {
        let words = load_dictionary(path)
            .with_context(|| format!("Failed reading the dictionary: {path}"))?;
        config = config.with_dictionary(words);
    }
    Ok(config)
}

fn config_threads(args: &Args) -> usize {
    if args.thread_count == 0 {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    } else {
        args.thread_count
    }
}

fn print_scores(passwords: &[String]) {
    for password in passwords {
        let score = strength::score(password);
        println!("{password}: {score}/100 ({})", Strength::from_score(score));
    }
}

fn log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_level(verbose))
        .with_target(false)
        .with_thread_ids(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summaries_are_logged_by_default() {
        assert_eq!(log_level(false), "info");
        assert_eq!(log_level(true), "debug");
    }

    #[test]
    fn test_score_does_not_need_a_file() {
        let args = Args::try_parse_from(["zipcrack", "--score", "hunter2"]).unwrap();
        assert_eq!(args.score, vec!["hunter2"]);
        assert!(Args::try_parse_from(["zipcrack"]).is_err());
    }
}

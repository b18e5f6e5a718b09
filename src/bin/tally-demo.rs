#![forbid(unsafe_code)]
//! Demonstration sequence for TallyChain: create a chain, submit records,
//! seal them under proof-of-work, then tamper with a block and watch
//! validation catch it.

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tallychain::blockchain::{Chain, MineOutcome};
use tallychain::config;

#[derive(Parser)]
#[command(name = "tally-demo", about = "Run the TallyChain demonstration sequence")]
struct Args {
    /// Leading zero hex characters required of a sealed block's digest
    /// (overrides the configuration file)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=64))]
    difficulty: Option<u32>,

    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = config::load_config_from(&args.config)?;
    let difficulty = args.difficulty.unwrap_or(config.chain.difficulty);

    let mut chain = Chain::new(difficulty);

    println!("=== Initial chain (difficulty {}) ===", difficulty);
    println!("{}\n", chain);

    chain.add_record("Alice pays Bob 5 tokens");
    chain.add_record("Bob pays Charlie 3 tokens");
    report(chain.mine_pending());

    println!("\n=== Chain after first sealed block ===");
    println!("{}\n", chain);

    chain.add_record("Charlie pays Dave 1 token");
    chain.add_record("Dave pays Eve 0.5 tokens");
    report(chain.mine_pending());

    println!("\n=== Chain after second sealed block ===");
    println!("{}\n", chain);

    println!("=== Validation ===");
    verdict(&chain);

    println!("\n=== Tampering with block 1 ===");
    chain.tamper(1, "Mallory credits herself 1000 tokens")?;
    println!("appended a forged record to block 1 without resealing it");

    println!("\n=== Validation after tampering ===");
    verdict(&chain);

    Ok(())
}

fn report(outcome: MineOutcome) {
    match outcome {
        MineOutcome::Sealed {
            index,
            nonce,
            digest,
            elapsed,
        } => {
            println!(
                "⛏️  block {} sealed in {:.2}s (nonce {})",
                index,
                elapsed.as_secs_f64(),
                nonce
            );
            println!("   digest: {}", digest);
        }
        MineOutcome::NothingPending => println!("nothing to mine"),
        MineOutcome::Cancelled => println!("mining cancelled"),
    }
}

fn verdict(chain: &Chain) {
    match chain.first_fault() {
        None => println!("{}", "✅ chain is valid".green()),
        Some(fault) => println!("{}", format!("❌ chain is invalid: {}", fault).red()),
    }
}

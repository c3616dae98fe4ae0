// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`  — trains the model on a sentence-per-line corpus
//   2. `detect` — loads a checkpoint and segments raw text
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, DetectArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "sbd",
    version = "0.1.0",
    about = "Train an RCNN-attention sentence boundary detector, then segment text."
)]
pub struct Cli {
    /// The subcommand to run (train or detect)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => Self::run_train(args),
            Commands::Detect(args) => Self::run_detect(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on corpus in: {}", args.corpus_dir);

        // Convert CLI args → application config
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Checkpoint saved.");
        Ok(())
    }

    /// Handles the `detect` subcommand.
    /// Loads the model from checkpoint and prints one sentence per line.
    fn run_detect(args: DetectArgs) -> Result<()> {
        use crate::application::detect_use_case::DetectUseCase;
        use crate::domain::traits::SentenceSegmenter;

        let text = match (&args.text, &args.file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read input file '{path}'"))?,
            (None, None) => anyhow::bail!("Pass the input with --text or --file"),
        };

        let use_case  = DetectUseCase::new(args.checkpoint_dir.clone())?;
        let sentences = use_case.segment(&text)?;

        for sentence in sentences {
            println!("{sentence}");
        }
        Ok(())
    }
}

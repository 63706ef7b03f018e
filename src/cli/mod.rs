// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains a model, writing a LOGS_<id> run
//   2. `evaluate` — scores a run's best checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "event-gaze",
    version,
    about = "Train and evaluate gaze regression models on event-camera recordings."
)]
pub struct Cli {
    /// The subcommand to run (train or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

/// Converts CLI args into a TrainConfig and hands off to Layer 2.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on recordings listed in: {}", args.train_list);

    let summary = TrainUseCase::new(args.into()).execute()?;

    match summary.best_epoch {
        Some(epoch) => println!(
            "Training complete. Best val_loss={:.4} at epoch {} of {}.",
            summary.best_val_loss, epoch, summary.epochs_run,
        ),
        None => println!("Training complete. No checkpoint saved (no finite validation loss)."),
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(&args.models_dir, args.val_list).execute()?;
    let rates  = report.counts.rates();

    println!("\nValidation Loss: {:.4}", report.loss);
    println!(
        "err_rate: {:.4} | err_rate_1: {:.4} | err_rate_3: {:.4} | err_rate_5: {:.4}",
        rates.err_rate, rates.err_rate_1, rates.err_rate_3, rates.err_rate_5,
    );
    println!("{} of {} points over 10 px", report.counts.over_10, report.counts.total);
    Ok(())
}

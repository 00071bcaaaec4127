// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with `clap` and routes each subcommand to
// its use case in Layer 2. Printing results happens here.
//
//   train      — build vocabularies, train, score on test
//   translate  — greedy translation of one sentence
//   evaluate   — loss / perplexity / BLEU on a split
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use commands::{Commands, EvaluateArgs, TrainArgs, TranslateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "conv-seq2seq",
    version = "0.1.0",
    about = "Train a convolutional sequence-to-sequence translator and use it to translate."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Translate(args) => run_translate(args),
            Commands::Evaluate(args)  => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus in: {}", args.data_dir);

    let use_case = TrainUseCase::new(args.into());
    let report   = use_case.execute()?;

    println!(
        "Training complete after {} epochs. Best val loss {:.3} at epoch {}.",
        report.history.len(), report.best_val_loss, report.best_epoch
    );
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    use crate::application::translate_use_case::TranslateUseCase;

    let use_case = TranslateUseCase::new(&args.checkpoint_dir, args.max_len)?;
    let result   = use_case.translate_full(&args.sentence)?;

    println!("\nTranslation: {}", result.words().join(" "));

    if let Some(path) = &args.export_attention {
        result.export_attention(Path::new(path))?;
        println!("Attention written to {}", path);
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(&args.checkpoint_dir, args.data_dir.clone(), args.max_len)?;
    let report   = use_case.execute(&args.split)?;

    println!(
        "| {} Loss: {:.3} | {} PPL: {:7.3} |",
        report.split, report.loss, report.split, report.perplexity()
    );
    println!("BLEU score = {:.2} ({} sentences)", report.bleu * 100.0, report.sentences);
    Ok(())
}

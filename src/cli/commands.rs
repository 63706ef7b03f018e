// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `evaluate`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a gaze model on event-camera recordings
    Train(TrainArgs),

    /// Score a run's best checkpoint on a validation set
    Evaluate(EvaluateArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// File listing training recording ids, one per line
    #[arg(long, default_value = "train_files.txt")]
    pub train_list: String,

    /// File listing validation recording ids, one per line
    #[arg(long, default_value = "val_files.txt")]
    pub val_list: String,

    /// Directory holding the training frame archives
    #[arg(long, default_value = "data/train")]
    pub train_archive_dir: String,

    /// Directory holding the validation frame archives
    #[arg(long, default_value = "data/val")]
    pub val_archive_dir: String,

    /// Directory holding <id>.txt label files
    #[arg(long, default_value = "data/labels")]
    pub label_dir: String,

    /// Frame archive file extension
    #[arg(long, default_value = ".npy")]
    pub archive_ext: String,

    /// Parent of the LOGS_<id> run directories
    #[arg(long, default_value = "eye_tracking_lpw")]
    pub output_root: String,

    /// Frame height after resizing
    #[arg(long, default_value_t = 60)]
    pub height: usize,

    /// Frame width after resizing
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Frames per window
    #[arg(long, default_value_t = 40)]
    pub seq: usize,

    /// Step between training windows
    #[arg(long, default_value_t = 1)]
    pub stride: usize,

    /// Step between validation windows
    #[arg(long, default_value_t = 40)]
    pub val_stride: usize,

    /// Windows never cross a chunk boundary
    #[arg(long, default_value_t = 500)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seeds the backend RNG and the training shuffle
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Validation samples drawn in each epoch's plots
    #[arg(long, default_value_t = 100)]
    pub plot_batch_size: usize,

    /// Data loader worker threads
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub num_workers: usize,

    /// Channels of the first conv stage
    #[arg(long, default_value_t = 16)]
    pub channels: usize,

    /// Hidden states of the temporal scan
    #[arg(long, default_value_t = 16)]
    pub d_state: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_list:        a.train_list,
            val_list:          a.val_list,
            train_archive_dir: a.train_archive_dir,
            val_archive_dir:   a.val_archive_dir,
            label_dir:         a.label_dir,
            archive_ext:       a.archive_ext,
            output_root:       a.output_root,
            height:            a.height,
            width:             a.width,
            batch_size:        a.batch_size,
            seq:               a.seq,
            stride:            a.stride,
            val_stride:        a.val_stride,
            chunk_size:        a.chunk_size,
            epochs:            a.epochs,
            lr:                a.lr,
            seed:              a.seed,
            plot_batch_size:   a.plot_batch_size,
            num_workers:       a.num_workers,
            channels:          a.channels,
            d_state:           a.d_state,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// A run's models/ directory (holds best_model.* and train_config.json)
    #[arg(long)]
    pub models_dir: String,

    /// Validation list to use instead of the one saved with the run
    #[arg(long)]
    pub val_list: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config() {
        let cli = Cli::try_parse_from(["event-gaze", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        let cfg: TrainConfig = args.into();
        let def = TrainConfig::default();
        assert_eq!(cfg.height, def.height);
        assert_eq!(cfg.seq, def.seq);
        assert_eq!(cfg.val_stride, def.val_stride);
        assert_eq!(cfg.chunk_size, def.chunk_size);
        assert_eq!(cfg.lr, def.lr);
        assert_eq!(cfg.output_root, def.output_root);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Cli::try_parse_from(["event-gaze", "train", "--num-workers", "0"]).is_err());
    }

    #[test]
    fn test_evaluate_requires_models_dir() {
        assert!(Cli::try_parse_from(["event-gaze", "evaluate"]).is_err());
        let cli = Cli::try_parse_from(["event-gaze", "evaluate", "--models-dir", "m"]).unwrap();
        assert!(matches!(cli.command, Commands::Evaluate(EvaluateArgs { val_list: None, .. })));
    }
}

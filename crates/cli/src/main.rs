use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use axle_eval_core::grouping::domain::axle_tree_merger::AxleTreeMerger;
use axle_eval_core::io::domain::annotation_renderer::AnnotationRenderer;
use axle_eval_core::io::infrastructure::image_annotation_renderer::ImageAnnotationRenderer;
use axle_eval_core::io::infrastructure::json_annotation_store::{
    to_pretty_json, JsonAnnotationStore,
};
use axle_eval_core::io::infrastructure::palette::Palette;
use axle_eval_core::pipeline::evaluate_detections_use_case::{
    EvaluateDetectionsUseCase, EvaluationMode, EvaluationSettings,
};
use axle_eval_core::pipeline::merge_axle_trees_use_case::MergeAxleTreesUseCase;
use axle_eval_core::shared::constants::{
    DEFAULT_IOU_MIN, DEFAULT_REPORT_THRESHOLD, DEFAULT_THRESHOLD_COUNT, OUTLINE_WIDTH,
};

/// Axle-tree merging and detection precision/recall evaluation.
#[derive(Debug, Parser)]
#[command(name = "axle-eval")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fuse overlapping single-axle boxes into grouped-axle boxes.
    Merge {
        /// Annotation JSON to read.
        input: PathBuf,

        /// Where to write the merged annotation JSON.
        output: PathBuf,

        /// Draw boxes onto copies of the images before and after merging.
        #[arg(long)]
        annotate: bool,

        /// JSON file mapping extra categories to [r, g, b] colors.
        #[arg(long)]
        palette: Option<PathBuf>,

        /// Outline thickness in pixels for --annotate.
        #[arg(long, default_value_t = OUTLINE_WIDTH)]
        outline_width: u32,

        /// Print the merged document to stdout.
        #[arg(long)]
        print: bool,
    },

    /// Compute precision/recall of predictions against ground truth.
    Evaluate {
        /// Ground-truth annotation JSON.
        ground_truth: PathBuf,

        /// Prediction JSON (annotations with a `score`).
        predictions: PathBuf,

        /// Number of score thresholds sampled over [0, 1).
        #[arg(long, default_value_t = DEFAULT_THRESHOLD_COUNT)]
        thresholds: usize,

        /// Minimum IoU for a prediction to match a ground-truth box.
        #[arg(long, default_value_t = DEFAULT_IOU_MIN)]
        iou_min: f64,

        /// Score threshold for the per-image TP/FN/FP report.
        #[arg(long, default_value_t = DEFAULT_REPORT_THRESHOLD)]
        report_threshold: f64,

        /// How the precision/recall curve is computed.
        #[arg(long, value_enum, default_value_t = ModeArg::Optimized)]
        mode: ModeArg,

        /// Write the report JSON here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Draw ground truth and predictions onto copies of the images.
        #[arg(long)]
        annotate: bool,

        /// JSON file mapping extra categories to [r, g, b] colors.
        #[arg(long)]
        palette: Option<PathBuf>,

        /// Outline thickness in pixels for --annotate.
        #[arg(long, default_value_t = OUTLINE_WIDTH)]
        outline_width: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum ModeArg {
    /// Match every image at every threshold.
    Naive,
    /// Skip thresholds below the lowest prediction score.
    Optimized,
    /// Run both and fail if the curves differ.
    Compare,
}

impl From<ModeArg> for EvaluationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Naive => EvaluationMode::Naive,
            ModeArg::Optimized => EvaluationMode::Optimized,
            ModeArg::Compare => EvaluationMode::Compare,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    match cli.command {
        Command::Merge {
            input,
            output,
            annotate,
            palette,
            outline_width,
            print,
        } => run_merge(
            &input,
            &output,
            build_renderer(annotate, palette.as_deref(), outline_width)?,
            print,
        ),
        Command::Evaluate {
            ground_truth,
            predictions,
            thresholds,
            iou_min,
            report_threshold,
            mode,
            output,
            annotate,
            palette,
            outline_width,
        } => {
            let settings = EvaluationSettings {
                iou_min,
                threshold_count: thresholds,
                report_threshold,
                mode: mode.into(),
            };
            run_evaluate(
                &ground_truth,
                &predictions,
                settings,
                output.as_deref(),
                build_renderer(annotate, palette.as_deref(), outline_width)?,
            )
        }
    }
}

fn run_merge(
    input: &Path,
    output: &Path,
    renderer: Option<Box<dyn AnnotationRenderer>>,
    print: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let use_case = MergeAxleTreesUseCase::new(
        Box::new(JsonAnnotationStore::new()),
        renderer,
        AxleTreeMerger::default(),
    );
    let merged = use_case.execute(input, output)?;
    if print {
        println!("{}", to_pretty_json(&merged)?);
    }
    log::info!("Merged annotations written to {}", output.display());
    Ok(())
}

fn run_evaluate(
    ground_truth: &Path,
    predictions: &Path,
    settings: EvaluationSettings,
    output: Option<&Path>,
    renderer: Option<Box<dyn AnnotationRenderer>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let use_case =
        EvaluateDetectionsUseCase::new(Box::new(JsonAnnotationStore::new()), renderer, settings);
    let report = use_case.execute(ground_truth, predictions)?;
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            fs::write(path, json)?;
            log::info!("Evaluation report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn build_renderer(
    annotate: bool,
    palette: Option<&Path>,
    outline_width: u32,
) -> Result<Option<Box<dyn AnnotationRenderer>>, Box<dyn std::error::Error>> {
    if !annotate {
        return Ok(None);
    }
    let palette = match palette {
        Some(path) => Palette::from_json_file(path)?,
        None => Palette::builtin(),
    };
    Ok(Some(Box::new(
        ImageAnnotationRenderer::new(palette).with_outline_width(outline_width),
    )))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Merge {
            input,
            palette,
            outline_width,
            ..
        } => {
            require_file(input)?;
            if let Some(p) = palette {
                require_file(p)?;
            }
            require_outline_width(*outline_width)?;
        }
        Command::Evaluate {
            ground_truth,
            predictions,
            thresholds,
            iou_min,
            report_threshold,
            palette,
            outline_width,
            ..
        } => {
            require_file(ground_truth)?;
            require_file(predictions)?;
            if let Some(p) = palette {
                require_file(p)?;
            }
            require_outline_width(*outline_width)?;
            if *thresholds == 0 {
                return Err("Thresholds must be at least 1".into());
            }
            if !(0.0..=1.0).contains(iou_min) {
                return Err(format!("IoU minimum must be between 0.0 and 1.0, got {iou_min}").into());
            }
            if !(0.0..=1.0).contains(report_threshold) {
                return Err(format!(
                    "Report threshold must be between 0.0 and 1.0, got {report_threshold}"
                )
                .into());
            }
        }
    }
    Ok(())
}

fn require_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    Ok(())
}

fn require_outline_width(width: u32) -> Result<(), Box<dyn std::error::Error>> {
    if width == 0 {
        return Err("Outline width must be at least 1".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("axle-eval").chain(args.iter().copied()))
    }

    #[test]
    fn test_mode_defaults_to_optimized() {
        let cli = parse(&["evaluate", "gt.json", "pred.json"]).unwrap();
        let Command::Evaluate { mode, .. } = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(mode, ModeArg::Optimized);
    }

    #[test]
    fn test_mode_accepts_compare() {
        let cli = parse(&["evaluate", "gt.json", "pred.json", "--mode", "compare"]).unwrap();
        let Command::Evaluate { mode, .. } = cli.command else {
            panic!("expected evaluate");
        };
        assert!(matches!(EvaluationMode::from(mode), EvaluationMode::Compare));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = parse(&["evaluate", "gt.json", "pred.json", "--mode", "fast"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_outline_width_option() {
        let cli = parse(&["merge", "in.json", "out.json", "--outline-width", "5"]).unwrap();
        let Command::Merge { outline_width, .. } = cli.command else {
            panic!("expected merge");
        };
        assert_eq!(outline_width, 5);

        let cli = parse(&["evaluate", "gt.json", "pred.json"]).unwrap();
        let Command::Evaluate { outline_width, .. } = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(outline_width, OUTLINE_WIDTH);
    }

    #[test]
    fn test_zero_outline_width_is_rejected() {
        assert!(require_outline_width(0).is_err());
        assert!(require_outline_width(1).is_ok());
    }

    #[test]
    fn test_build_renderer_only_when_annotating() {
        assert!(build_renderer(false, None, 3).unwrap().is_none());
        assert!(build_renderer(true, None, 3).unwrap().is_some());
    }
}

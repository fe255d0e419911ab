use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use env_logger::{Env, TimestampPrecision};
use geo::{NumThreads, ProcessingOptions, RasterCreateOptions, YearPattern};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use inf::progressinfo::{CallbackProgress, ComputationStatus};

pub type Result<T = ()> = anyhow::Result<T>;

const DEFAULT_EVER_FOREST: &str = "ever_forest/ever_forest.tif";
const DEFAULT_OUTPUT_DIR: &str = "ever_forest";

#[derive(Parser, Debug)]
#[command(name = "buildforest", about = "Build ever forest summaries and yearly composites from land cover rasters")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ProcessingArgs {
    #[arg(long = "input-dir", short = 'i', default_value = ".", help = "Directory containing a directory per year")]
    input_dir: PathBuf,

    #[arg(long = "min-year", default_value_t = 1980, help = "Only years after this year are processed")]
    min_year: u32,

    #[arg(long = "threads", short = 't', help = "Number of worker threads (default: all cpus)")]
    threads: Option<usize>,

    #[arg(long = "tile-size", help = "Internal tile size of the outputs, multiple of 16")]
    tile_size: Option<usize>,

    #[arg(long = "noprogress")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(name = "ever", about = "Mark the pixels that are forest in any year")]
    Ever {
        #[command(flatten)]
        args: ProcessingArgs,
        #[arg(long = "output", short = 'o', default_value = DEFAULT_EVER_FOREST)]
        output: PathBuf,
        #[arg(long = "pattern", default_value = ".vrt", help = "File name of the yearly rasters, {year} is replaced by the year")]
        pattern: String,
    },
    #[command(name = "yearly", about = "Create a composite per year with the ever forest pixels")]
    Yearly {
        #[command(flatten)]
        args: ProcessingArgs,
        #[arg(long = "ever", short = 'e', default_value = DEFAULT_EVER_FOREST)]
        ever: PathBuf,
        #[arg(long = "output-dir", short = 'o', default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
        #[arg(long = "pattern", default_value = "Annual_NLCD_LndCov_{year}_CU_C1V1.tif")]
        pattern: String,
    },
    #[command(name = "all", about = "Build the ever forest raster followed by the yearly composites")]
    All {
        #[command(flatten)]
        args: ProcessingArgs,
        #[arg(long = "output-dir", short = 'o', default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
        #[arg(long = "ever-pattern", default_value = ".vrt")]
        ever_pattern: String,
        #[arg(long = "pattern", default_value = "Annual_NLCD_LndCov_{year}_CU_C1V1.tif")]
        pattern: String,
    },
}

impl ProcessingArgs {
    fn processing_options(&self) -> ProcessingOptions {
        ProcessingOptions::with_threads(match self.threads {
            Some(count) => NumThreads::Count(count),
            None => NumThreads::AllCpus,
        })
    }

    fn create_options(&self, opts: RasterCreateOptions) -> Result<RasterCreateOptions> {
        match self.tile_size {
            Some(size) if size == 0 || size % 16 != 0 => anyhow::bail!("Tile size must be a non zero multiple of 16, got {size}"),
            Some(size) => Ok(opts.with_block_size(size, size)),
            None => Ok(opts),
        }
    }
}

fn progress_bar(multi: &MultiProgress, args: &ProcessingArgs) -> ProgressBar {
    if args.no_progress {
        ProgressBar::hidden()
    } else {
        multi.add(ProgressBar::new(100))
    }
}

fn build_ever_forest(args: &ProcessingArgs, pattern: &str, output: &Path, multi: &MultiProgress) -> Result<PathBuf> {
    let series = geo::discover_years(&args.input_dir, &YearPattern::new(pattern)?, args.min_year)?;
    let progress = progress_bar(multi, args);
    let p = progress.clone();

    let path = geo::build_ever_forest(
        &series,
        output,
        &args.create_options(RasterCreateOptions::ever_forest())?,
        &args.processing_options(),
        CallbackProgress::<(), _>::with_cb(move |pos, _| {
            p.set_position((pos * 100.0) as u64);
            ComputationStatus::Continue
        }),
    )?;

    progress.finish_with_message("Ever forest done");
    Ok(path)
}

fn build_yearly_composites(args: &ProcessingArgs, pattern: &str, ever: &Path, output_dir: &Path, multi: &MultiProgress) -> Result {
    let series = geo::discover_years(&args.input_dir, &YearPattern::new(pattern)?, args.min_year)?;
    let progress = progress_bar(multi, args);
    let p = progress.clone();

    let written = geo::build_yearly_composites(
        &series,
        ever,
        output_dir,
        &args.create_options(RasterCreateOptions::yearly_composite())?,
        &args.processing_options(),
        CallbackProgress::<(), _>::with_cb(move |pos, _| {
            p.set_position((pos * 100.0) as u64);
            ComputationStatus::Continue
        }),
    )?;

    progress.finish_with_message("Yearly composites done");
    for path in written {
        println!("→ wrote {}", path.display());
    }

    Ok(())
}

fn main() -> Result {
    let cli = Cli::parse();

    let logger = env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp(Some(TimestampPrecision::Millis))
        .build();

    let multi = MultiProgress::new();
    let level = logger.filter();
    LogWrapper::new(multi.clone(), logger).try_init()?;
    log::set_max_level(level);

    let gdal_config = geo::RuntimeConfiguration::builder()
        .config_options(vec![("GDAL_PAM_ENABLED".into(), "NO".into())])
        .build();
    gdal_config.apply()?;

    match cli.command {
        Commands::Ever { args, output, pattern } => {
            let path = build_ever_forest(&args, &pattern, &output, &multi)?;
            println!("→ wrote {}", path.display());
        }
        Commands::Yearly {
            args,
            ever,
            output_dir,
            pattern,
        } => {
            build_yearly_composites(&args, &pattern, &ever, &output_dir, &multi)?;
        }
        Commands::All {
            args,
            output_dir,
            ever_pattern,
            pattern,
        } => {
            let ever = build_ever_forest(&args, &ever_pattern, &output_dir.join("ever_forest.tif"), &multi)?;
            build_yearly_composites(&args, &pattern, &ever, &output_dir, &multi)?;
        }
    }

    Ok(())
}

use clap::Parser;
use heterodyne_postprocessing::error::Result;
use heterodyne_postprocessing::io::{load_configuration, open_from_npz, save_to_npz};
use heterodyne_postprocessing::math_tools::OutputType;
use heterodyne_postprocessing::processing::smoothing::{SmoothingKernel, SmoothingParameters};
use heterodyne_postprocessing::processor::{ProcessedKey, SpectrumProcessor};
use log::{error, info};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "heterodyne-postprocess")]
#[command(about = "Averages and smooths heterodyne spectrometer measurements", version)]
struct Cli {
    /// Measurement archive (.npz)
    data: PathBuf,

    /// Configuration of the measurement (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// First acquisition to average
    #[arg(long)]
    start: Option<usize>,

    /// Acquisition after the last one to average
    #[arg(long)]
    stop: Option<usize>,

    /// Box kernel half width in bins
    #[arg(long, conflicts_with = "sigma")]
    half_width: Option<usize>,

    /// Gaussian kernel sigma in cm^-1
    #[arg(long)]
    sigma: Option<f64>,

    /// Exclude wavenumbers with a relative std above this value (only between 0 and 1)
    #[arg(short, long, default_value_t = 1.0)]
    threshold: f64,

    /// Realize ASC data by magnitude instead of real part
    #[arg(long)]
    drift_correction: bool,

    /// Also write the realized average and smoothed average as transmission, absorption or
    /// absorbance
    #[arg(long)]
    realize: Option<OutputType>,

    /// Output archive, defaults to `<data>_processed.npz`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn smoothing_parameters(&self) -> SmoothingParameters {
        let kernel = match (self.half_width, self.sigma) {
            (Some(half_width), _) => SmoothingKernel::Box { half_width },
            (None, Some(sigma_wn)) => SmoothingKernel::Gaussian { sigma_wn },
            (None, None) => SmoothingParameters::default().kernel,
        };
        SmoothingParameters {
            kernel,
            threshold: self.threshold,
        }
    }

    fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .data
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "measurement".to_string());
            self.data.with_file_name(format!("{}_processed.npz", stem))
        })
    }
}

fn run(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let config = load_configuration(&cli.config)?;
    let raw = open_from_npz(&cli.data, &config)?;
    let mut processor =
        SpectrumProcessor::new(config, raw)?.with_phase_drift_correction(cli.drift_correction);

    processor.average(cli.start, cli.stop)?;
    let smoothed = processor.smooth(cli.smoothing_parameters())?;
    if smoothed.result.degenerate_windows > 0 {
        info!(
            "{} wavenumbers kept their unsmoothed value",
            smoothed.result.degenerate_windows
        );
    }

    let mut outputs = processor.outputs();
    if let Some(output_type) = cli.realize {
        let measurement = processor.mode().measurement();
        for key in [ProcessedKey::AvgOfFiles, ProcessedKey::SpectralAvgOfFiles] {
            if let Some(array) = processor.realized(key, output_type) {
                let name = format!(
                    "{}_{}",
                    key.name(measurement),
                    output_type.to_string().to_lowercase()
                );
                outputs.push((name, array));
            }
        }
    }

    let output = cli.output_path();
    save_to_npz(&output, &outputs)?;
    info!("processed {:?} in {:?}", cli.data, start.elapsed());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use stackreg_core::config::{ElementSpec, StackConfig};
use stackreg_core::spatial::{Point, Spacing};
use stackreg_core::transform::{SparseDerivativeTransform, StackTransform, TransformRegistry};
use stackreg_registration::regularization::CostFunction;
use stackreg_registration::sampler::{RandomSampler, SampleDomain};
use stackreg_registration::{PenaltyConfig, StackTransformBendingEnergyPenalty};

mod scenario;

use scenario::{Scenario, SLICE_DIM, VOLUME_DIM};

type Penalty = StackTransformBendingEnergyPenalty<VOLUME_DIM, SLICE_DIM>;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Developer tasks for the stackreg workspace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the stacked bending-energy penalty for a TOML scenario
    Evaluate {
        /// Scenario file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Compare analytic penalty derivatives with central differences
    GradientCheck {
        /// Number of stack slices
        #[arg(long, default_value_t = 3)]
        slices: usize,

        /// Control points per slice axis
        #[arg(long, default_value_t = 6)]
        grid: usize,

        /// Number of random samples
        #[arg(long, default_value_t = 500)]
        samples: usize,

        /// Seed for coefficients and samples
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Finite-difference step
        #[arg(long, default_value_t = 1e-5)]
        step: f64,

        /// Largest accepted relative error
        #[arg(long, default_value_t = 1e-5)]
        tolerance: f64,
    },

    /// Print an example scenario file
    ExampleConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate { config } => {
            evaluate(&config)?;
        }
        Commands::GradientCheck { slices, grid, samples, seed, step, tolerance } => {
            gradient_check(slices, grid, samples, seed, step, tolerance)?;
        }
        Commands::ExampleConfig => {
            println!("{}", toml::to_string_pretty(&Scenario::example())?);
        }
    }

    Ok(())
}

fn evaluate(path: &Path) -> Result<()> {
    info!("Loading scenario: {}", path.display());
    let scenario = Scenario::load(path)?;

    let registry = TransformRegistry::<SLICE_DIM>::with_defaults();
    let stack = StackTransform::<VOLUME_DIM, SLICE_DIM>::from_config(&scenario.stack, &registry)?;
    let parameters = stack.parameters();

    let mut penalty = Penalty::new(scenario.penalty.clone())
        .with_transform(stack)
        .with_sampler(scenario.sampler()?);
    penalty.initialize()?;
    penalty.before_registration()?;
    if !scenario.penalty.schedule.is_empty() {
        penalty.before_each_resolution(scenario.penalty.schedule.number_of_levels() - 1)?;
    }

    let (value, derivative) = penalty.value_and_derivative(&parameters)?;
    let norm = derivative.iter().map(|d| d * d).sum::<f64>().sqrt();

    println!("{}: {:.6e}", penalty.name(), value);
    println!("derivative norm: {:.6e} ({} parameters)", norm, derivative.len());
    println!(
        "samples: {} counted, {} skipped",
        penalty.number_of_samples_counted(),
        penalty.number_of_samples_skipped()
    );
    Ok(())
}

fn gradient_check(slices: usize, grid: usize, samples: usize, seed: u64, step: f64, tolerance: f64) -> Result<()> {
    if slices == 0 || grid < 4 {
        bail!("need at least one slice and four control points per axis");
    }
    info!("Gradient check: {} slices, {}x{} control points, {} samples", slices, grid, grid, samples);

    let mut rng = StdRng::seed_from_u64(seed);
    let count = SLICE_DIM * grid * grid;
    let elements = (0..slices)
        .map(|_| {
            let coefficients: Vec<f64> = (0..count).map(|_| rng.gen_range(-0.5..0.5)).collect();
            ElementSpec::bspline(vec![grid, grid], vec![-1.0, -1.0], vec![1.0, 1.0]).with_parameters(coefficients)
        })
        .collect();
    let registry = TransformRegistry::<SLICE_DIM>::with_defaults();
    let stack = StackTransform::<VOLUME_DIM, SLICE_DIM>::from_config(&StackConfig::new(elements), &registry)?;
    let parameters = stack.parameters();

    let extent = (grid - 3) as f64;
    let domain = SampleDomain::new(
        [grid * 4, grid * 4, slices],
        Point::new([0.0, 0.0, 0.0]),
        Spacing::new([extent / (grid * 4 - 1) as f64, extent / (grid * 4 - 1) as f64, 1.0]),
    )?;
    let mut penalty = Penalty::new(PenaltyConfig::default())
        .with_transform(stack)
        .with_sampler(Box::new(RandomSampler::new(domain, samples, seed)));
    penalty.initialize()?;

    let (value, gradient) = penalty.value_and_derivative(&parameters)?;
    info!("Penalty value {:.6e}", value);

    let mut worst = 0.0f64;
    for p in 0..parameters.len() {
        let mut shifted = parameters.clone();
        shifted[p] = parameters[p] + step;
        let plus = penalty.value(&shifted)?;
        shifted[p] = parameters[p] - step;
        let minus = penalty.value(&shifted)?;
        let numeric = (plus - minus) / (2.0 * step);
        let error = (numeric - gradient[p]).abs() / (1.0 + gradient[p].abs());
        if error > tolerance {
            warn!("Parameter {}: analytic {:.6e}, numeric {:.6e}", p, gradient[p], numeric);
        }
        worst = worst.max(error);
    }

    println!("checked {} parameters, worst relative error {:.3e}", parameters.len(), worst);
    if worst > tolerance {
        bail!("gradient check failed: {:.3e} exceeds tolerance {:.3e}", worst, tolerance);
    }
    Ok(())
}

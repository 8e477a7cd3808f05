use batch_slots::core::{Scheduler, Settings};
use batch_slots::solver::{Embedded, Optimizer};
use batch_slots::{algo, data, run_reader};
use clap::{Args, Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug)]
struct Pipeline(usize, &'static str);

impl From<Pipeline> for Box<dyn Scheduler> {
    fn from(value: Pipeline) -> Box<dyn Scheduler> {
        algo::PIPELINES[value.0]()
    }
}

impl std::fmt::Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.1)
    }
}

impl ValueEnum for Pipeline {
    fn value_variants<'a>() -> &'a [Self] {
        static PIPELINES: std::sync::LazyLock<Vec<Pipeline>> = std::sync::LazyLock::new(|| {
            let iter = algo::PIPELINES.iter().enumerate();
            let mut pipelines: Vec<Pipeline> = iter.map(|(i, init)| Pipeline(i, init().name())).collect();
            pipelines.sort_by_key(|pipeline| pipeline.1);
            pipelines
        });

        PIPELINES.as_slice()
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.1))
    }
}

/// Optimizer backend.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum Backend {
    /// Pure Rust branch-and-bound solver.
    #[default]
    Embedded,
    /// Gurobi, requires the `gurobi` feature.
    Gurobi,
}

impl Backend {
    fn optimizer(self) -> anyhow::Result<Box<dyn Optimizer>> {
        match self {
            Self::Embedded => Ok(Box::new(Embedded)),
            #[cfg(feature = "gurobi")]
            Self::Gurobi => Ok(Box::new(batch_slots::solver::Gurobi)),
            #[cfg(not(feature = "gurobi"))]
            Self::Gurobi => Err(anyhow::anyhow!("The gurobi backend requires the `gurobi` feature")),
        }
    }
}

/// Solver options shared by the subcommands.
#[derive(Debug, Args)]
struct Options {
    /// The optimizer backend.
    #[clap(short, long, value_enum, default_value_t)]
    backend: Backend,
    /// Slots on each side of a window centre in the windowed pipeline.
    #[clap(short, long, default_value = "1")]
    width: usize,
    /// Time limit in seconds applied to every solve, replacing the per-stage defaults.
    #[clap(short, long)]
    time_limit: Option<f64>,
}

impl Options {
    fn settings(&self) -> anyhow::Result<Settings> {
        let settings = Settings {
            width: self.width,
            ..Settings::default()
        };
        match self.time_limit {
            Some(seconds) => Ok(settings.with_time_limit(Duration::try_from_secs_f64(seconds)?)),
            None => Ok(settings),
        }
    }
}

/// Makespan minimisation for parallel-unit batch scheduling.
#[derive(Debug, Parser)]
enum Application {
    /// Run one pipeline on an instance and print the schedule.
    Run {
        pipeline: Pipeline,
        /// The instance file. Read from stdin when missing.
        input: Option<PathBuf>,
        #[clap(flatten)]
        options: Options,
    },
    /// Run every pipeline on a directory of instances.
    Bench {
        /// The input directory.
        #[clap(default_value = "data")]
        input: PathBuf,
        /// Where to write the per-instance results.
        #[clap(short, long, default_value = "results.csv")]
        output: PathBuf,
        /// Exclude pipelines.
        #[clap(short, long, value_delimiter = ',')]
        exclude: Vec<Pipeline>,
        #[clap(flatten)]
        options: Options,
    },
    /// Generate the small, medium and large instance classes.
    Gen {
        /// Path to output the generated instances. If the directory does not exist, it will be created.
        #[clap(short, long, default_value = "data")]
        output: PathBuf,
        /// Seed of the random generator.
        #[clap(short, long, default_value = "42")]
        seed: u64,
        /// Number of instances per class.
        #[clap(short, long, default_value = "5")]
        amount: usize,
    },
}

fn pipelines(exclude: &[Pipeline], settings: &Settings) -> Vec<Box<dyn Scheduler>> {
    let iter = algo::pipelines().into_iter();
    iter.filter(|pipeline| !exclude.iter().any(|name| name.1 == pipeline.name()))
        .map(|mut pipeline| {
            pipeline.configure(settings);
            pipeline
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(batch_slots::log_filter(
            std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        )?)
        .init();

    match Application::parse() {
        Application::Run {
            pipeline,
            input,
            options,
        } => {
            let mut scheduler = Box::<dyn Scheduler>::from(pipeline);
            scheduler.configure(&options.settings()?);
            let mut optimizer = options.backend.optimizer()?;
            let mut stdout = std::io::stdout().lock();

            match input {
                Some(path) => {
                    let mut reader = BufReader::new(File::open(path)?);
                    run_reader(scheduler.as_mut(), optimizer.as_mut(), &mut reader, &mut stdout)?;
                }
                None => {
                    let mut reader = std::io::stdin().lock();
                    run_reader(scheduler.as_mut(), optimizer.as_mut(), &mut reader, &mut stdout)?;
                }
            }
            Ok(())
        }
        Application::Bench {
            input,
            output,
            exclude,
            options,
        } => {
            let mut pipelines = pipelines(&exclude, &options.settings()?);
            let mut optimizer = options.backend.optimizer()?;

            let report = data::run(&input, &mut pipelines, optimizer.as_mut())?;
            report.write_csv(&mut File::create(&output)?)?;
            print!("{report}");
            Ok(())
        }
        Application::Gen {
            output,
            seed,
            amount,
        } => {
            let mut rng = StdRng::seed_from_u64(seed);
            for path in data::generate_classes(&output, amount, &mut rng)? {
                println!("Created {}", path.display());
            }
            Ok(())
        }
    }
}

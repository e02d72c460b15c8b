use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use u_tsp_island::cost::DistanceMatrix;
use u_tsp_island::ga::{GaParams, Mutation};
use u_tsp_island::instance::load_points;
use u_tsp_island::island::{run_islands, BestResult};

/// Island-model GA for the Euclidean TSP.
#[derive(Debug, Parser)]
#[command(name = "u-tsp-island", version, about)]
struct Cli {
    /// City file: a count line followed by one `x y` line per city, or TSPLIB
    dataset: PathBuf,

    /// Number of islands (one thread each)
    #[arg(long, default_value_t = 4)]
    islands: usize,

    /// Tours per island
    #[arg(long, default_value_t = 200)]
    pop: usize,

    /// Generations to run
    #[arg(long, default_value_t = 500)]
    generations: usize,

    /// Crossover probability
    #[arg(long = "cx", default_value_t = 0.8)]
    crossover_rate: f64,

    /// Mutation probability
    #[arg(long = "mut", default_value_t = 0.05)]
    mutation_rate: f64,

    /// Tournament size
    #[arg(long, default_value_t = 4)]
    k: usize,

    /// Generations between migrations (0 disables migration)
    #[arg(long = "mig-int", default_value_t = 50)]
    migration_interval: usize,

    /// Fraction of each population offered as migration candidates
    #[arg(long = "mig-frac", default_value_t = 0.05)]
    migration_fraction: f64,

    /// Skip 2-opt refinement of the best children
    #[arg(long, alias = "no-twoopt")]
    no_two_opt: bool,

    /// Use swap mutation instead of inversion
    #[arg(long)]
    swap_mutation: bool,

    /// Base random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Run one island per MPI process (launch with `mpirun -n P`);
    /// `--islands` is ignored
    #[arg(long)]
    mpi: bool,
}

impl Cli {
    fn params(&self) -> GaParams {
        GaParams::default()
            .with_population_size(self.pop)
            .with_generations(self.generations)
            .with_crossover_rate(self.crossover_rate)
            .with_mutation_rate(self.mutation_rate)
            .with_mutation(if self.swap_mutation {
                Mutation::Swap
            } else {
                Mutation::Inversion
            })
            .with_tournament_size(self.k)
            .with_migration_interval(self.migration_interval)
            .with_migration_elite_fraction(self.migration_fraction)
            .with_local_search(!self.no_two_opt)
            .with_seed(self.seed)
    }
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_banner(cli: &Cli, params: &GaParams, islands: usize) {
    println!(
        "Island GA TSP | islands={}, pop/island={}, gens={}, cx={:.2}, mut={:.2}, k={}, migInt={}, twoopt={}",
        islands,
        params.population_size,
        params.generations,
        params.crossover_rate,
        params.mutation_rate,
        params.tournament_size,
        params.migration_interval,
        params.local_search,
    );
    println!("Dataset: {}", cli.dataset.display());
}

fn print_result(best: &BestResult, islands: usize, elapsed: Duration) {
    println!("Best tour length: {:.6}", best.fitness);
    println!("Elapsed (islands={}): {:.4} s", islands, elapsed.as_secs_f64());
    let tour: Vec<String> = best.perm.iter().map(ToString::to_string).collect();
    println!("Best tour: {}", tour.join(" "));
}

/// All islands as threads of this process.
fn run_threads(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let params = cli.params();
    params.validate()?;
    print_banner(cli, &params, cli.islands);

    let points = load_points(&cli.dataset)?;
    let cost = DistanceMatrix::euclidean(&points);

    let start = Instant::now();
    let reports = run_islands(&cost, &params, cli.islands)?;
    let elapsed = start.elapsed();
    let best = &reports.first().ok_or("no island reports")?.best;

    print_result(best, cli.islands, elapsed);
    Ok(())
}

/// One island per MPI process; rank 0 prints.
#[cfg(feature = "mpi")]
fn run_mpi(cli: &Cli) -> Result<(), Box<dyn Error>> {
    use u_tsp_island::island::{Communicator, IslandRunner, MpiComm};

    let mut comm = MpiComm::initialize()?;
    let rank = comm.rank();
    let islands = comm.size();

    let params = cli.params();
    params.validate()?;
    if rank == 0 {
        print_banner(cli, &params, islands);
    }

    let points = load_points(&cli.dataset)?;
    let cost = DistanceMatrix::euclidean(&points);

    let start = Instant::now();
    let report = IslandRunner::run(&cost, &params, &mut comm)?;
    let elapsed = start.elapsed();

    if rank == 0 {
        print_result(&report.best, islands, elapsed);
    }
    Ok(())
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_cli: &Cli) -> Result<(), Box<dyn Error>> {
    Err("--mpi requires a build with the `mpi` feature".into())
}

fn main() -> ExitCode {
    enable_tracing();
    let cli = Cli::parse();

    let result = if cli.mpi { run_mpi(&cli) } else { run_threads(&cli) };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_map_to_params() {
        let cli = Cli::try_parse_from([
            "u-tsp-island",
            "cities.txt",
            "--pop",
            "30",
            "--cx",
            "0.5",
            "--mut",
            "0.1",
            "--mig-int",
            "7",
            "--swap-mutation",
            "--no-two-opt",
        ])
        .unwrap();
        let p = cli.params();
        assert_eq!(p.population_size, 30);
        assert!((p.crossover_rate - 0.5).abs() < 1e-12);
        assert!((p.mutation_rate - 0.1).abs() < 1e-12);
        assert_eq!(p.migration_interval, 7);
        assert_eq!(p.mutation, Mutation::Swap);
        assert!(!p.local_search);
        assert!(!cli.mpi);
    }

    #[test]
    fn test_no_twoopt_spelling_accepted() {
        let cli = Cli::try_parse_from(["u-tsp-island", "cities.txt", "--no-twoopt"]).unwrap();
        assert!(cli.no_two_opt);
        assert!(!cli.params().local_search);
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use vehicle_lookup::{
    load_rows, BatchReconciler, Catalog, CsvMissLog, FuzzyMatcher, MatchResult, Resolver,
    DEFAULT_THRESHOLD,
};

#[derive(Parser)]
#[command(name = "vehicle-lookup")]
#[command(about = "Resolve brand/model/year-or-VIN queries against a vehicle dataset")]
struct Args {
    /// Vehicle dataset CSV (brand, model, year + any extra columns)
    #[arg(long, default_value = "Cleaned_Vehicle_Dataset.csv")]
    catalog: PathBuf,

    /// VIN year-code table CSV (Code, Year)
    #[arg(long, default_value = "year_code_lookup.csv")]
    year_codes: PathBuf,

    /// Audit file for unresolved queries
    #[arg(long, default_value = "missing_log.csv")]
    miss_log: PathBuf,

    /// Minimum fuzzy model score (0-100)
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look up a single vehicle
    Lookup {
        brand: String,
        model: String,
        /// Four-digit year or a VIN
        vin_or_year: String,
    },

    /// Look up every row of a CSV with brand, model and optional year/vin columns
    Batch {
        input: PathBuf,

        #[arg(long, default_value = "vehicle_lookup_results.csv")]
        output: PathBuf,
    },

    /// Show what the reference data contains
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Without reference data nothing can be served
    let catalog = Catalog::load(&args.catalog, &args.year_codes)?;
    let resolver = Resolver::with_matcher(&catalog, FuzzyMatcher::with_threshold(args.threshold));
    let mut miss_log = CsvMissLog::new(&args.miss_log);

    match args.command {
        Command::Lookup {
            brand,
            model,
            vin_or_year,
        } => run_lookup(&resolver, &mut miss_log, &brand, &model, &vin_or_year),
        Command::Batch { input, output } => run_batch(resolver, &mut miss_log, &input, &output),
        Command::Stats => {
            run_stats(&catalog);
            Ok(())
        }
    }
}

fn run_lookup(
    resolver: &Resolver,
    miss_log: &mut CsvMissLog,
    brand: &str,
    model: &str,
    vin_or_year: &str,
) -> Result<()> {
    println!("🚗 Vehicle Info Lookup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let result = resolver.lookup(brand, model, vin_or_year, miss_log);
    let columns = resolver.catalog().columns();

    match &result {
        MatchResult::Exact { record } => {
            println!("✅ Vehicle found:");
            println!("{}", serde_json::to_string_pretty(&record.to_json(columns))?);
        }
        MatchResult::Fallback {
            record,
            requested_year,
        } => {
            println!("⚠️  Closest year match used instead of {}:", requested_year);
            println!("{}", serde_json::to_string_pretty(&record.to_json(columns))?);
        }
        MatchResult::NotFound { reason } => {
            eprintln!("❌ No matching vehicle found: {}", reason);
            eprintln!("   Logged to {:?}", miss_log.path());
            std::process::exit(1);
        }
    }

    Ok(())
}

fn run_batch(
    resolver: Resolver,
    miss_log: &mut CsvMissLog,
    input: &Path,
    output: &Path,
) -> Result<()> {
    println!("📁 Batch Lookup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let rows = load_rows(input)?;
    println!("✓ Loaded {} rows from {:?}", rows.len(), input);

    let catalog = resolver.catalog();
    let reconciler = BatchReconciler::new(resolver);
    let report = reconciler.reconcile(rows, miss_log);

    println!("\n📊 Summary");
    println!("   Total:         {}", report.stats.total());
    println!("   Exact Matches: {}", report.stats.exact);
    println!("   Fallbacks:     {}", report.stats.fallback);
    println!("   Not Found:     {}", report.stats.not_found);

    report.save_csv(catalog.columns(), output)?;
    println!("\n💾 Results written to {:?}", output);
    if report.stats.not_found > 0 {
        println!("📝 Misses logged to {:?}", miss_log.path());
    }

    Ok(())
}

fn run_stats(catalog: &Catalog) {
    println!("📚 Reference Catalog");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Records:    {}", catalog.len());
    println!("   Brands:     {}", catalog.brand_count());
    println!("   Models:     {}", catalog.model_count());
    println!("   Year codes: {}", catalog.year_codes().len());
    println!("   Columns:    {}", catalog.columns().join(", "));
}

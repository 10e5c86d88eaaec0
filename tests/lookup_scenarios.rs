// End-to-end lookups against CSV fixtures on disk

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use vehicle_lookup::{
    load_rows, BatchReconciler, Catalog, CsvMissLog, MatchResult, MissReason, Resolver,
};

const DATASET: &str = "\
brand,model,year,body,fuel
Audi,A3,2016,hatchback,petrol
Audi,A4,2018,sedan,diesel
BMW,X5,2020,suv,petrol
Volkswagen,Golf,2014,hatchback,petrol
Volkswagen,Golf,2019,hatchback,petrol
";

const YEAR_CODES: &str = "\
Code,Year
E,2014
F,2015
G,2016
H,2017
J,2018
K,2019
L,2020
";

struct Fixture {
    dir: TempDir,
    catalog: Catalog,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("Cleaned_Vehicle_Dataset.csv");
        let codes = dir.path().join("year_code_lookup.csv");
        fs::write(&dataset, DATASET).unwrap();
        fs::write(&codes, YEAR_CODES).unwrap();

        let catalog = Catalog::load(&dataset, &codes).unwrap();
        Fixture { dir, catalog }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn miss_log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.path("missing_log.csv"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}

#[test]
fn vin_resolves_exact_audi_a3() {
    let fx = Fixture::new();
    let resolver = Resolver::new(&fx.catalog);
    let mut log = CsvMissLog::new(fx.path("missing_log.csv"));

    let result = resolver.lookup("Audi", "A3", "WAUZZZF46GA012345", &mut log);

    match result {
        MatchResult::Exact { record } => {
            assert_eq!(record.brand, "audi");
            assert_eq!(record.model, "a3");
            assert_eq!(record.year, Some(2016));
            assert_eq!(record.field("body"), Some("hatchback".to_string()));
        }
        other => panic!("expected exact match, got {:?}", other),
    }
    assert!(fx.miss_log_lines().is_empty());
}

#[test]
fn missing_year_falls_back_to_closest() {
    let fx = Fixture::new();
    let resolver = Resolver::new(&fx.catalog);
    let mut log = CsvMissLog::new(fx.path("missing_log.csv"));

    let result = resolver.lookup("Audi", "A3", "2019", &mut log);

    assert!(result.is_fallback());
    assert_eq!(result.record().unwrap().year, Some(2016));
    assert_eq!(
        result.note().as_deref(),
        Some("Closest year match used instead of 2019")
    );
}

#[test]
fn misspelled_model_still_matches() {
    let fx = Fixture::new();
    let resolver = Resolver::new(&fx.catalog);

    // "golff" vs "golf" scores 88.9
    let result = resolver.resolve("volkswagen", "Golff", "2019");
    assert!(result.is_exact());
    assert_eq!(result.record().unwrap().model, "golf");
}

#[test]
fn unknown_model_is_logged_with_reason() {
    let fx = Fixture::new();
    let resolver = Resolver::new(&fx.catalog);
    let mut log = CsvMissLog::new(fx.path("missing_log.csv"));

    let result = resolver.lookup("Audi", "Zzzzzz", "2016", &mut log);
    assert_eq!(result.reason(), Some(MissReason::ModelNotRecognized));

    let lines = fx.miss_log_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "brand,model,vin_or_year,reason,timestamp");
    assert!(lines[1].starts_with("audi,zzzzzz,2016,model not recognized for brand,"));
}

#[test]
fn batch_file_round_trip() {
    let fx = Fixture::new();
    let input = fx.path("queries.csv");
    fs::write(
        &input,
        "\
brand,model,year,vin
Audi,A3,,WAUZZZF46GA012345
Audi,A3,2019,
BMW,,2020,
Volkswagen,Golf,2016,
Audi,A4,,
",
    )
    .unwrap();

    let rows = load_rows(&input).unwrap();
    let reconciler = BatchReconciler::for_catalog(&fx.catalog);
    let mut log = CsvMissLog::new(fx.path("missing_log.csv"));
    let report = reconciler.reconcile(rows, &mut log);

    assert_eq!(report.stats.exact, 1);
    assert_eq!(report.stats.fallback, 2);
    assert_eq!(report.stats.not_found, 2);
    assert_eq!(report.stats.total(), 5);

    // Golf 2016 is two years from 2014 and three from 2019
    assert_eq!(report.outcomes[3].record().unwrap().year, Some(2014));

    let lines = fx.miss_log_lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("bmw,,2020,missing brand or model,"));
    assert!(lines[2].starts_with("audi,a4,,no valid year or VIN,"));

    let output = fx.path("vehicle_lookup_results.csv");
    report.save_csv(fx.catalog.columns(), &output).unwrap();
    let results = fs::read_to_string(&output).unwrap();
    let result_lines: Vec<&str> = results.lines().collect();

    assert_eq!(result_lines.len(), 6);
    assert_eq!(result_lines[0], "brand,model,year,body,fuel,Note,Result");
    assert_eq!(result_lines[1], "audi,a3,2016,hatchback,petrol,,");
    assert_eq!(result_lines[3], ",,,,,,Not enough info");
}

#[test]
fn missing_dataset_is_fatal() {
    let dir = TempDir::new().unwrap();
    let codes = dir.path().join("year_code_lookup.csv");
    fs::write(&codes, YEAR_CODES).unwrap();

    let err = Catalog::load(dir.path().join("absent.csv"), &codes).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.csv"));
}

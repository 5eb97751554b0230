use log::{debug, info, warn};

use snafu::{prelude::*, ErrorCompat, Snafu};
use turnout_by_age::builder::KeyBuilder;
use turnout_by_age::*;

use std::collections::BTreeMap;
use std::fs;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
mod io_common;
mod io_csv;

pub use crate::turnout::config_reader::Settings;
use crate::turnout::config_reader::*;
use crate::turnout::io_common::*;
use crate::turnout::io_csv::*;

#[derive(Debug, Snafu)]
pub enum TurnoutError {
    #[snafu(display("Error opening file {path}"))]
    OpeningCsv {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing CSV file {path}"))]
    CsvLineParse { source: csv::Error, path: String },
    #[snafu(display("Column {column} not found in the header of {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Error reading directory {path}"))]
    ReadingDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No file {path} for county {county}"))]
    MissingCountyFile { county: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("County {county} failed"))]
    Tally {
        source: TurnoutErrors,
        county: String,
    },
    #[snafu(display("Invalid election date"))]
    InvalidElectionDate { source: TurnoutErrors },
    #[snafu(display("{year} is not a presidential election year from 2000 to 2020"))]
    UnknownElectionYear { year: u32 },
    #[snafu(display("Invalid key file {path}"))]
    InvalidKey {
        source: TurnoutErrors,
        path: String,
    },
    #[snafu(display("The key differs from the reference key {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TurnoutResult<T> = Result<T, TurnoutError>;

// The error and its causes on a single line, for the per-county warnings.
fn error_chain(e: &TurnoutError) -> String {
    ErrorCompat::iter_chain(e)
        .map(|c| c.to_string())
        .collect::<Vec<String>>()
        .join(": ")
}

// Reads the two files of a county and counts its voters and votes by age.
fn read_county(pair: &CountyFilePair, settings: &Settings) -> TurnoutResult<CountyTally> {
    info!(
        "processing files {} {}",
        pair.registration.display(),
        pair.history.display()
    );
    let registrations = read_registrations(&pair.registration, &settings.schema)?;
    let history = read_history(&pair.history, &settings.schema)?;
    let tally = tally_county(&registrations, &history, &settings.election).context(TallySnafu {
        county: pair.prefix.clone(),
    })?;
    debug!(
        "read_county: {}: registered {:?} votes {:?}",
        pair.prefix, tally.registered, tally.votes
    );
    Ok(tally)
}

fn county_pairs(settings: &Settings) -> TurnoutResult<Vec<CountyFilePair>> {
    let registration_files = list_files(&settings.registered_voters_folder)?;
    let history_files = list_files(&settings.voter_history_folder)?;
    let (pairs, failures) = pair_files(&registration_files, &history_files);
    if !failures.is_empty() {
        warn!("{} prefixes could not be paired", failures.len());
    }
    Ok(pairs)
}

fn age_js(age: &Age) -> JSValue {
    match age {
        Age::Years(y) => json!(y),
        Age::BeforeBirth(_) => json!(age.as_f64()),
    }
}

fn x_label(settings: &Settings) -> String {
    format!(
        "Age (less than {} registered voters are hidden)",
        settings.minimum_registered_voters
    )
}

fn write_output(js: &JSValue, out: Option<String>) -> TurnoutResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu { path: "output" })?;
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty);
        }
        Some(path) => {
            fs::write(path, pretty).context(WritingOutputSnafu { path })?;
            info!("wrote output to {}", path);
        }
    }
    Ok(())
}

fn check_reference(key_js: &JSValue, reference_path: &str) -> TurnoutResult<()> {
    let contents = fs::read_to_string(reference_path).context(OpeningJsonSnafu {
        path: reference_path,
    })?;
    let reference: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {
        path: reference_path,
    })?;
    let pretty_ref = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {
        path: reference_path,
    })?;
    let pretty_key = serde_json::to_string_pretty(key_js).context(ParsingJsonSnafu {
        path: reference_path,
    })?;
    if pretty_ref != pretty_key {
        warn!("Found differences with the reference key");
        print_diff(pretty_ref.as_str(), pretty_key.as_str(), "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    Ok(())
}

/// Builds the key from all the county pairs and writes it to the key file.
///
/// Counties that fail are reported and left out of the key.
pub fn run_generate_key(settings: &Settings, reference: Option<String>) -> TurnoutResult<Key> {
    let pairs = county_pairs(settings)?;
    let mut builder = KeyBuilder::new();
    for pair in pairs.iter() {
        let res = read_county(pair, settings).and_then(|tally| {
            tally.normalized().context(TallySnafu {
                county: pair.prefix.clone(),
            })
        });
        builder.add_result(&pair.prefix, res.map_err(|e| error_chain(&e)));
    }
    if builder.num_failures() > 0 {
        warn!(
            "could not parse {} of {} counties.",
            builder.num_failures(),
            builder.num_counties()
        );
    }

    let key = builder.build();
    write_key(&settings.key_file, &key)?;
    info!("wrote key to {}", settings.key_file.display());

    if let Some(reference_path) = reference {
        check_reference(&key_to_js(&key), reference_path.as_str())?;
    }
    Ok(key)
}

fn build_prediction_js(
    settings: &Settings,
    county: &str,
    prediction: &Prediction,
) -> JSValue {
    let points = &prediction.points;
    json!({
        "title": format!("{} County ID {}: Votes Cast vs. Age", settings.election.year(), county),
        "xLabel": x_label(settings),
        "yLabel": "Votes cast (actual vs. prediction)",
        "electionDate": settings.election.text(),
        "overallTurnout": prediction.overall_turnout,
        "ages": points.iter().map(|p| age_js(&p.age)).collect::<Vec<JSValue>>(),
        "registered": points.iter().map(|p| p.registered).collect::<Vec<u64>>(),
        "actual": points.iter().map(|p| p.actual).collect::<Vec<u64>>(),
        "predicted": points.iter().map(|p| p.predicted).collect::<Vec<f64>>(),
        "missingFromKey": prediction.missing_from_key.iter().map(age_js).collect::<Vec<JSValue>>(),
    })
}

/// Compares the votes of one county with the votes predicted by the key.
pub fn run_predict(
    settings: &Settings,
    county: &str,
    out: Option<String>,
) -> TurnoutResult<JSValue> {
    let key = read_key(&settings.key_file)?;
    let pair = county_files(settings, county)?;
    let tally = read_county(&pair, settings)?;
    let prediction = predict_votes(&tally, &key).context(TallySnafu { county })?;
    if !prediction.missing_from_key.is_empty() {
        warn!(
            "ages missing from the key are not predicted: {:?}",
            prediction.missing_from_key
        );
    }
    let shown = prediction.above_minimum(settings.minimum_registered_voters);
    let js = build_prediction_js(settings, county, &shown);
    write_output(&js, out)?;
    Ok(js)
}

// The turnout of a county, restricted to the ages with enough voters.
fn county_series(
    tally: &CountyTally,
    normalized: bool,
    minimum: u64,
) -> Result<BTreeMap<Age, f64>, TurnoutErrors> {
    let turnouts = if normalized {
        tally.normalized()?
    } else {
        tally.turnout_by_age()?
    };
    Ok(turnouts
        .into_iter()
        .filter(|(a, _)| tally.registered.get(a).cloned().unwrap_or(0) > minimum)
        .collect())
}

/// Turnout by age for every county, one series per county.
pub fn run_plot(settings: &Settings, normalized: bool, out: Option<String>) -> TurnoutResult<JSValue> {
    let pairs = county_pairs(settings)?;
    let mut series: Vec<JSValue> = Vec::new();
    let mut failures: usize = 0;
    for pair in pairs.iter() {
        let res = read_county(pair, settings).and_then(|tally| {
            county_series(&tally, normalized, settings.minimum_registered_voters).context(
                TallySnafu {
                    county: pair.prefix.clone(),
                },
            )
        });
        match res {
            Ok(s) => series.push(json!({
                "county": pair.prefix,
                "ages": s.keys().map(age_js).collect::<Vec<JSValue>>(),
                "turnout": s.values().cloned().collect::<Vec<f64>>(),
            })),
            Err(e) => {
                warn!("error parsing {}: {}", pair.prefix, error_chain(&e));
                failures += 1;
            }
        }
    }
    info!("could not parse {} of {} counties.", failures, pairs.len());

    let y_label = if normalized {
        "Normalized voter turnout (turnout / overall turnout)"
    } else {
        "Voter turnout (votes / registered voters)"
    };
    let js = json!({
        "title": format!(
            "Voter Turnout vs. Age ({} of {} counties; each line = 1 county)",
            pairs.len() - failures,
            pairs.len()
        ),
        "xLabel": x_label(settings),
        "yLabel": y_label,
        "electionDate": settings.election.text(),
        "series": series,
    });
    write_output(&js, out)?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use clap::Parser;
    use std::path::{Path, PathBuf};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn test_dir(name: &str) -> String {
        format!("{}/tests/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("turnout-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    // Settings for a fixture database, with the key in a scratch location.
    fn test_wrapper(database: &str, key_name: &str, extra: &[&str]) -> Settings {
        let root = test_dir(database);
        let key = scratch_file(key_name);
        let mut argv: Vec<String> = vec![
            "turnout".to_string(),
            "--registered-voters".to_string(),
            format!("{}/registered_voters", root),
            "--voter-history".to_string(),
            format!("{}/voter_history", root),
            "--key".to_string(),
            key.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        argv.push("generate-key".to_string());
        let args = Args::parse_from(argv);
        Settings::from_args(&args).unwrap()
    }

    fn assert_close(x: f64, y: f64) {
        assert!((x - y).abs() < 1e-9, "{} != {}", x, y);
    }

    #[test]
    fn generate_key_skips_failed_counties() {
        init();
        let settings = test_wrapper("voter_database", "key_generate.json", &[]);
        let key = run_generate_key(&settings, None).unwrap();
        assert_eq!(key.len(), 2);
        assert_close(key.ratio(&Age::Years(30)).unwrap(), 0.75);
        assert_close(key.ratio(&Age::Years(60)).unwrap(), 1.5);

        let written = read_key(&settings.key_file).unwrap();
        assert_eq!(written.len(), 2);
        assert_close(written.ratio(&Age::Years(30)).unwrap(), 0.75);
    }

    #[test]
    fn generate_key_checks_reference() {
        init();
        let settings = test_wrapper("voter_database", "key_reference.json", &[]);
        let key = run_generate_key(&settings, None).unwrap();
        let reference = scratch_file("reference_ok.json");
        write_key(&reference, &key).unwrap();
        assert!(run_generate_key(&settings, Some(reference.display().to_string())).is_ok());

        let other = scratch_file("reference_other.json");
        fs::write(&other, r#"{"30": 0.5}"#).unwrap();
        let res = run_generate_key(&settings, Some(other.display().to_string()));
        assert!(matches!(res, Err(TurnoutError::ReferenceMismatch { .. })));
    }

    #[test]
    fn predict_county() {
        init();
        let settings = test_wrapper("voter_database", "key_predict.json", &["--min-registered", "1"]);
        run_generate_key(&settings, None).unwrap();
        let js = run_predict(&settings, "01", Some(scratch_file("predict_01.json").display().to_string())).unwrap();
        assert_eq!(js["ages"], json!([30, 60]));
        assert_eq!(js["actual"], json!([1, 2]));
        assert_eq!(js["registered"], json!([2, 2]));
        let predicted: Vec<f64> = js["predicted"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert_close(predicted[0], 1.125);
        assert_close(predicted[1], 2.25);
        assert_eq!(js["title"], json!("2020 County ID 01: Votes Cast vs. Age"));
        assert_eq!(
            js["xLabel"],
            json!("Age (less than 1 registered voters are hidden)")
        );
    }

    #[test]
    fn predict_hides_small_ages_and_missing_key_ages() {
        init();
        let settings = test_wrapper("voter_database", "key_partial.json", &[]);
        fs::write(&settings.key_file, r#"{"30": 1.0}"#).unwrap();
        let js = run_predict(&settings, "01", Some(scratch_file("predict_partial.json").display().to_string())).unwrap();
        // Default minimum of 50 registered voters.
        assert_eq!(js["ages"], json!([]));
        assert_eq!(js["missingFromKey"], json!([60]));
    }

    #[test]
    fn predict_unknown_county() {
        init();
        let settings = test_wrapper("voter_database", "key_unknown.json", &[]);
        fs::write(&settings.key_file, r#"{"30": 1.0}"#).unwrap();
        let res = run_predict(&settings, "99", None);
        assert!(matches!(res, Err(TurnoutError::MissingCountyFile { .. })));
    }

    #[test]
    fn predict_failed_county() {
        init();
        let settings = test_wrapper("voter_database", "key_failed.json", &[]);
        fs::write(&settings.key_file, r#"{"30": 1.0}"#).unwrap();
        let res = run_predict(&settings, "03", None);
        assert!(matches!(res, Err(TurnoutError::Tally { .. })));

        // The cause is printed once, after the county.
        let e = res.unwrap_err();
        assert_eq!(e.to_string(), "County 03 failed");
        assert_eq!(
            error_chain(&e),
            "County 03 failed: voter ID 3001 appears twice in all voters"
        );
    }

    #[test]
    fn plot_series() {
        init();
        let settings = test_wrapper("voter_database", "key_plot.json", &["--min-registered", "1"]);
        let js = run_plot(&settings, false, Some(scratch_file("plot.json").display().to_string())).unwrap();
        assert_eq!(
            js["title"],
            json!("Voter Turnout vs. Age (2 of 3 counties; each line = 1 county)")
        );
        let series = js["series"].as_array().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["county"], json!("CTY01"));
        assert_eq!(series[0]["ages"], json!([30, 60]));
        assert_eq!(series[0]["turnout"], json!([0.5, 1.0]));

        let js = run_plot(&settings, true, Some(scratch_file("plot_normalized.json").display().to_string())).unwrap();
        let turnout = js["series"][1]["turnout"].as_array().unwrap();
        assert_close(turnout[0].as_f64().unwrap(), 0.5 / 0.6);
    }

    #[test]
    fn legacy_schema_reads_fixed_columns() {
        init();
        let settings = test_wrapper("legacy_database", "key_legacy_header.json", &[]);
        let pairs = county_pairs(&settings).unwrap();
        assert_eq!(pairs.len(), 1);
        let res = read_county(&pairs[0], &settings);
        assert!(matches!(res, Err(TurnoutError::MissingColumn { .. })));

        let settings = test_wrapper("legacy_database", "key_legacy.json", &["--legacy-schema"]);
        let tally = read_county(&pairs[0], &settings).unwrap();
        assert_eq!(tally.registered.get(&Age::Years(25)), Some(&2));
        assert_eq!(tally.registered.get(&Age::Years(70)), Some(&1));
        assert_eq!(tally.votes.get(&Age::Years(25)), Some(&1));
        assert_eq!(tally.votes.get(&Age::Years(70)), Some(&1));
        assert_eq!(tally.count.methods.get("MI"), Some(&1));
    }

    #[test]
    fn config_file_resolves_relative_folders() {
        init();
        let config = test_dir("turnout_config.json");
        let key = scratch_file("key_config.json");
        let args = Args::parse_from([
            "turnout",
            "--config",
            config.as_str(),
            "--key",
            key.display().to_string().as_str(),
            "plot",
        ]);
        let settings = Settings::from_args(&args).unwrap();
        assert_eq!(settings.minimum_registered_voters, 1);
        assert_eq!(settings.election.text(), "11/03/2020");
        assert!(Path::new(&settings.registered_voters_folder).is_dir());
        let js = run_plot(&settings, false, Some(scratch_file("plot_config.json").display().to_string())).unwrap();
        assert_eq!(js["series"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn election_year_selects_the_date() {
        init();
        let settings = test_wrapper("voter_database", "key_year.json", &["--election-year", "2016"]);
        assert_eq!(settings.election.text(), "11/08/2016");
        let args = Args::parse_from(["turnout", "--election-year", "2018", "generate-key"]);
        assert!(matches!(
            Settings::from_args(&args),
            Err(TurnoutError::UnknownElectionYear { year: 2018 })
        ));
    }
}

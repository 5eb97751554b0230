use crate::args::Args;
use crate::turnout::*;

use serde::{Deserialize, Serialize};
use serde_json::Map as JSMap;
use std::path::{Path, PathBuf};

const DEFAULT_REGISTERED_VOTERS_FOLDER: &str = "./voter_database/registered_voters";
const DEFAULT_VOTER_HISTORY_FOLDER: &str = "./voter_database/voter_history";
const DEFAULT_KEY_FILE: &str = "./key.json";
const DEFAULT_ELECTION_DATE: &str = "11/03/2020";
const DEFAULT_MINIMUM_REGISTERED_VOTERS: u64 = 50;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistrationColumns {
    #[serde(rename = "voterId")]
    pub _voter_id: Option<String>,
    #[serde(rename = "status")]
    pub _status: Option<String>,
    #[serde(rename = "dateOfBirth")]
    pub _date_of_birth: Option<String>,
    #[serde(rename = "originalRegistration")]
    pub _original_registration: Option<String>,
}

impl RegistrationColumns {
    pub fn voter_id(&self) -> &str {
        self._voter_id.as_deref().unwrap_or("VoterID")
    }

    pub fn status(&self) -> &str {
        self._status.as_deref().unwrap_or("Status")
    }

    pub fn date_of_birth(&self) -> &str {
        self._date_of_birth.as_deref().unwrap_or("DateOfBirth")
    }

    pub fn original_registration(&self) -> &str {
        self._original_registration
            .as_deref()
            .unwrap_or("OriginalRegistration")
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryColumns {
    #[serde(rename = "voterId")]
    pub _voter_id: Option<String>,
    #[serde(rename = "electionDate")]
    pub _election_date: Option<String>,
    #[serde(rename = "votingMethod")]
    pub _voting_method: Option<String>,
}

impl HistoryColumns {
    pub fn voter_id(&self) -> &str {
        self._voter_id.as_deref().unwrap_or("VoterID")
    }

    pub fn election_date(&self) -> &str {
        self._election_date.as_deref().unwrap_or("ElectionDate")
    }

    pub fn voting_method(&self) -> &str {
        self._voting_method.as_deref().unwrap_or("VotingMethod")
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct TurnoutConfig {
    #[serde(rename = "registeredVotersFolder")]
    pub registered_voters_folder: Option<String>,
    #[serde(rename = "voterHistoryFolder")]
    pub voter_history_folder: Option<String>,
    #[serde(rename = "keyFile")]
    pub key_file: Option<String>,
    #[serde(rename = "electionDate")]
    pub election_date: Option<String>,
    #[serde(rename = "electionYear")]
    pub election_year: Option<u32>,
    #[serde(rename = "minimumRegisteredVoters")]
    pub minimum_registered_voters: Option<u64>,
    #[serde(rename = "legacySchema")]
    pub legacy_schema: Option<bool>,
    #[serde(rename = "registrationColumns")]
    pub registration_columns: Option<RegistrationColumns>,
    #[serde(rename = "historyColumns")]
    pub history_columns: Option<HistoryColumns>,
    #[serde(rename = "countyFilePrefix")]
    pub county_file_prefix: Option<String>,
    #[serde(rename = "registrationSuffix")]
    pub registration_suffix: Option<String>,
    #[serde(rename = "historySuffix")]
    pub history_suffix: Option<String>,
}

/// How the columns of the extracts are found.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnSchema {
    /// Fixed positions, the header is ignored.
    pub legacy: bool,
    pub registration: RegistrationColumns,
    pub history: HistoryColumns,
}

/// How the files of a county are named: `<prefix><county id><suffix>`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountyFileNames {
    pub prefix: String,
    pub registration_suffix: String,
    pub history_suffix: String,
}

/// The configuration file and the command line, put together.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub registered_voters_folder: PathBuf,
    pub voter_history_folder: PathBuf,
    pub key_file: PathBuf,
    pub election: ElectionDate,
    pub minimum_registered_voters: u64,
    pub schema: ColumnSchema,
    pub county_files: CountyFileNames,
}

impl Settings {
    /// The command line takes precedence over the configuration file. The
    /// relative paths of the configuration file are read from its folder.
    pub fn from_args(args: &Args) -> TurnoutResult<Settings> {
        let (config, root) = match args.config.as_deref() {
            Some(p) => {
                let config = read_config(p)?;
                let root = Path::new(p)
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                (config, root)
            }
            None => (TurnoutConfig::default(), PathBuf::new()),
        };
        debug!("Settings::from_args: config: {:?}", config);

        let folder = |arg: &Option<String>, conf: &Option<String>, default: &str| -> PathBuf {
            match (arg, conf) {
                (Some(a), _) => PathBuf::from(a),
                (None, Some(c)) => root.join(c),
                (None, None) => root.join(default),
            }
        };

        let election = match (
            args.election_date.as_deref(),
            args.election_year,
            config.election_date.as_deref(),
            config.election_year,
        ) {
            (Some(date), _, _, _) => election_from_date(date)?,
            (None, Some(year), _, _) => election_from_year(year)?,
            (None, None, Some(date), _) => election_from_date(date)?,
            (None, None, None, Some(year)) => election_from_year(year)?,
            (None, None, None, None) => election_from_date(DEFAULT_ELECTION_DATE)?,
        };

        let res = Settings {
            registered_voters_folder: folder(
                &args.registered_voters,
                &config.registered_voters_folder,
                DEFAULT_REGISTERED_VOTERS_FOLDER,
            ),
            voter_history_folder: folder(
                &args.voter_history,
                &config.voter_history_folder,
                DEFAULT_VOTER_HISTORY_FOLDER,
            ),
            key_file: folder(&args.key, &config.key_file, DEFAULT_KEY_FILE),
            election,
            minimum_registered_voters: args
                .min_registered
                .or(config.minimum_registered_voters)
                .unwrap_or(DEFAULT_MINIMUM_REGISTERED_VOTERS),
            schema: ColumnSchema {
                legacy: args.legacy_schema || config.legacy_schema.unwrap_or(false),
                registration: config.registration_columns.clone().unwrap_or_default(),
                history: config.history_columns.clone().unwrap_or_default(),
            },
            county_files: CountyFileNames {
                prefix: config
                    .county_file_prefix
                    .clone()
                    .unwrap_or_else(|| "CTY".to_string()),
                registration_suffix: config
                    .registration_suffix
                    .clone()
                    .unwrap_or_else(|| "_vr.csv".to_string()),
                history_suffix: config
                    .history_suffix
                    .clone()
                    .unwrap_or_else(|| "_vh.csv".to_string()),
            },
        };
        info!("settings: {:?}", res);
        Ok(res)
    }
}

fn election_from_date(date: &str) -> TurnoutResult<ElectionDate> {
    ElectionDate::parse(date).context(InvalidElectionDateSnafu {})
}

fn election_from_year(year: u32) -> TurnoutResult<ElectionDate> {
    presidential_election_date(year).context(UnknownElectionYearSnafu { year })
}

pub fn read_config(path: &str) -> TurnoutResult<TurnoutConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

pub fn key_to_js(key: &Key) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (age, ratio) in key.ratios() {
        m.insert(age.to_string(), json!(ratio));
    }
    JSValue::Object(m)
}

pub fn write_key(path: &Path, key: &Key) -> TurnoutResult<()> {
    let path_s = path.display().to_string();
    let js = serde_json::to_string(&key_to_js(key)).context(ParsingJsonSnafu { path: &path_s })?;
    fs::write(path, js).context(WritingOutputSnafu { path: &path_s })
}

pub fn read_key(path: &Path) -> TurnoutResult<Key> {
    let path_s = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: &path_s })?;
    let js: JSValue =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: &path_s })?;
    let obj = match js {
        JSValue::Object(obj) => obj,
        _ => whatever!("key file {} is not a JSON object", path_s),
    };
    let mut ratios = BTreeMap::new();
    for (age_s, v) in obj.iter() {
        let age = age_s
            .parse::<Age>()
            .context(InvalidKeySnafu { path: &path_s })?;
        let ratio = match v.as_f64() {
            Some(x) => x,
            None => whatever!("key file {}: age {} has no ratio: {}", path_s, age_s, v),
        };
        ratios.insert(age, ratio);
    }
    debug!("read_key: {} ages from {}", ratios.len(), path_s);
    Ok(Key::new(ratios))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config: TurnoutConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TurnoutConfig::default());
        let cols = config.registration_columns.unwrap_or_default();
        assert_eq!(cols.voter_id(), "VoterID");
        assert_eq!(cols.original_registration(), "OriginalRegistration");
    }

    #[test]
    fn config_renamed_columns() {
        let config: TurnoutConfig = serde_json::from_str(
            r#"{"historyColumns": {"electionDate": "Date"}, "legacySchema": true}"#,
        )
        .unwrap();
        let cols = config.history_columns.unwrap();
        assert_eq!(cols.election_date(), "Date");
        assert_eq!(cols.voter_id(), "VoterID");
        assert_eq!(config.legacy_schema, Some(true));
    }

    #[test]
    fn key_json() {
        let key = Key::new(
            vec![(Age::Years(18), 0.5), (Age::BeforeBirth(-101), 2.0)]
                .into_iter()
                .collect(),
        );
        assert_eq!(key_to_js(&key), json!({"18": 0.5, "-0.0101": 2.0}));
    }
}

// ********* Input data structures ***********

use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::Display;
use std::path::PathBuf;

/// A date in the comparable `YYYYMMDD` integer form.
///
/// The value is built by concatenating the textual year, month and day.
/// It orders dates correctly when all the inputs are zero-padded, but the
/// difference between two keys is not a number of days.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct DateKey(pub i64);

impl Display for DateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The election of reference.
///
/// The text form is matched exactly against the election dates found in the
/// vote histories. The key form is used for ages and registration dates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionDate {
    pub(crate) text: String,
    pub(crate) key: DateKey,
}

/// One row of a county registration roll.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RegistrationRecord {
    pub voter_id: String,
    pub status: String,
    /// MM/DD/YYYY, may be blank.
    pub birth_date: String,
    /// MM/DD/YYYY, may be blank.
    pub registration_date: String,
}

/// One row of a county vote history.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct HistoryRecord {
    pub voter_id: String,
    pub election_date: String,
    pub voting_method: String,
}

/// The age of a voter on the day of the election.
///
/// A birth date recorded after the election cannot be turned into a number of
/// years. Such voters keep the raw (negative) key difference so that they stay
/// in their own buckets instead of being folded into a real age.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Age {
    /// Raw `reference - birth` difference, always negative.
    BeforeBirth(i64),
    Years(i64),
}

impl Age {
    pub fn as_f64(&self) -> f64 {
        match self {
            Age::BeforeBirth(diff) => *diff as f64 / 10000.0,
            Age::Years(y) => *y as f64,
        }
    }
}

impl Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Age::Years(y) => write!(f, "{}", y),
            Age::BeforeBirth(_) => {
                let x = self.as_f64();
                if x.fract() == 0.0 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
        }
    }
}

impl std::str::FromStr for Age {
    type Err = TurnoutErrors;

    /// Reads the text form of an age, as found in the keys of a key file.
    fn from_str(s: &str) -> Result<Age, TurnoutErrors> {
        let t = s.trim();
        if let Ok(y) = t.parse::<i64>() {
            return if y >= 0 {
                Ok(Age::Years(y))
            } else {
                y.checked_mul(10000)
                    .map(Age::BeforeBirth)
                    .ok_or_else(|| TurnoutErrors::InvalidAge(s.to_string()))
            };
        }
        match t.parse::<f64>() {
            Ok(x) if x < 0.0 && x * 10000.0 > i64::MIN as f64 => {
                Ok(Age::BeforeBirth((x * 10000.0).round() as i64))
            }
            _ => Err(TurnoutErrors::InvalidAge(s.to_string())),
        }
    }
}

/// Voter id -> age.
///
/// Used both for the voters registered for the election and for all the
/// voters of a roll.
pub type VoterAges = HashMap<String, Age>;

/// Age -> number of voters (or number of votes).
pub type AgeCounts = BTreeMap<Age, u64>;

/// Age -> turnout at that age divided by the overall turnout of the county.
pub type NormalizedTurnout = BTreeMap<Age, f64>;

// ******** Output data structures *********

/// Counters collected while reading a registration roll.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ReconcileStats {
    pub rows: u64,
    pub missing_birth_date: u64,
    pub invalid_birth_date: u64,
    pub invalid_registration_date: u64,
    /// Registered after the election.
    pub late_registration: u64,
    /// No registration date and a status other than active.
    pub inactive: u64,
}

/// The two views of a registration roll.
#[derive(PartialEq, Debug, Clone)]
pub struct RegistrationRoll {
    /// The voters considered registered for the election.
    pub registered: VoterAges,
    /// Every voter with a usable birth date.
    pub all: VoterAges,
    pub stats: ReconcileStats,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CountStats {
    /// Rows of the history for the election of reference.
    pub matching_rows: u64,
    /// Distinct voters found voting while absent from the registered voters,
    /// and recovered from the full roll.
    pub promoted: usize,
    /// Distinct voters found voting with no known age.
    pub no_age: usize,
    pub methods: BTreeMap<String, u64>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteCount {
    pub votes: AgeCounts,
    pub stats: CountStats,
}

/// The per-age counts of a single county.
#[derive(PartialEq, Debug, Clone)]
pub struct CountyTally {
    pub registered: AgeCounts,
    pub votes: AgeCounts,
    pub reconcile: ReconcileStats,
    pub count: CountStats,
}

/// The cross-county model: age -> average normalized turnout.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Key {
    pub(crate) ratios: BTreeMap<Age, f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PredictionPoint {
    pub age: Age,
    pub registered: u64,
    pub actual: u64,
    pub predicted: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Prediction {
    pub overall_turnout: f64,
    /// Sorted by age.
    pub points: Vec<PredictionPoint>,
    /// Ages with both voters and votes, but no entry in the key.
    pub missing_from_key: Vec<Age>,
}

/// The registration and history files of one county.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountyFilePair {
    pub prefix: String,
    pub registration: PathBuf,
    pub history: PathBuf,
}

/// A prefix that did not match exactly one file in each source.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairingFailure {
    pub prefix: String,
    pub files: Vec<PathBuf>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VoterRoll {
    All,
    Registered,
}

/// Errors that prevent a county from being processed.
#[derive(PartialEq, Debug, Clone)]
pub enum TurnoutErrors {
    DuplicateVoterId { voter_id: String, roll: VoterRoll },
    /// The total number of registered voters is zero.
    NoRegisteredVoters,
    NoRegistrantsAtAge(Age),
    MissingKeyAge(Age),
    InvalidDate(String),
    InvalidAge(String),
}

impl Error for TurnoutErrors {}

impl Display for TurnoutErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnoutErrors::DuplicateVoterId { voter_id, roll } => {
                let name = match roll {
                    VoterRoll::All => "all voters",
                    VoterRoll::Registered => "registered voters",
                };
                write!(f, "voter ID {} appears twice in {}", voter_id, name)
            }
            TurnoutErrors::NoRegisteredVoters => write!(f, "no registered voters"),
            TurnoutErrors::NoRegistrantsAtAge(age) => {
                write!(f, "no registered voters at age {}", age)
            }
            TurnoutErrors::MissingKeyAge(age) => write!(f, "age {} is missing from the key", age),
            TurnoutErrors::InvalidDate(s) => write!(f, "invalid date {:?}, expected MM/DD/YYYY", s),
            TurnoutErrors::InvalidAge(s) => write!(f, "invalid age {:?}", s),
        }
    }
}

mod age;
pub mod builder;
mod config;
pub mod manual;
mod pairing;

use log::{debug, info, warn};

use std::collections::{BTreeMap, HashSet};

pub use crate::age::*;
pub use crate::config::*;
pub use crate::pairing::*;

/// The status code of an active voter.
const ACTIVE_STATUS: &str = "A";

/// Reads a registration roll.
///
/// Returns the voters registered for the election of reference and all the
/// voters that have a usable birth date, both mapped to their age at the
/// reference date.
///
/// A voter is registered if the registration date is not after the reference
/// date. When there is no registration date, only active voters are
/// considered registered.
///
/// A voter id that appears twice fails the whole roll.
pub fn reconcile_registrations(
    records: &[RegistrationRecord],
    reference: DateKey,
) -> Result<RegistrationRoll, TurnoutErrors> {
    let mut registered = VoterAges::new();
    let mut all = VoterAges::new();
    let mut stats = ReconcileStats::default();

    for r in records.iter() {
        stats.rows += 1;
        if r.birth_date.trim().is_empty() {
            debug!("voter ID {} has no birth date", r.voter_id);
            stats.missing_birth_date += 1;
            continue;
        }
        let birth = match parse_date(&r.birth_date) {
            Some(d) => d,
            None => {
                debug!(
                    "voter ID {} has invalid birth date {:?}",
                    r.voter_id, r.birth_date
                );
                stats.invalid_birth_date += 1;
                continue;
            }
        };
        let a = age(birth, reference);

        if all.insert(r.voter_id.clone(), a).is_some() {
            return Err(TurnoutErrors::DuplicateVoterId {
                voter_id: r.voter_id.clone(),
                roll: VoterRoll::All,
            });
        }

        if r.registration_date.trim().is_empty() {
            if r.status.trim() != ACTIVE_STATUS {
                stats.inactive += 1;
                continue;
            }
        } else {
            match parse_date(&r.registration_date) {
                Some(d) if d > reference => {
                    stats.late_registration += 1;
                    continue;
                }
                Some(_) => {}
                None => {
                    warn!(
                        "voter ID {} has invalid registration date {:?}",
                        r.voter_id, r.registration_date
                    );
                    stats.invalid_registration_date += 1;
                    continue;
                }
            }
        }

        if registered.insert(r.voter_id.clone(), a).is_some() {
            return Err(TurnoutErrors::DuplicateVoterId {
                voter_id: r.voter_id.clone(),
                roll: VoterRoll::Registered,
            });
        }
    }

    if stats.missing_birth_date + stats.invalid_birth_date > 0 {
        info!(
            "skipped voters: {} without birth date, {} with an invalid birth date",
            stats.missing_birth_date, stats.invalid_birth_date
        );
    }
    info!("registered voters: {}", registered.len());
    info!("all voters: {}", all.len());
    Ok(RegistrationRoll {
        registered,
        all,
        stats,
    })
}

/// Counts the votes cast by age in the given election.
///
/// A vote from someone absent from `registered` but present in `all` is
/// taken as proof of registration: that voter is added to `registered`.
/// Votes from voters with no known age are not counted.
pub fn count_votes(
    records: &[HistoryRecord],
    registered: &mut VoterAges,
    all: &VoterAges,
    election_date: &str,
) -> VoteCount {
    let mut votes = AgeCounts::new();
    let mut methods: BTreeMap<String, u64> = BTreeMap::new();
    let mut promoted: HashSet<&str> = HashSet::new();
    let mut no_age: HashSet<&str> = HashSet::new();
    let mut matching_rows: u64 = 0;

    for r in records.iter() {
        if r.election_date != election_date {
            continue;
        }
        matching_rows += 1;
        let known = registered.get(&r.voter_id).copied();
        let a = match known {
            Some(a) => a,
            None => match all.get(&r.voter_id) {
                Some(a) => {
                    debug!("count_votes: promoting voter ID {}", r.voter_id);
                    registered.insert(r.voter_id.clone(), *a);
                    promoted.insert(r.voter_id.as_str());
                    *a
                }
                None => {
                    no_age.insert(r.voter_id.as_str());
                    continue;
                }
            },
        };
        *votes.entry(a).or_insert(0) += 1;
        *methods.entry(r.voting_method.clone()).or_insert(0) += 1;
    }

    info!("vote methods: {:?}", methods);
    info!("unregistered voters: {}", promoted.len() + no_age.len());
    info!("voters with no age: {}", no_age.len());
    VoteCount {
        votes,
        stats: CountStats {
            matching_rows,
            promoted: promoted.len(),
            no_age: no_age.len(),
            methods,
        },
    }
}

/// Number of voters for each age.
pub fn count_by_age(voters: &VoterAges) -> AgeCounts {
    let mut res = AgeCounts::new();
    for a in voters.values() {
        *res.entry(*a).or_insert(0) += 1;
    }
    res
}

/// All the votes divided by all the registered voters.
pub fn overall_turnout(voters: &AgeCounts, votes: &AgeCounts) -> Result<f64, TurnoutErrors> {
    let total_voters: u64 = voters.values().sum();
    if total_voters == 0 {
        return Err(TurnoutErrors::NoRegisteredVoters);
    }
    let total_votes: u64 = votes.values().sum();
    Ok(total_votes as f64 / total_voters as f64)
}

// Ages with both registered voters and votes, in increasing order.
fn common_ages(voters: &AgeCounts, votes: &AgeCounts) -> Vec<Age> {
    voters
        .keys()
        .filter(|a| votes.contains_key(*a))
        .cloned()
        .collect()
}

/// Votes divided by registered voters, for each age with both.
pub fn turnout_by_age(
    voters: &AgeCounts,
    votes: &AgeCounts,
) -> Result<BTreeMap<Age, f64>, TurnoutErrors> {
    let mut res = BTreeMap::new();
    for a in common_ages(voters, votes) {
        let num_voters = voters[&a];
        if num_voters == 0 {
            return Err(TurnoutErrors::NoRegistrantsAtAge(a));
        }
        res.insert(a, votes[&a] as f64 / num_voters as f64);
    }
    Ok(res)
}

/// The turnout at each age, relative to the overall turnout of the county.
///
/// Only the ages present in both maps are returned, but the overall turnout
/// is computed over the full maps.
pub fn normalize(voters: &AgeCounts, votes: &AgeCounts) -> Result<NormalizedTurnout, TurnoutErrors> {
    let overall = overall_turnout(voters, votes)?;
    let turnouts = turnout_by_age(voters, votes)?;
    debug!(
        "normalize: overall turnout {} over {} ages",
        overall,
        turnouts.len()
    );
    Ok(turnouts
        .into_iter()
        .map(|(a, t)| (a, t / overall))
        .collect())
}

/// Runs the registration, vote and age counts for one county.
pub fn tally_county(
    registrations: &[RegistrationRecord],
    history: &[HistoryRecord],
    election: &ElectionDate,
) -> Result<CountyTally, TurnoutErrors> {
    let mut roll = reconcile_registrations(registrations, election.key())?;
    let vc = count_votes(history, &mut roll.registered, &roll.all, election.text());
    let registered = count_by_age(&roll.registered);
    Ok(CountyTally {
        registered,
        votes: vc.votes,
        reconcile: roll.stats,
        count: vc.stats,
    })
}

impl CountyTally {
    pub fn overall_turnout(&self) -> Result<f64, TurnoutErrors> {
        overall_turnout(&self.registered, &self.votes)
    }

    pub fn turnout_by_age(&self) -> Result<BTreeMap<Age, f64>, TurnoutErrors> {
        turnout_by_age(&self.registered, &self.votes)
    }

    pub fn normalized(&self) -> Result<NormalizedTurnout, TurnoutErrors> {
        normalize(&self.registered, &self.votes)
    }
}

impl Key {
    pub fn new(ratios: BTreeMap<Age, f64>) -> Key {
        Key { ratios }
    }

    pub fn ratio(&self, age: &Age) -> Result<f64, TurnoutErrors> {
        self.ratios
            .get(age)
            .cloned()
            .ok_or(TurnoutErrors::MissingKeyAge(*age))
    }

    pub fn ratios(&self) -> &BTreeMap<Age, f64> {
        &self.ratios
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }
}

/// Predicts the votes of a county from its registered voters and a key.
///
/// For each age with both voters and votes, the prediction is
/// `voters * overall turnout * key ratio`. Ages that the key does not cover
/// are left out of the points and reported in `missing_from_key`.
pub fn predict_votes(tally: &CountyTally, key: &Key) -> Result<Prediction, TurnoutErrors> {
    let overall = tally.overall_turnout()?;
    let mut points: Vec<PredictionPoint> = Vec::new();
    let mut missing_from_key: Vec<Age> = Vec::new();
    for a in common_ages(&tally.registered, &tally.votes) {
        let registered = tally.registered[&a];
        match key.ratio(&a) {
            Ok(ratio) => points.push(PredictionPoint {
                age: a,
                registered,
                actual: tally.votes[&a],
                predicted: registered as f64 * overall * ratio,
            }),
            Err(e) => {
                warn!("predict_votes: {}", e);
                missing_from_key.push(a);
            }
        }
    }
    Ok(Prediction {
        overall_turnout: overall,
        points,
        missing_from_key,
    })
}

impl Prediction {
    /// Keeps the ages with strictly more than `minimum` registered voters.
    pub fn above_minimum(&self, minimum: u64) -> Prediction {
        Prediction {
            overall_turnout: self.overall_turnout,
            points: self
                .points
                .iter()
                .filter(|p| p.registered > minimum)
                .cloned()
                .collect(),
            missing_from_key: self.missing_from_key.clone(),
        }
    }
}

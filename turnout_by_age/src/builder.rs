pub use crate::config::*;

use log::{info, warn};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Accumulates the normalized turnouts of many counties into a key.
///
/// ```
/// use turnout_by_age::builder::KeyBuilder;
/// use turnout_by_age::{Age, NormalizedTurnout};
///
/// let mut builder = KeyBuilder::new();
/// let county: NormalizedTurnout = vec![(Age::Years(40), 1.2)].into_iter().collect();
/// builder.add_county("CTY01", &county);
/// builder.add_failure("CTY02", "voter ID 7 appears twice in all voters");
///
/// let key = builder.build();
/// assert_eq!(key.ratio(&Age::Years(40)), Ok(1.2));
/// assert_eq!(builder.num_failures(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyBuilder {
    samples: BTreeMap<Age, Vec<f64>>,
    num_counties: usize,
    failures: Vec<(String, String)>,
}

impl KeyBuilder {
    pub fn new() -> KeyBuilder {
        KeyBuilder::default()
    }

    pub fn add_county(&mut self, name: &str, turnout: &NormalizedTurnout) {
        info!("add_county: {}: {} ages", name, turnout.len());
        self.num_counties += 1;
        for (a, ratio) in turnout.iter() {
            self.samples.entry(*a).or_default().push(*ratio);
        }
    }

    /// Records a county that could not be processed. It does not contribute
    /// to the key.
    pub fn add_failure(&mut self, name: &str, reason: impl Display) {
        warn!("error parsing {}: {}", name, reason);
        self.num_counties += 1;
        self.failures.push((name.to_string(), reason.to_string()));
    }

    pub fn add_result<E: Display>(&mut self, name: &str, res: Result<NormalizedTurnout, E>) {
        match res {
            Ok(turnout) => self.add_county(name, &turnout),
            Err(e) => self.add_failure(name, e),
        }
    }

    /// All the counties seen so far, including the failures.
    pub fn num_counties(&self) -> usize {
        self.num_counties
    }

    pub fn num_failures(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[(String, String)] {
        &self.failures
    }

    /// Averages, for each age, the ratios of the counties that reported it.
    pub fn build(&self) -> Key {
        let ratios = self
            .samples
            .iter()
            .map(|(a, l)| (*a, l.iter().sum::<f64>() / l.len() as f64))
            .collect();
        Key { ratios }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turnout(l: &[(i64, f64)]) -> NormalizedTurnout {
        l.iter().map(|(a, r)| (Age::Years(*a), *r)).collect()
    }

    #[test]
    fn averages_over_reporting_counties() {
        let mut b = KeyBuilder::new();
        b.add_county("A", &turnout(&[(40, 0.9), (18, 0.5)]));
        b.add_county("B", &turnout(&[(40, 1.0)]));
        b.add_county("C", &turnout(&[(40, 1.1)]));
        let key = b.build();
        assert!((key.ratio(&Age::Years(40)).unwrap() - 1.0).abs() < 1e-12);
        // Only one county had voters at 18: no zeros from the others.
        assert_eq!(key.ratio(&Age::Years(18)), Ok(0.5));
        assert_eq!(key.len(), 2);
    }

    #[test]
    fn failures_are_counted_but_excluded() {
        let mut b = KeyBuilder::new();
        b.add_result::<TurnoutErrors>("A", Ok(turnout(&[(30, 2.0)])));
        b.add_result("B", Err(TurnoutErrors::NoRegisteredVoters));
        assert_eq!(b.num_counties(), 2);
        assert_eq!(b.num_failures(), 1);
        assert_eq!(b.failures()[0].0, "B");
        assert_eq!(b.build().ratio(&Age::Years(30)), Ok(2.0));
    }

    #[test]
    fn empty_key() {
        let key = KeyBuilder::new().build();
        assert!(key.is_empty());
        assert_eq!(
            key.ratio(&Age::Years(1)),
            Err(TurnoutErrors::MissingKeyAge(Age::Years(1)))
        );
    }
}

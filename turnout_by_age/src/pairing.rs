use crate::config::*;

use log::warn;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The county prefix of a file: its name up to the first underscore.
pub fn county_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.split_once('_') {
        Some((p, _)) => p.to_string(),
        None => name,
    }
}

/// Pairs registration and history files sharing a county prefix.
///
/// A prefix must match exactly one file of each kind. The other prefixes are
/// returned as failures, with the files they matched.
pub fn pair_files(
    registration_files: &[PathBuf],
    history_files: &[PathBuf],
) -> (Vec<CountyFilePair>, Vec<PairingFailure>) {
    let mut groups: BTreeMap<String, (Vec<PathBuf>, Vec<PathBuf>)> = BTreeMap::new();
    for p in registration_files.iter() {
        groups.entry(county_prefix(p)).or_default().0.push(p.clone());
    }
    for p in history_files.iter() {
        groups.entry(county_prefix(p)).or_default().1.push(p.clone());
    }

    let mut pairs: Vec<CountyFilePair> = Vec::new();
    let mut failures: Vec<PairingFailure> = Vec::new();
    for (prefix, (regs, hists)) in groups.into_iter() {
        if let ([registration], [history]) = (regs.as_slice(), hists.as_slice()) {
            pairs.push(CountyFilePair {
                prefix,
                registration: registration.clone(),
                history: history.clone(),
            });
            continue;
        }
        let mut files = regs;
        files.extend(hists);
        warn!("prefix {} not paired properly: {:?}", prefix, files);
        failures.push(PairingFailure { prefix, files });
    }
    (pairs, failures)
}

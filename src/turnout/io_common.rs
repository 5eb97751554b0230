use std::fs;
use std::path::{Path, PathBuf};

use crate::turnout::*;

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// The files of a folder, in name order. Hidden files are ignored.
pub fn list_files(dir: &Path) -> TurnoutResult<Vec<PathBuf>> {
    let path = dir.display().to_string();
    let mut res: Vec<PathBuf> = Vec::new();
    for entry_r in fs::read_dir(dir).context(ReadingDirSnafu { path: &path })? {
        let entry = entry_r.context(ReadingDirSnafu { path: &path })?;
        let p = entry.path();
        if simplify_file_name(&p).starts_with('.') || !p.is_file() {
            debug!("list_files: skipping {}", p.display());
            continue;
        }
        res.push(p);
    }
    res.sort();
    Ok(res)
}

/// The registration and history files of a single county, from its id.
pub fn county_files(settings: &Settings, county: &str) -> TurnoutResult<CountyFilePair> {
    let names = &settings.county_files;
    let prefix = format!("{}{}", names.prefix, county);
    let registration = settings
        .registered_voters_folder
        .join(format!("{}{}", prefix, names.registration_suffix));
    let history = settings
        .voter_history_folder
        .join(format!("{}{}", prefix, names.history_suffix));
    for p in [&registration, &history] {
        ensure!(
            p.is_file(),
            MissingCountyFileSnafu {
                county,
                path: p.display().to_string(),
            }
        );
    }
    Ok(CountyFilePair {
        prefix,
        registration,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(
            simplify_file_name(Path::new("/a/b/CTY01_vr.csv")),
            "CTY01_vr.csv"
        );
    }

    #[test]
    fn hidden_files_and_folders_are_skipped() {
        let dir = std::env::temp_dir().join(format!("turnout-list-{}", std::process::id()));
        fs::create_dir_all(dir.join("CTY06_old")).unwrap();
        fs::write(dir.join("CTY05_vr.csv"), "VoterID\n").unwrap();
        fs::write(dir.join(".CTY05_vr.csv.swp"), "swap\n").unwrap();
        fs::write(dir.join(".hidden"), "").unwrap();
        let files = list_files(&dir).unwrap();
        assert_eq!(files, vec![dir.join("CTY05_vr.csv")]);
    }

    #[test]
    fn missing_folder() {
        let res = list_files(Path::new("/this/folder/does/not/exist"));
        assert!(matches!(res, Err(TurnoutError::ReadingDir { .. })));
    }
}

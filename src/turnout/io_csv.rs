// Primitives for reading the CSV extracts of the counties.

use std::fs;
use std::path::Path;

use csv::StringRecord;
use encoding_rs::WINDOWS_1252;

use crate::turnout::{config_reader::ColumnSchema, io_common::simplify_file_name, *};

// Fixed positions of the columns in the legacy extracts.
const LEGACY_REGISTRATION: RegistrationLayout = RegistrationLayout {
    voter_id: 5,
    status: 7,
    birth_date: 16,
    registration_date: 17,
};
const LEGACY_HISTORY: HistoryLayout = HistoryLayout {
    voter_id: 0,
    election_date: 1,
    voting_method: 2,
};

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct RegistrationLayout {
    voter_id: usize,
    status: usize,
    birth_date: usize,
    registration_date: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct HistoryLayout {
    voter_id: usize,
    election_date: usize,
    voting_method: usize,
}

pub fn read_registrations(
    path: &Path,
    schema: &ColumnSchema,
) -> TurnoutResult<Vec<RegistrationRecord>> {
    let path_s = path.display().to_string();
    let contents = decode_file(path)?;
    let mut rdr = csv_reader(contents.as_str());
    let header = rdr
        .headers()
        .context(CsvLineParseSnafu { path: &path_s })?
        .clone();
    let layout = if schema.legacy {
        LEGACY_REGISTRATION
    } else {
        let cols = &schema.registration;
        RegistrationLayout {
            voter_id: column_index(&header, cols.voter_id(), &path_s)?,
            status: column_index(&header, cols.status(), &path_s)?,
            birth_date: column_index(&header, cols.date_of_birth(), &path_s)?,
            registration_date: column_index(&header, cols.original_registration(), &path_s)?,
        }
    };
    debug!("read_registrations: {}: {:?}", path_s, layout);

    let mut res: Vec<RegistrationRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path: &path_s })?;
        let fields = (
            line.get(layout.voter_id),
            line.get(layout.status),
            line.get(layout.birth_date),
            line.get(layout.registration_date),
        );
        match fields {
            (Some(voter_id), Some(status), Some(birth_date), Some(registration_date)) => {
                res.push(RegistrationRecord {
                    voter_id: voter_id.to_string(),
                    status: status.to_string(),
                    birth_date: birth_date.to_string(),
                    registration_date: registration_date.to_string(),
                });
            }
            _ => warn!(
                "{}:{}: line too short ({} fields), skipping",
                simplify_file_name(path),
                lineno,
                line.len()
            ),
        }
    }
    Ok(res)
}

pub fn read_history(path: &Path, schema: &ColumnSchema) -> TurnoutResult<Vec<HistoryRecord>> {
    let path_s = path.display().to_string();
    let contents = decode_file(path)?;
    let mut rdr = csv_reader(contents.as_str());
    let header = rdr
        .headers()
        .context(CsvLineParseSnafu { path: &path_s })?
        .clone();
    let layout = if schema.legacy {
        LEGACY_HISTORY
    } else {
        let cols = &schema.history;
        HistoryLayout {
            voter_id: column_index(&header, cols.voter_id(), &path_s)?,
            election_date: column_index(&header, cols.election_date(), &path_s)?,
            voting_method: column_index(&header, cols.voting_method(), &path_s)?,
        }
    };
    debug!("read_history: {}: {:?}", path_s, layout);

    let mut res: Vec<HistoryRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path: &path_s })?;
        let fields = (
            line.get(layout.voter_id),
            line.get(layout.election_date),
            line.get(layout.voting_method),
        );
        match fields {
            (Some(voter_id), Some(election_date), Some(voting_method)) => {
                res.push(HistoryRecord {
                    voter_id: voter_id.to_string(),
                    election_date: election_date.to_string(),
                    voting_method: voting_method.to_string(),
                });
            }
            _ => warn!(
                "{}:{}: line too short ({} fields), skipping",
                simplify_file_name(path),
                lineno,
                line.len()
            ),
        }
    }
    Ok(res)
}

// The extracts are Latin-1. A byte order mark switches to UTF-8.
fn decode_file(path: &Path) -> TurnoutResult<String> {
    let bytes = fs::read(path).context(OpeningCsvSnafu {
        path: path.display().to_string(),
    })?;
    let (contents, encoding, had_errors) = WINDOWS_1252.decode(&bytes);
    if had_errors {
        warn!(
            "{}: some characters could not be decoded as {}",
            simplify_file_name(path),
            encoding.name()
        );
    }
    Ok(contents.into_owned())
}

fn csv_reader(contents: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(contents.as_bytes())
}

fn column_index(header: &StringRecord, name: &str, path: &str) -> TurnoutResult<usize> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .context(MissingColumnSnafu { column: name, path })
}

use crate::config::*;

/// Converts `MM/DD/YYYY` to its `YYYYMMDD` key.
///
/// The tokens are concatenated as text, so `1/2/1990` becomes `199012`. Only
/// zero-padded dates compare correctly.
pub fn parse_date(text: &str) -> Option<DateKey> {
    let tokens: Vec<&str> = text.trim().split('/').collect();
    if tokens.len() != 3 {
        return None;
    }
    if tokens
        .iter()
        .any(|t| t.is_empty() || !t.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    let s = format!("{}{}{}", tokens[2], tokens[0], tokens[1]);
    match s.parse::<i64>() {
        // A zero key is as good as no date at all.
        Ok(0) | Err(_) => None,
        Ok(x) => Some(DateKey(x)),
    }
}

/// The age in whole years at `reference` of someone born at `birth`.
///
/// This is the key difference divided by 10000, and may be off by one year
/// around birthdays. A birth after the reference keeps the raw difference,
/// see [`Age::BeforeBirth`].
pub fn age(birth: DateKey, reference: DateKey) -> Age {
    let diff = reference.0 - birth.0;
    if diff < 0 {
        Age::BeforeBirth(diff)
    } else {
        Age::Years(diff / 10000)
    }
}

// General election day in November, for the presidential years.
const PRESIDENTIAL_ELECTION_DAYS: [(u32, &str); 6] = [
    (2000, "07"),
    (2004, "02"),
    (2008, "04"),
    (2012, "06"),
    (2016, "08"),
    (2020, "03"),
];

/// The date of the presidential general election of the given year, if known.
pub fn presidential_election_date(year: u32) -> Option<ElectionDate> {
    PRESIDENTIAL_ELECTION_DAYS
        .iter()
        .find(|(y, _)| *y == year)
        .and_then(|(y, day)| ElectionDate::parse(&format!("11/{}/{}", day, y)).ok())
}

impl ElectionDate {
    /// Unlike the dates of the voter files, the election date must be
    /// zero-padded: `MM/DD/YYYY` exactly.
    pub fn parse(text: &str) -> Result<ElectionDate, TurnoutErrors> {
        let invalid = || TurnoutErrors::InvalidDate(text.to_string());
        let widths: Vec<usize> = text.trim().split('/').map(str::len).collect();
        if widths != [2, 2, 4] {
            return Err(invalid());
        }
        let key = parse_date(text).ok_or_else(invalid)?;
        Ok(ElectionDate {
            text: text.trim().to_string(),
            key,
        })
    }

    /// The exact text matched against the vote histories.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn key(&self) -> DateKey {
        self.key
    }

    pub fn year(&self) -> i64 {
        self.key.0 / 10000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_dates() {
        assert_eq!(parse_date("11/03/2020"), Some(DateKey(20201103)));
        assert_eq!(parse_date(" 01/31/1999 "), Some(DateKey(19990131)));
        assert_eq!(parse_date("12/25/1950"), Some(DateKey(1950 * 10000 + 12 * 100 + 25)));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("11/03"), None);
        assert_eq!(parse_date("11/03/2020/1"), None);
        assert_eq!(parse_date("2020-11-03"), None);
        assert_eq!(parse_date("ab/03/2020"), None);
        assert_eq!(parse_date("00/00/0000"), None);
    }

    #[test]
    fn concatenates_unpadded_tokens() {
        assert_eq!(parse_date("1/2/1990"), Some(DateKey(199012)));
    }

    #[test]
    fn whole_years() {
        assert_eq!(age(DateKey(19900101), DateKey(20201103)), Age::Years(30));
        assert_eq!(age(DateKey(19901104), DateKey(20201103)), Age::Years(29));
        assert_eq!(age(DateKey(20201103), DateKey(20201103)), Age::Years(0));
    }

    #[test]
    fn birth_after_reference() {
        let a = age(DateKey(20211204), DateKey(20201103));
        assert_eq!(a, Age::BeforeBirth(-10101));
        assert_eq!(a.as_f64(), -1.0101);
        assert_eq!(a.to_string(), "-1.0101");
    }

    #[test]
    fn age_text_is_read_back() {
        for a in [Age::Years(0), Age::Years(42), Age::BeforeBirth(-101), Age::BeforeBirth(-10000)] {
            let parsed: Age = a.to_string().parse().unwrap();
            assert_eq!(parsed, a);
        }
        assert_eq!(Age::BeforeBirth(-10000).to_string(), "-1.0");
        assert!("thirty".parse::<Age>().is_err());
        assert!("3.5".parse::<Age>().is_err());
        assert_eq!(
            "-1000000000000000".parse::<Age>(),
            Err(TurnoutErrors::InvalidAge("-1000000000000000".to_string()))
        );
        assert!("-1e300".parse::<Age>().is_err());
    }

    #[test]
    fn presidential_years() {
        let d = presidential_election_date(2016).unwrap();
        assert_eq!(d.text(), "11/08/2016");
        assert_eq!(d.key(), DateKey(20161108));
        assert_eq!(d.year(), 2016);
        assert_eq!(presidential_election_date(2020).unwrap().text(), "11/03/2020");
        assert!(presidential_election_date(2018).is_none());
    }

    #[test]
    fn election_date_errors() {
        assert_eq!(
            ElectionDate::parse("2020"),
            Err(TurnoutErrors::InvalidDate("2020".to_string()))
        );
        for unpadded in ["11/3/2020", "1/03/2020", "11/03/20", "011/03/2020"] {
            assert_eq!(
                ElectionDate::parse(unpadded),
                Err(TurnoutErrors::InvalidDate(unpadded.to_string()))
            );
        }
        assert_eq!(ElectionDate::parse(" 11/03/2020 ").unwrap().text(), "11/03/2020");
    }
}

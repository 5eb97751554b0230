/*!

This is the long-form manual for `turnout_by_age` and the `turnout` command.

## Overview

The key relates the age of a registered voter to how likely that voter is to
vote, compared to the rest of the county. It is built from many counties and
then used to predict the votes of a county from its registration roll alone.

For a county with `V(a)` registered voters and `N(a)` votes at age `a`:

```text
overall turnout  T = sum(N) / sum(V)
normalized       R(a) = N(a) / V(a) / T
```

The key at age `a` is the average of `R(a)` over the counties that have both
voters and votes at that age. The prediction for a county is
`V(a) * T * key(a)`.

## Input files

### Registration rolls

One CSV file per county, in the registered voters folder. The header must
contain the columns:

| column                 | content                               |
|------------------------|---------------------------------------|
| `VoterID`              | opaque voter identifier               |
| `Status`               | `A` for active voters                 |
| `DateOfBirth`          | `MM/DD/YYYY`                          |
| `OriginalRegistration` | `MM/DD/YYYY`, may be blank            |

The column names can be changed in the configuration. With `legacySchema`,
the columns are read at fixed positions instead (5, 7, 16 and 17, counting
from 0) and the header is ignored.

Voters without a usable birth date are left out entirely. A voter is
registered for the election if the registration date is not after the
election, or if there is no registration date and the status is `A`.
A voter id that appears twice in a roll makes the whole county fail.

### Vote histories

One CSV file per county, in the voter history folder, with the columns
`VoterID`, `ElectionDate` and `VotingMethod` (positions 0, 1 and 2 for the
legacy schema). Only the rows whose election date is exactly the election
of reference (same text, `MM/DD/YYYY`) are counted.

A voter who voted but is not registered according to the roll is considered
registered, as long as the roll knows the age of that voter.

### Pairing

The files of a county share the prefix of their name up to the first
underscore, for example `CTY01_vr.csv` and `CTY01_vh.csv`. A prefix must
match exactly one file in each folder. Hidden files are ignored.

Files are decoded as Latin-1.

## Ages

Ages are computed from the `YYYYMMDD` form of the dates, as
`(election - birth) / 10000`, and may be off by one year around birthdays.
A birth date after the election gives a negative fractional value such as
`-0.0101`, which is kept as its own bucket.

## Key file

A JSON object from the age, as text, to the average ratio:

```json
{"18": 0.61, "19": 0.58, "45": 1.07}
```

## Configuration

All the fields are optional.

```json
{
  "registeredVotersFolder": "./voter_database/registered_voters",
  "voterHistoryFolder": "./voter_database/voter_history",
  "keyFile": "./key.json",
  "electionDate": "11/03/2020",
  "minimumRegisteredVoters": 50,
  "legacySchema": false,
  "countyFilePrefix": "CTY",
  "registrationSuffix": "_vr.csv",
  "historySuffix": "_vh.csv"
}
```

`electionYear` may be given instead of `electionDate` for the presidential
elections from 2000 to 2020.
*/

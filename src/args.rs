use clap::{Parser, Subcommand};

/// Predicts voter turnout by age from county voter rolls and vote histories.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. Relative folders in this file are read
    /// from the folder of the configuration file. See the manual of turnout_by_age for the format.
    #[clap(short, long, value_parser, global = true)]
    pub config: Option<String>,

    /// (folder) The registration rolls, one CSV file per county. Overrides the configuration.
    #[clap(long, value_parser, global = true)]
    pub registered_voters: Option<String>,

    /// (folder) The vote histories, one CSV file per county. Overrides the configuration.
    #[clap(long, value_parser, global = true)]
    pub voter_history: Option<String>,

    /// (file path, default ./key.json) The key, written by generate-key and read by predict.
    #[clap(short, long, value_parser, global = true)]
    pub key: Option<String>,

    /// (MM/DD/YYYY, default 11/03/2020) The election of reference.
    #[clap(long, value_parser, global = true)]
    pub election_date: Option<String>,

    /// (year) The presidential election of that year, from 2000 to 2020. Ignored if
    /// --election-date is given.
    #[clap(long, value_parser, global = true)]
    pub election_year: Option<u32>,

    /// (default 50) Ages with this many registered voters or fewer are hidden from the outputs.
    #[clap(long, value_parser, global = true)]
    pub min_registered: Option<u64>,

    /// If passed as an argument, the columns are read at fixed positions and the headers are ignored.
    #[clap(long, takes_value = false, global = true)]
    pub legacy_schema: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Builds the key from all the counties and writes it to the key file.
    GenerateKey {
        /// (file path) A reference key in JSON format. If provided, the command fails when the
        /// generated key differs from it.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Compares the actual votes of a county with the votes predicted by the key.
    Predict {
        /// The county id, as in CTY<county>_vr.csv
        #[clap(value_parser)]
        county: String,
        /// (file path or 'stdout', default stdout) Where to write the series in JSON format.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
    /// Turnout by age for every county, one series per county.
    Plot {
        /// If passed as an argument, the turnout is divided by the overall turnout of the county.
        #[clap(long, takes_value = false)]
        normalized: bool,
        /// (file path or 'stdout', default stdout) Where to write the series in JSON format.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
}

mod args;
mod turnout;

use clap::Parser;
use log::{info, LevelFilter};
use snafu::ErrorCompat;

use crate::args::{Args, Command};
use crate::turnout::{run_generate_key, run_plot, run_predict, Settings, TurnoutResult};

fn run(args: &Args) -> TurnoutResult<()> {
    let settings = Settings::from_args(args)?;
    match &args.command {
        Command::GenerateKey { reference } => {
            let key = run_generate_key(&settings, reference.clone())?;
            info!("key covers {} ages", key.len());
        }
        Command::Predict { county, out } => {
            run_predict(&settings, county, out.clone())?;
        }
        Command::Plot { normalized, out } => {
            run_plot(&settings, *normalized, out.clone())?;
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    if let Err(e) = run(&args) {
        eprintln!("An error occured: {}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

use anyhow::Context;
use clap::ArgMatches;
use recode_cli::{app, command, logging, Invocation, Settings};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = command().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(app::report(&err, &mut command(), &mut io::stderr())),
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let invocation = Invocation::from_matches(matches)?;
    let settings = match &invocation.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let settings = invocation.apply(settings);

    logging::init(&settings);
    tracing::debug!(?settings, "settings resolved");

    let mut input: Box<dyn Read> = match &invocation.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("cannot open input '{}'", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut output: Box<dyn Write> = match &invocation.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create output '{}'", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    app::execute(&invocation, &settings, &mut input, &mut output)
}

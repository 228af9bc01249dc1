//! Command line definition
//!
//! Filter arguments (`-F`) attach to the closest `-f` before them, so
//! `-f a -F 1 -f b -F 2` configures `a(1)` then `b(2)`.

use crate::settings::Settings;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use recode_core::{ArgumentError, FilterStep, RecodeConfig};
use std::path::PathBuf;

/// What the invocation asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print registered codecs and filters
    List,
    /// Decode, filter and encode
    Recode(RecodeConfig),
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Requested action
    pub action: Action,
    /// Input file, stdin if absent
    pub input: Option<PathBuf>,
    /// Output file, stdout if absent
    pub output: Option<PathBuf>,
    /// Settings file
    pub config: Option<PathBuf>,
    /// Overrides `base_dir`
    pub base_dir: Option<PathBuf>,
    /// Overrides `fetch.workers`
    pub workers: Option<usize>,
    /// Enables S3 access
    pub s3: bool,
}

/// Build the `recode` command
#[must_use]
pub fn command() -> Command {
    Command::new("recode")
        .version(recode_core::VERSION)
        .about("Convert structured data between formats")
        .arg(
            Arg::new("decoder")
                .short('i')
                .long("decoder")
                .value_name("NAME")
                .required_unless_present("list")
                .help("Decoder for the input data"),
        )
        .arg(
            Arg::new("decoder-arg")
                .short('I')
                .long("decoder-arg")
                .value_name("ARG")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Decoder argument, repeatable"),
        )
        .arg(
            Arg::new("encoder")
                .short('o')
                .long("encoder")
                .value_name("NAME")
                .required_unless_present("list")
                .help("Encoder for the output data"),
        )
        .arg(
            Arg::new("encoder-arg")
                .short('O')
                .long("encoder-arg")
                .value_name("ARG")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Encoder argument, repeatable"),
        )
        .arg(
            Arg::new("filter")
                .short('f')
                .long("filter")
                .value_name("NAME")
                .action(ArgAction::Append)
                .help("Filter applied between decoding and encoding, repeatable"),
        )
        .arg(
            Arg::new("filter-arg")
                .short('F')
                .long("filter-arg")
                .value_name("ARG")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Argument for the preceding filter"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Read input from FILE instead of stdin"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Write output to FILE instead of stdout"),
        )
        .arg(
            Arg::new("base-dir")
                .long("base-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Base directory for relative templates and varfiles patterns"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Parallel downloads for remote pattern imports"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Settings file (TOML)"),
        )
        .arg(
            Arg::new("s3")
                .long("s3")
                .action(ArgAction::SetTrue)
                .help("Enable s3:// references"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List codecs and filters"),
        )
}

impl Invocation {
    /// Build from parsed matches
    ///
    /// # Errors
    /// - `ArgumentError` for a filter argument given before any filter
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ArgumentError> {
        let action = if matches.get_flag("list") {
            Action::List
        } else {
            let config = RecodeConfig::new(string(matches, "decoder"), string(matches, "encoder"))
                .with_decoder_args(strings(matches, "decoder-arg"))
                .with_encoder_args(strings(matches, "encoder-arg"));
            let config = filter_steps(matches)?
                .into_iter()
                .fold(config, RecodeConfig::with_filter);
            Action::Recode(config)
        };

        Ok(Self {
            action,
            input: matches.get_one::<PathBuf>("input").cloned(),
            output: matches.get_one::<PathBuf>("output").cloned(),
            config: matches.get_one::<PathBuf>("config").cloned(),
            base_dir: matches.get_one::<PathBuf>("base-dir").cloned(),
            workers: matches.get_one::<usize>("workers").copied(),
            s3: matches.get_flag("s3"),
        })
    }

    /// Apply command line overrides on top of file settings
    #[must_use]
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(dir) = &self.base_dir {
            settings = settings.with_base_dir(dir);
        }
        if let Some(workers) = self.workers {
            settings = settings.with_workers(workers);
        }
        if self.s3 {
            settings = settings.with_s3_enabled(true);
        }
        settings
    }
}

fn string(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn indexed<'a>(matches: &'a ArgMatches, id: &str) -> Vec<(usize, &'a String)> {
    match (matches.indices_of(id), matches.get_many::<String>(id)) {
        (Some(indices), Some(values)) => indices.zip(values).collect(),
        _ => Vec::new(),
    }
}

fn filter_steps(matches: &ArgMatches) -> Result<Vec<FilterStep>, ArgumentError> {
    let filters = indexed(matches, "filter");
    let mut args = vec![Vec::new(); filters.len()];

    for (index, arg) in indexed(matches, "filter-arg") {
        let owner = filters
            .iter()
            .rposition(|(filter_index, _)| *filter_index < index)
            .ok_or_else(|| {
                ArgumentError::new(
                    "recode",
                    format!("filter argument '{arg}' given before any filter"),
                )
            })?;
        args[owner].push(arg.clone());
    }

    Ok(filters
        .into_iter()
        .zip(args)
        .map(|((_, name), args)| FilterStep::new(name.clone()).with_args(args))
        .collect())
}

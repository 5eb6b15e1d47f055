use chrono::prelude::*;
use std::error::Error;
use std::{
    io::Write,
    time::{Instant, SystemTime},
};

use distance::damerau_levenshtein;
use freqspell::speller::suggestion::Suggestion;
use freqspell::speller::{LookupOptions, SpellModel, Speller, SpellerConfig, SuggestionLevel};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use structopt::clap::{App, AppSettings, Arg};

fn load_words(
    path: &str,
    max_words: Option<usize>,
) -> Result<Vec<(String, String)>, Box<dyn Error>> {
    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    Ok(rdr
        .records()
        .filter_map(Result::ok)
        .filter_map(|r| {
            r.get(0)
                .and_then(|x| r.get(1).map(|y| (x.to_string(), y.to_string())))
        })
        .take(max_words.unwrap_or(std::usize::MAX))
        .collect())
}

#[derive(Debug, Default, Serialize, PartialOrd, Ord, PartialEq, Eq, Clone, Copy)]
struct Time {
    secs: u64,
    subsec_nanos: u32,
}

impl From<std::time::Duration> for Time {
    fn from(duration: std::time::Duration) -> Time {
        Time {
            secs: duration.as_secs(),
            subsec_nanos: duration.subsec_nanos(),
        }
    }
}

impl std::fmt::Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        let ms = self.secs * 1000 + (self.subsec_nanos as u64 / 1_000_000);
        write!(f, "{}ms", ms)
    }
}

#[derive(Debug, Serialize)]
struct AccuracyResult<'a> {
    input: &'a str,
    expected: &'a str,
    distance: usize,
    suggestions: Vec<Suggestion>,
    position: Option<usize>,
    time: Time,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    config: &'a SpellerConfig,
    options: &'a LookupOptions,
    summary: Summary,
    results: Vec<AccuracyResult<'a>>,
    start_timestamp: Time,
    total_time: Time,
}

#[derive(Serialize, Default, Debug, Clone)]
struct Summary {
    total_words: u32,
    first_position: u32,
    top_five: u32,
    any_position: u32,
    no_suggestions: u32,
    only_wrong: u32,
    slowest_lookup: Time,
    fastest_lookup: Time,
    average_time: Time,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        let percent = |v: u32| -> String {
            format!("{:.2}%", v as f32 / self.total_words.max(1) as f32 * 100f32)
        };

        write!(
            f,
            "[#1] {} [^5] {} [any] {} [none] {} [wrong] {} [fast] {} [slow] {} [avg] {}",
            percent(self.first_position),
            percent(self.top_five),
            percent(self.any_position),
            percent(self.no_suggestions),
            percent(self.only_wrong),
            self.fastest_lookup,
            self.slowest_lookup,
            self.average_time
        )
    }
}

impl Summary {
    fn new(results: &[AccuracyResult<'_>]) -> Summary {
        let mut summary = Summary::default();

        results.iter().for_each(|result| {
            summary.total_words += 1;

            if let Some(position) = result.position {
                summary.any_position += 1;

                if position == 0 {
                    summary.first_position += 1;
                }

                if position < 5 {
                    summary.top_five += 1;
                }
            } else if result.suggestions.is_empty() {
                summary.no_suggestions += 1;
            } else {
                summary.only_wrong += 1;
            }
        });

        if let Some(slowest) = results.iter().map(|r| r.time).max() {
            summary.slowest_lookup = slowest;
        }
        if let Some(fastest) = results.iter().map(|r| r.time).min() {
            summary.fastest_lookup = fastest;
        }

        if !results.is_empty() {
            let total_nanos = results
                .iter()
                .map(|r| r.time.secs as u128 * 1_000_000_000 + r.time.subsec_nanos as u128)
                .sum::<u128>();
            let average = total_nanos / results.len() as u128;
            summary.average_time = std::time::Duration::from_nanos(average as u64).into();
        }

        summary
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();

    let matches = App::new("freqspell-accuracy")
        .setting(AppSettings::ArgRequiredElseHelp)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Accuracy testing for freqspell models.")
        .arg(
            Arg::with_name("options")
                .short("c")
                .takes_value(true)
                .help("Provide JSON lookup options file to override test defaults"),
        )
        .arg(
            Arg::with_name("model")
                .value_name("MODEL")
                .help("Use the given saved model"),
        )
        .arg(
            Arg::with_name("words")
                .value_name("WORDS")
                .help("The 'input -> expected' list in tab-delimited value file (TSV)"),
        )
        .arg(
            Arg::with_name("json-output")
                .short("o")
                .takes_value(true)
                .value_name("JSON-OUTPUT")
                .help("The file path for the JSON report output"),
        )
        .arg(
            Arg::with_name("tsv-output")
                .short("t")
                .takes_value(true)
                .value_name("TSV-OUTPUT")
                .help("The file path for the TSV line append"),
        )
        .arg(
            Arg::with_name("max-words")
                .short("w")
                .takes_value(true)
                .help("Truncate typos list to max number of words specified"),
        )
        .get_matches();

    let options: LookupOptions = match matches.value_of("options") {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            serde_json::from_reader(file)?
        }
        None => LookupOptions::level(SuggestionLevel::All),
    };

    let model = match matches.value_of("model") {
        Some(path) => SpellModel::load(path)?,
        None => {
            eprintln!("No model found for given path; aborting.");
            std::process::exit(1);
        }
    };
    let config = model.config();

    let words = match matches.value_of("words") {
        Some(path) => load_words(
            path,
            matches
                .value_of("max-words")
                .and_then(|x| x.parse::<usize>().ok()),
        )?,
        None => {
            eprintln!("No word list for given path; aborting.");
            std::process::exit(1);
        }
    };

    let pb = ProgressBar::new(words.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{pos}/{len} [{percent}%] {wide_bar} {elapsed_precise}"),
    );

    let start_time = Instant::now();
    let results = words
        .par_iter()
        .progress_with(pb)
        .map(|(input, expected)| {
            let now = Instant::now();
            let suggestions = model.clone().lookup(input, options.clone());
            let time = Time::from(now.elapsed());

            let position = suggestions
                .iter()
                .position(|x| x.word() == expected.as_str());

            let distance = damerau_levenshtein(input, expected);
            AccuracyResult {
                input,
                expected,
                distance,
                time,
                suggestions,
                position,
            }
        })
        .collect::<Vec<_>>();

    let total_time = Time::from(start_time.elapsed());
    let start_timestamp = Time::from(SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?);

    let summary = Summary::new(&results);
    println!("{}", summary);

    if let Some(path) = matches.value_of("json-output") {
        let output = std::fs::File::create(path)?;
        let report = Report {
            config: &config,
            options: &options,
            summary,
            results,
            start_timestamp,
            total_time,
        };
        println!("Writing JSON report…");
        serde_json::to_writer_pretty(output, &report)?;
    } else if let Some(path) = matches.value_of("tsv-output") {
        let mut output = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        if output.metadata()?.len() == 0 {
            output.write_all(b"date\tmodel\ttop1\ttop5\tany\tno suggs\twrong suggs\tavg\n")?;
        }

        let row = [
            Local::now().to_rfc3339(),
            matches.value_of("model").unwrap_or_default().to_string(),
            summary.first_position.to_string(),
            summary.top_five.to_string(),
            summary.any_position.to_string(),
            summary.no_suggestions.to_string(),
            summary.only_wrong.to_string(),
            summary.average_time.to_string(),
        ];
        writeln!(output, "{}", row.join("\t"))?;
    };

    println!("Done!");
    Ok(())
}

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use gumdrop::Options;
use language_tags::LanguageTag;
use serde::Serialize;

use freqspell::service::{CorrectionRequest, Corrector};
use freqspell::speller::segment::Composition;
use freqspell::speller::suggestion::Suggestion;
use freqspell::speller::{
    AddOptions, ImportOptions, LookupOptions, SpellModel, Speller, SpellerConfig, SuggestionLevel,
};

trait OutputWriter {
    fn write_suggestions(&mut self, input: &str, suggestions: &[Suggestion]);
    fn write_composition(&mut self, input: &str, composition: &Composition);
    fn finish(&mut self);
}

struct StdoutWriter;

impl OutputWriter for StdoutWriter {
    fn write_suggestions(&mut self, input: &str, suggestions: &[Suggestion]) {
        println!("Input: {}", input);
        if suggestions.is_empty() {
            println!("\t(no suggestions)");
        }
        for sugg in suggestions {
            println!("\t{}\t\tdistance {}\tfrequency {}", sugg.word, sugg.distance, sugg.frequency);
        }
        println!();
    }

    fn write_composition(&mut self, input: &str, composition: &Composition) {
        println!("Input: {}", input);
        println!(
            "\t{}\t\tdistance {}\tlog prob {:.4}",
            composition.corrected, composition.distance_sum, composition.log_prob_sum
        );
        println!();
    }

    fn finish(&mut self) {}
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonRecord {
    Suggestions {
        input: String,
        suggestions: Vec<Suggestion>,
    },
    Composition {
        input: String,
        composition: Composition,
    },
}

#[derive(Serialize)]
struct JsonWriter {
    results: Vec<JsonRecord>,
}

impl JsonWriter {
    pub fn new() -> JsonWriter {
        JsonWriter { results: vec![] }
    }
}

impl OutputWriter for JsonWriter {
    fn write_suggestions(&mut self, input: &str, suggestions: &[Suggestion]) {
        self.results.push(JsonRecord::Suggestions {
            input: input.to_owned(),
            suggestions: suggestions.to_vec(),
        });
    }

    fn write_composition(&mut self, input: &str, composition: &Composition) {
        self.results.push(JsonRecord::Composition {
            input: input.to_owned(),
            composition: composition.clone(),
        });
    }

    fn finish(&mut self) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Could not serialize results: {}", e),
        }
    }
}

#[derive(Debug, Options)]
struct Args {
    #[options(help = "print help message")]
    help: bool,

    #[options(command)]
    command: Option<Command>,
}

#[derive(Debug, Options)]
enum Command {
    #[options(help = "build a model from word and bigram lists")]
    Build(BuildArgs),

    #[options(help = "get suggestions for single words")]
    Suggest(SuggestArgs),

    #[options(help = "correct multi-word queries")]
    Compound(QueryArgs),

    #[options(help = "split text without spaces into words")]
    Segment(QueryArgs),

    #[options(help = "interactive debugging loop")]
    Repl(ReplArgs),

    #[options(help = "serve corrections as newline-delimited JSON over TCP")]
    Serve(ServeArgs),
}

#[derive(Debug, Options)]
struct BuildArgs {
    #[options(help = "print help message")]
    help: bool,

    #[options(help = "newline-delimited word list", required)]
    words: PathBuf,

    #[options(help = "newline-delimited bigram list")]
    bigrams: Option<PathBuf>,

    #[options(help = "model file to write", required)]
    output: PathBuf,

    #[options(no_short, help = "skip records below this frequency", default = "50")]
    min_freq: u64,

    #[options(help = "dictionary to import into")]
    dictionary: Option<String>,

    #[options(no_short, help = "maximum edit distance the index supports")]
    max_edit_distance: Option<usize>,

    #[options(no_short, help = "only index this many leading characters of each word")]
    prefix_length: Option<usize>,

    #[options(no_short, help = "lower-case words and queries")]
    case_insensitive: bool,
}

#[derive(Debug, Options)]
struct SuggestArgs {
    #[options(help = "print help message")]
    help: bool,

    #[options(help = "model file to be used", required)]
    model: PathBuf,

    #[options(help = "best, closest or all")]
    level: SuggestionLevel,

    #[options(multi = "push", help = "dictionary to search, may be repeated in priority order")]
    dictionary: Vec<String>,

    #[options(no_short, help = "lower the maximum edit distance for this run")]
    max_edit_distance: Option<usize>,

    #[options(no_short, long = "json", help = "output in JSON format")]
    use_json: bool,

    #[options(free, help = "words to be processed")]
    inputs: Vec<String>,
}

#[derive(Debug, Options)]
struct QueryArgs {
    #[options(help = "print help message")]
    help: bool,

    #[options(help = "model file to be used", required)]
    model: PathBuf,

    #[options(multi = "push", help = "dictionary to search, may be repeated in priority order")]
    dictionary: Vec<String>,

    #[options(no_short, long = "json", help = "output in JSON format")]
    use_json: bool,

    #[options(free, help = "queries to be processed, one per argument")]
    inputs: Vec<String>,
}

#[derive(Debug, Options)]
struct ReplArgs {
    #[options(help = "print help message")]
    help: bool,

    #[options(help = "model file to be used", required)]
    model: PathBuf,
}

#[derive(Debug, Options)]
struct ServeArgs {
    #[options(help = "print help message")]
    help: bool,

    #[options(help = "model file to be used", required)]
    model: PathBuf,

    #[options(no_short, help = "address to bind", default = "127.0.0.1")]
    host: String,

    #[options(help = "port to listen on", default = "8090")]
    port: u16,

    #[options(no_short, help = "language tag reported in responses", default = "en")]
    language: String,
}

fn lookup_options(
    level: SuggestionLevel,
    dictionaries: Vec<String>,
    max_edit_distance: Option<usize>,
) -> LookupOptions {
    LookupOptions {
        level,
        dictionaries: dictionaries.into_iter().map(Into::into).collect(),
        max_edit_distance,
    }
}

fn read_inputs(inputs: Vec<String>) -> anyhow::Result<Vec<String>> {
    if !inputs.is_empty() {
        return Ok(inputs);
    }

    eprintln!("Reading from stdin...");
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("reading stdin")?;

    Ok(buffer
        .lines()
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect())
}

fn writer(use_json: bool) -> Box<dyn OutputWriter> {
    if use_json {
        Box::new(JsonWriter::new())
    } else {
        Box::new(StdoutWriter)
    }
}

fn load_model(path: &Path) -> anyhow::Result<Arc<SpellModel>> {
    SpellModel::load(path).with_context(|| format!("loading model {}", path.display()))
}

fn build(args: BuildArgs) -> anyhow::Result<()> {
    let mut config = SpellerConfig::default();
    if let Some(distance) = args.max_edit_distance {
        config.max_edit_distance = distance;
    }
    config.prefix_length = args.prefix_length;
    config.case_sensitive = !args.case_insensitive;

    let model = SpellModel::with_config(config);
    let options = ImportOptions {
        add: match args.dictionary {
            Some(name) => AddOptions::in_dictionary(name),
            None => AddOptions::default(),
        },
        min_frequency: args.min_freq,
    };

    let words = model.import_entries(&args.words, options.clone())?;
    eprintln!("Imported {} words", words);

    if let Some(bigrams) = args.bigrams.as_ref() {
        let bigrams = model.import_bigrams(bigrams, options)?;
        eprintln!("Imported {} bigrams", bigrams);
    }

    model.save(&args.output)?;
    eprintln!("Saved model to {}", args.output.display());

    Ok(())
}

fn suggest(args: SuggestArgs) -> anyhow::Result<()> {
    let model = load_model(&args.model)?;
    let options = lookup_options(args.level, args.dictionary, args.max_edit_distance);
    let mut writer = writer(args.use_json);

    for word in read_inputs(args.inputs)? {
        let suggestions = model.clone().lookup(&word, options.clone());
        writer.write_suggestions(&word, &suggestions);
    }

    writer.finish();
    Ok(())
}

fn compound(args: QueryArgs) -> anyhow::Result<()> {
    let model = load_model(&args.model)?;
    let options = lookup_options(SuggestionLevel::Best, args.dictionary, None);
    let mut writer = writer(args.use_json);

    for query in read_inputs(args.inputs)? {
        let suggestions = model.clone().lookup_compound(&query, options.clone());
        writer.write_suggestions(&query, &suggestions);
    }

    writer.finish();
    Ok(())
}

fn segment(args: QueryArgs) -> anyhow::Result<()> {
    let model = load_model(&args.model)?;
    let options = lookup_options(SuggestionLevel::Best, args.dictionary, None);
    let mut writer = writer(args.use_json);

    for text in read_inputs(args.inputs)? {
        let composition = model.clone().segment(&text, options.clone());
        writer.write_composition(&text, &composition);
    }

    writer.finish();
    Ok(())
}

fn words(suggestions: &[Suggestion]) -> String {
    let words = suggestions.iter().map(|s| s.word()).collect::<Vec<_>>();
    format!("[{}]", words.join(" "))
}

fn repl(args: ReplArgs) -> anyhow::Result<()> {
    let model = load_model(&args.model)?;
    println!("READY\n*************************");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!(":> ");
        io::stdout().flush()?;

        let text = match lines.next() {
            Some(line) => line?,
            None => break,
        };

        if text.is_empty() {
            break;
        }

        let best = model.clone().lookup(&text, LookupOptions::default());
        match best.first() {
            Some(first) => println!("BEST: {} [{}]", words(&best), first.distance),
            None => println!("BEST: []"),
        }

        let closest = model
            .clone()
            .lookup(&text, LookupOptions::level(SuggestionLevel::Closest));
        println!("CLOSEST: {}", words(&closest));

        let all = model
            .clone()
            .lookup(&text, LookupOptions::level(SuggestionLevel::All));
        if all.len() < 10 {
            println!("ALL: {}", words(&all));
        }

        let compound = model.clone().lookup_compound(&text, LookupOptions::default());
        println!("COMPOUND: {}", words(&compound));

        let segment = model.clone().segment(&text, LookupOptions::default());
        println!("SEGMENT: {}", segment);
    }

    println!("QUITTING");
    Ok(())
}

fn handle_connection(stream: TcpStream, corrector: Arc<Corrector>) -> io::Result<()> {
    let peer = stream.peer_addr()?;
    log::debug!("Connection from {}", peer);

    let mut output = stream.try_clone()?;
    for line in BufReader::new(stream).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<CorrectionRequest>(&line) {
            Ok(request) => serde_json::to_string(&corrector.correct(&request)),
            Err(e) => {
                log::warn!("{}: malformed request: {}", peer, e);
                serde_json::to_string(&serde_json::json!({ "error": e.to_string() }))
            }
        }?;

        writeln!(output, "{}", response)?;
    }

    log::debug!("Connection from {} closed", peer);
    Ok(())
}

fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let model = load_model(&args.model)?;
    let language = LanguageTag::parse(&args.language)
        .map_err(|e| anyhow::anyhow!("invalid language tag {:?}: {}", args.language, e))?;
    let corrector = Arc::new(Corrector::new(model, language));

    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .with_context(|| format!("binding {}:{}", args.host, args.port))?;
    eprintln!("Serving on {}", listener.local_addr()?);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("Accept failed: {}", e);
                continue;
            }
        };

        let corrector = Arc::clone(&corrector);
        std::thread::spawn(move || {
            if let Err(e) = handle_connection(stream, corrector) {
                log::warn!("Connection error: {}", e);
            }
        });
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args = Args::parse_args_default_or_exit();

    match args.command {
        None => Ok(()),
        Some(Command::Build(args)) => build(args),
        Some(Command::Suggest(args)) => suggest(args),
        Some(Command::Compound(args)) => compound(args),
        Some(Command::Segment(args)) => segment(args),
        Some(Command::Repl(args)) => repl(args),
        Some(Command::Serve(args)) => serve(args),
    }
}

mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::{Level, debug};

use moonshine::{Document, ParseError, ParserOptions};

const SUBCOMMANDS: &[&str] = &["json", "check", "tree", "test", "help"];

#[derive(Parser)]
#[command(name = "moon", version, about = "Moonshine source parser")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log parser progress to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse files and write their JSON interchange form next to them
    Json(JsonArgs),

    /// Parse files and report whether they are valid
    Check(CheckArgs),

    /// Print the parsed document tree
    Tree(TreeArgs),

    /// Run .test.moon fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct JsonArgs {
    /// Source files to convert
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Reject malformed keyword lines instead of reading them as calls
    #[arg(long)]
    strict: bool,

    /// Print JSON to stdout instead of writing `<file>.json`
    #[arg(long)]
    stdout: bool,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Source files to check
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Reject malformed keyword lines instead of reading them as calls
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args)]
struct TreeArgs {
    /// Source file to dump
    file: PathBuf,

    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.moon file or directory containing them
    path: PathBuf,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // Backwards compatibility: if the first positional arg is not a known
    // subcommand, inject "json" so `moon a.moon` works like `moon json a.moon`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args
        .iter()
        .skip(1)
        .position(|a| !a.starts_with('-'))
        .map(|p| p + 1)
    {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "json".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose, cli.no_color);

    let exit_code = match cli.command {
        Command::Json(json_args) => do_json(json_args, cli.no_color),
        Command::Check(check_args) => do_check(check_args, cli.no_color),
        Command::Tree(tree_args) => do_tree(tree_args, cli.no_color),
        Command::Test(test_args) => {
            if test_args.list_categories {
                test_runner::list_categories(&test_args.path);
                0
            } else {
                test_runner::run_tests(&test_args.path, cli.no_color, &test_args.category)
            }
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: u8, no_color: bool) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

/// Sources read so far, kept for rendering diagnostics against.
struct Sources {
    files: SimpleFiles<String, String>,
    color: ColorChoice,
}

impl Sources {
    fn new(no_color: bool) -> Self {
        Sources {
            files: SimpleFiles::new(),
            color: if no_color {
                ColorChoice::Never
            } else {
                ColorChoice::Auto
            },
        }
    }

    /// Read and parse one file. Any failure is reported on stderr.
    fn parse(&mut self, path: &Path, strict: bool) -> Option<Document> {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path.display(), e);
                return None;
            }
        };
        debug!(file = %path.display(), bytes = source.len(), "parsing");

        let file_id = self.files.add(path.display().to_string(), source.clone());
        let parser = moonshine::Parser::with_options(source, ParserOptions { strict });
        match parser.parse() {
            Ok(document) => Some(document),
            Err(error) => {
                self.emit(file_id, &error);
                None
            }
        }
    }

    fn emit(&self, file_id: usize, error: &ParseError) {
        let writer = StandardStream::stderr(self.color);
        let config = term::Config::default();
        let diagnostic = error.to_diagnostic(file_id);
        if term::emit_to_write_style(&mut writer.lock(), &config, &self.files, &diagnostic).is_err() {
            eprintln!("{}", error);
        }
    }
}

fn do_json(args: JsonArgs, no_color: bool) -> i32 {
    let mut sources = Sources::new(no_color);

    for file in &args.files {
        let Some(document) = sources.parse(file, args.strict) else {
            return 1;
        };
        let json = match serde_json::to_string_pretty(&document) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("error: cannot serialize '{}': {}", file.display(), e);
                return 1;
            }
        };

        if args.stdout {
            println!("{}", json);
            continue;
        }

        let out = file.with_extension("json");
        if let Err(e) = std::fs::write(&out, json + "\n") {
            eprintln!("error: cannot write '{}': {}", out.display(), e);
            return 1;
        }
        eprintln!("wrote {}", out.display());
    }
    0
}

fn do_check(args: CheckArgs, no_color: bool) -> i32 {
    let mut sources = Sources::new(no_color);
    let mut failed = false;

    for file in &args.files {
        match sources.parse(file, args.strict) {
            Some(document) => eprintln!(
                "ok: {} parsed successfully ({} unit(s))",
                file.display(),
                document.units.len()
            ),
            None => failed = true,
        }
    }

    if failed { 1 } else { 0 }
}

fn do_tree(args: TreeArgs, no_color: bool) -> i32 {
    let mut sources = Sources::new(no_color);
    match sources.parse(&args.file, args.strict) {
        Some(document) => {
            println!("{:#?}", document);
            0
        }
        None => 1,
    }
}

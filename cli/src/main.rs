mod logging;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use log::info;

use funcmark::render::reference::function_reference;
use funcmark::{Block, SchemaRegistry};

use crate::logging::{LoggingConfig, init_logging};

const SUBCOMMANDS: &[&str] = &["parse", "check", "render", "functions", "template", "test", "help"];

/// Global flags that take a value, so the value isn't mistaken for a file.
const VALUE_FLAGS: &[&str] = &["--schemas", "--log-level"];

#[derive(Parser)]
#[command(name = "funcmark", version, about = "Function-call markup parser")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// TOML file declaring extra functions, layered over the built-ins
    #[arg(long, global = true)]
    schemas: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `funcmark=trace` (default: RUST_LOG, then warn)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a document and print its blocks
    Parse(ParseArgs),

    /// Report errors only (exit 0 if the document is clean)
    Check(FileArgs),

    /// Render a document to HTML
    Render(FileArgs),

    /// List the available functions
    Functions(FunctionsArgs),

    /// Print a starter snippet for a function
    Template(TemplateArgs),

    /// Run .test.fm fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct FileArgs {
    /// Markup source file
    file: String,
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Markup source file
    file: String,

    /// Print blocks as JSON instead of debug output
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct FunctionsArgs {
    /// Print the Markdown reference document
    #[arg(long)]
    markdown: bool,
}

#[derive(clap::Args)]
struct TemplateArgs {
    /// Function name
    name: String,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.fm file or a directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

/// Index of the first argument that isn't a flag or a flag's value.
fn first_positional(args: &[String]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        if VALUE_FLAGS.contains(&arg.as_str()) {
            i += 2;
        } else if arg.starts_with('-') {
            i += 1;
        } else {
            return Some(i);
        }
    }
    None
}

fn main() {
    // `funcmark doc.fm` is shorthand for `funcmark parse doc.fm`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = first_positional(&args) {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "parse".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(LoggingConfig::new(cli.log_level.clone(), cli.no_color));

    let registry = load_registry(cli.schemas.as_deref());
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Parse(parse_args) => {
            let blocks = parse_and_report(&parse_args.file, &registry, color_choice);
            if parse_args.json {
                match serde_json::to_string_pretty(&blocks) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("error: cannot serialize blocks: {}", e);
                        process::exit(1);
                    }
                }
            } else {
                println!("{:#?}", blocks);
            }
            exit_on_errors(&blocks);
        }
        Command::Check(file_args) => {
            let blocks = parse_and_report(&file_args.file, &registry, color_choice);
            exit_on_errors(&blocks);
            eprintln!("ok: {} parsed successfully", file_args.file);
        }
        Command::Render(file_args) => {
            let blocks = parse_and_report(&file_args.file, &registry, color_choice);
            print!("{}", funcmark::render::to_html(&blocks));
        }
        Command::Functions(functions_args) => {
            if functions_args.markdown {
                print!("{}", function_reference(&registry));
            } else {
                print_functions(&registry);
            }
        }
        Command::Template(template_args) => {
            match funcmark::template::generate_template(&registry, &template_args.name) {
                Some(template) => println!("{}", template),
                None => {
                    eprintln!("error: unknown function '{}'", template_args.name);
                    process::exit(1);
                }
            }
        }
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, &registry, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn load_registry(schemas: Option<&Path>) -> SchemaRegistry {
    let registry = SchemaRegistry::builtin();
    let Some(path) = schemas else {
        return registry;
    };
    match registry.extend_from_file(path) {
        Ok(registry) => {
            info!("using schemas from {}", path.display());
            registry
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// Read and parse `file`, printing a diagnostic for every error block.
fn parse_and_report(file: &str, registry: &SchemaRegistry, color_choice: ColorChoice) -> Vec<Block> {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());

    let blocks = funcmark::Parser::new(registry).parse(&source);

    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for error in blocks.iter().filter_map(Block::as_error) {
        let diagnostic = error.to_diagnostic(file_id, &source);
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
    }
    blocks
}

fn exit_on_errors(blocks: &[Block]) {
    if blocks.iter().any(Block::is_error) {
        process::exit(1);
    }
}

fn print_functions(registry: &SchemaRegistry) {
    for schema in registry.schemas() {
        let params = schema
            .params
            .iter()
            .map(|param| match schema.default_for(param) {
                Some(default) => format!("{}={:?}", param, default.to_string()),
                None => param.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        println!("@{}({})", schema.name, params);
        if !schema.description.is_empty() {
            println!("    {}", schema.description);
        }
    }
}

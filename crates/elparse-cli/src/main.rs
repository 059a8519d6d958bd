use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use elparse::{
    first_sets::FirstSets,
    grammar::{Environment, GrammarError},
    lalr::Lookaheads,
    language::{Config, Language},
    lr0::LR0Automaton,
    table::LRTable,
};
use elparse_runtime::{Scanner, SyntaxError};
use std::{
    fs,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a grammar and save its parse table.
    Build {
        /// The path of grammar definition file.
        grammar: PathBuf,

        /// The output path. Defaults to the grammar path with the `.table` extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail if the action table has any conflict.
        #[arg(long)]
        deny_conflicts: bool,
    },

    /// Print the grammar, the LR(0) automaton, the look-aheads and the table.
    Dump {
        /// The path of grammar definition file.
        grammar: PathBuf,
    },

    /// Parse a source file and print its syntax tree.
    Parse {
        #[command(flatten)]
        source: LanguageSource,

        /// The path of the input file.
        input: PathBuf,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct LanguageSource {
    /// Build the language from a grammar definition file.
    #[arg(long)]
    grammar: Option<PathBuf>,

    /// Load a table saved by `build`.
    #[arg(long)]
    table: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    tracing::trace!("CLI args = {:?}", cli);

    match cli.command {
        Command::Build {
            grammar,
            output,
            deny_conflicts,
        } => build(&grammar, output, deny_conflicts),
        Command::Dump { grammar } => dump(&grammar),
        Command::Parse { source, input } => parse(source, &input),
    }
}

fn read_grammar(path: &Path) -> anyhow::Result<Environment> {
    Environment::from_file(path)
        .with_context(|| format!("failed to read the grammar from {}", path.display()))
}

fn build(grammar: &Path, output: Option<PathBuf>, deny_conflicts: bool) -> anyhow::Result<ExitCode> {
    let env = read_grammar(grammar)?;
    let language = match Config::new().deny_conflicts(deny_conflicts).build(env) {
        Ok(language) => language,
        Err(GrammarError::Conflicts { conflicts }) => {
            eprintln!(
                "[error] The action table has {} conflict(s). Run `dump` for details.",
                conflicts.len()
            );
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err).context("failed to build the parse table"),
    };

    let conflicts = language.conflicts();
    if !conflicts.is_empty() {
        println!(
            "[warning] {} conflict(s) were resolved in favor of the first action:",
            conflicts.len()
        );
        for conflict in conflicts {
            println!("  - {}", conflict.display(language.environment()));
        }
    }

    let output = output.unwrap_or_else(|| grammar.with_extension("table"));
    let file = fs::File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    language
        .save(BufWriter::new(file))
        .with_context(|| format!("failed to write the table to {}", output.display()))?;
    println!(
        "{} state(s) written to {}",
        language.table().len(),
        output.display()
    );

    Ok(ExitCode::SUCCESS)
}

fn dump(grammar: &Path) -> anyhow::Result<ExitCode> {
    let env = read_grammar(grammar)?;
    write_dump(&env, &mut io::stdout().lock())?;
    Ok(ExitCode::SUCCESS)
}

/// Run each construction stage once and print its result.
fn write_dump(env: &Environment, out: &mut impl Write) -> io::Result<()> {
    let first = FirstSets::new(env);
    let lr0 = LR0Automaton::new(env);
    let lookaheads = Lookaheads::new(env, &first, &lr0);
    let table = LRTable::generate(env, &lr0, &lookaheads);

    writeln!(out, "### Grammar\n")?;
    writeln!(out, "{}", env)?;
    writeln!(out, "### LR(0) automaton\n")?;
    writeln!(out, "{}", lr0.display(env))?;
    writeln!(out, "### Look-aheads\n")?;
    writeln!(out, "{}", lookaheads.display(env))?;
    writeln!(out, "### Parse table\n")?;
    writeln!(out, "{}", table.display(env))?;
    Ok(())
}

fn parse(source: LanguageSource, input: &Path) -> anyhow::Result<ExitCode> {
    let language = match (source.grammar, source.table) {
        (Some(grammar), _) => {
            Language::build(read_grammar(&grammar)?).context("failed to build the parse table")?
        }
        (None, Some(table)) => {
            let file = fs::File::open(&table)
                .with_context(|| format!("failed to open {}", table.display()))?;
            Language::load(BufReader::new(file))
                .with_context(|| format!("failed to load the table from {}", table.display()))?
        }
        (None, None) => anyhow::bail!("either --grammar or --table is required"),
    };

    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    match language.syntaxer().parse(Scanner::new(&text)) {
        Ok(tree) => {
            print!("{}", tree);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report(input, &err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report(input: &Path, err: &SyntaxError) {
    tracing::debug!("parse failed at {:?}", err.position());
    eprintln!("{}: {}", input.display(), err);
}

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use std::{fs::read_to_string, process::ExitCode};

const EXIT_DATA_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;
const EXIT_IO_ERROR: u8 = 74;

#[derive(Debug, Parser)]
#[clap(name = "rubble", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: RubbleCommand,
}

#[derive(Debug, Subcommand)]
pub enum RubbleCommand {
    Tokenize {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: TokenFormat,
    },
    Parse {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "sexpr")]
        format: ProgramFormat,
    },
    Run {
        path: PathBuf,
        /// Report failed assertions and keep evaluating instead of stopping.
        #[clap(long = "keep-going")]
        keep_going: bool,
    },
    Repl {
        #[clap(long = "history")]
        history: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TokenFormat {
    Debug,
    Basic,
    Pretty,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ProgramFormat {
    Debug,
    #[clap(name = "sexpr")]
    SExpr,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    rubble::init_tracing();
    let args = CLArgs::parse();
    match args.routine {
        RubbleCommand::Tokenize { path, format } => {
            let Some(src) = read_source(&path) else {
                return Ok(ExitCode::from(EXIT_IO_ERROR));
            };
            Ok(tokenize(&src, &path, &format))
        }
        RubbleCommand::Parse { path, format } => {
            let Some(src) = read_source(&path) else {
                return Ok(ExitCode::from(EXIT_IO_ERROR));
            };
            Ok(parse(&src, &path, &format))
        }
        RubbleCommand::Run { path, keep_going } => {
            let Some(src) = read_source(&path) else {
                return Ok(ExitCode::from(EXIT_IO_ERROR));
            };
            Ok(run(&src, &path, keep_going))
        }
        RubbleCommand::Repl { history } => repl(history.as_deref()),
    }
}

fn read_source(path: &Path) -> Option<String> {
    match read_to_string(path) {
        Ok(src) => Some(src),
        Err(error) => {
            eprintln!("Could not read {path:?}: {error}");
            None
        }
    }
}

fn tokenize(src: &str, path: &Path, format: &TokenFormat) -> ExitCode {
    use rubble::lexer::formatter::{
        BasicFormatter, DebugFormatter, PrettyFormatter, TokenFormatter,
    };
    use rubble::lexer::{Lexer, TokenKind};

    let mut lexer = Lexer::new(src);
    let formatter: Box<dyn TokenFormatter + '_> = match format {
        TokenFormat::Debug => Box::new(DebugFormatter),
        TokenFormat::Basic => Box::new(BasicFormatter::new(&lexer)),
        TokenFormat::Pretty => Box::new(PrettyFormatter::new(src, path)),
    };
    loop {
        match lexer.next_token() {
            Ok(token) => {
                println!("{}", formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    return ExitCode::SUCCESS;
                }
            }
            Err(error) => {
                eprintln!("{}", formatter.format_lexical_error(&error));
                return ExitCode::from(EXIT_DATA_ERROR);
            }
        }
    }
}

fn parse(src: &str, path: &Path, format: &ProgramFormat) -> ExitCode {
    use rubble::parser::formatter::{
        DebugFormatter, PrettyFormatter, ProgramFormatter, SExpressionFormatter,
    };
    use rubble::parser::Parser;

    let formatter: Box<dyn ProgramFormatter> = match format {
        ProgramFormat::Debug => Box::new(DebugFormatter),
        ProgramFormat::SExpr => Box::new(SExpressionFormatter::new(src)),
    };
    match Parser::new(src).parse() {
        Ok(program) => {
            println!("{}", formatter.format(&program));
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", PrettyFormatter::new(src, path).format_error(&error));
            ExitCode::from(EXIT_DATA_ERROR)
        }
    }
}

fn run(src: &str, path: &Path, keep_going: bool) -> ExitCode {
    use rubble::interpreter::context::StdioContext;
    use rubble::interpreter::{AssertionPolicy, TreeWalkInterpreter};
    use rubble::parser::formatter::{PrettyFormatter as ParserFormatter, ProgramFormatter};
    use rubble::parser::Parser;
    use rubble::value::formatter::{PrettyFormatter, ValueFormatter};

    let program = match Parser::new(src).parse() {
        Ok(program) => program,
        Err(error) => {
            eprintln!("{}", ParserFormatter::new(src, path).format_error(&error));
            return ExitCode::from(EXIT_DATA_ERROR);
        }
    };

    let policy = match keep_going {
        true => AssertionPolicy::Continue,
        false => AssertionPolicy::Halt,
    };
    let mut interpreter = TreeWalkInterpreter::new(StdioContext::new(policy));
    match interpreter.run(&program) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", PrettyFormatter::new(src, path).format_error(&error));
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

fn repl(history: Option<&Path>) -> Result<ExitCode> {
    use rubble::interpreter::context::StdioContext;
    use rubble::interpreter::TreeWalkInterpreter;
    use rubble::line_reader::{LineReadStatus, LineReader};
    use rubble::parser::formatter::{ProgramFormatter, SExpressionFormatter};
    use rubble::parser::Parser;
    use rubble::value::formatter::{BasicFormatter, ValueFormatter};

    let history = history.map(|path| path.to_string_lossy().into_owned());
    let mut reader = LineReader::new(history.as_deref())?;
    let mut interpreter = TreeWalkInterpreter::new(StdioContext::default());
    let mut pending = String::new();

    loop {
        let prompt = match pending.is_empty() {
            true => ">> ",
            false => ".. ",
        };
        let line = match reader.readline(prompt)? {
            LineReadStatus::Line(line) => line,
            LineReadStatus::Done => break,
        };
        pending.push_str(&line);
        pending.push('\n');

        let program = match Parser::new(&pending).parse() {
            Ok(program) => program,
            Err(error) if error.is_incomplete() => continue,
            Err(error) => {
                eprintln!("{}", SExpressionFormatter::new(&pending).format_error(&error));
                pending.clear();
                continue;
            }
        };

        let formatter = BasicFormatter::new(&pending);
        match interpreter.run(&program) {
            Ok(value) => println!("=> {}", formatter.format(&value)),
            Err(error) => eprintln!("{}", formatter.format_error(&error)),
        }
        pending.clear();
    }
    Ok(ExitCode::SUCCESS)
}

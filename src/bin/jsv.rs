//! JSON Schema CLI.
//!
//! Compiles schemas and validates instance documents against them.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use jsv::{Compiler, Draft, ValidationError};

#[derive(Parser)]
#[command(name = "jsv")]
#[command(about = "Compile JSON Schemas and validate instances against them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate instance documents against a schema
    Validate {
        /// Schema location: file path or URL
        #[arg(long, short)]
        schema: String,

        /// Instance files to validate
        #[arg(required = true)]
        instances: Vec<PathBuf>,

        /// Draft assumed for documents without $schema
        #[arg(long, value_enum)]
        draft: Option<DraftArg>,

        /// Output format for failures
        #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
        output: OutputFormat,

        /// Treat format as an assertion
        #[arg(long)]
        assert_format: bool,

        /// Treat contentEncoding/contentMediaType as assertions
        #[arg(long)]
        assert_content: bool,

        /// Stop each validation at its first error
        #[arg(long)]
        fail_fast: bool,
    },

    /// Compile a schema and report errors without validating anything
    Compile {
        /// Schema location: file path or URL
        schema: String,

        /// Draft assumed for documents without $schema
        #[arg(long, value_enum)]
        draft: Option<DraftArg>,

        /// Validate the schema against its meta-schema
        #[arg(long)]
        assert_vocabs: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DraftArg {
    #[value(name = "4")]
    V4,
    #[value(name = "6")]
    V6,
    #[value(name = "7")]
    V7,
    #[value(name = "2019")]
    V2019,
    #[value(name = "2020")]
    V2020,
}

impl From<DraftArg> for Draft {
    fn from(arg: DraftArg) -> Draft {
        match arg {
            DraftArg::V4 => Draft::V4,
            DraftArg::V6 => Draft::V6,
            DraftArg::V7 => Draft::V7,
            DraftArg::V2019 => Draft::V2019_09,
            DraftArg::V2020 => Draft::V2020_12,
        }
    }
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    /// Human-readable error tree
    Tree,
    /// {"valid": false}
    Flag,
    /// Flat list of errors
    Basic,
    /// Hierarchical errors
    Detailed,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Validate {
            schema,
            instances,
            draft,
            output,
            assert_format,
            assert_content,
            fail_fast,
        } => cmd_validate(
            &schema,
            &instances,
            draft,
            output,
            assert_format,
            assert_content,
            fail_fast,
        ),
        Commands::Compile {
            schema,
            draft,
            assert_vocabs,
        } => cmd_compile(&schema, draft, assert_vocabs),
    };
    ExitCode::from(code)
}

#[allow(clippy::too_many_arguments)]
fn cmd_validate(
    schema: &str,
    instances: &[PathBuf],
    draft: Option<DraftArg>,
    output: OutputFormat,
    assert_format: bool,
    assert_content: bool,
    fail_fast: bool,
) -> u8 {
    let mut compiler = Compiler::new();
    if let Some(draft) = draft {
        compiler.set_default_draft(draft.into());
    }
    if assert_format {
        compiler.enable_format_assertions();
    }
    if assert_content {
        compiler.enable_content_assertions();
    }

    let sch = match compiler.compile(schema) {
        Ok(sch) => sch,
        Err(err) => {
            eprintln!("error: {err}");
            return err.exit_code() as u8;
        }
    };
    let schemas = compiler.into_schemas();

    let mut worst = 0u8;
    for path in instances {
        let instance = match read_instance(path) {
            Ok(v) => v,
            Err((msg, code)) => {
                eprintln!("{}: {msg}", path.display());
                worst = worst.max(code);
                continue;
            }
        };
        if fail_fast && output == OutputFormat::Flag {
            if schemas.is_valid(&instance, sch) {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!(r#"{{"valid":false}}"#);
                worst = worst.max(1);
            }
            continue;
        }
        match schemas.validate(&instance, sch) {
            Ok(()) => report_valid(path, output),
            Err(err) => {
                report_invalid(path, output, &err);
                worst = worst.max(1);
            }
        }
    }
    worst
}

fn cmd_compile(schema: &str, draft: Option<DraftArg>, assert_vocabs: bool) -> u8 {
    let mut compiler = Compiler::new();
    if let Some(draft) = draft {
        compiler.set_default_draft(draft.into());
    }
    if assert_vocabs {
        compiler.assert_vocabs();
    }
    match compiler.compile(schema) {
        Ok(_) => {
            println!("schema {schema} compiled");
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code() as u8
        }
    }
}

fn read_instance(path: &Path) -> Result<Value, (String, u8)> {
    let file = File::open(path).map_err(|err| (format!("cannot open: {err}"), 3))?;
    serde_json::from_reader(file).map_err(|err| (format!("invalid json: {err}"), 2))
}

fn report_valid(path: &Path, output: OutputFormat) {
    match output {
        OutputFormat::Tree => println!("{}: valid", path.display()),
        OutputFormat::Flag => println!(r#"{{"valid":true}}"#),
        OutputFormat::Basic | OutputFormat::Detailed => println!(r#"{{"valid":true}}"#),
    }
}

fn report_invalid(path: &Path, output: OutputFormat, err: &ValidationError) {
    match output {
        OutputFormat::Tree => {
            println!("{}: invalid", path.display());
            println!("{err}");
        }
        OutputFormat::Flag => {
            let out = serde_json::to_string(&err.flag_output()).expect("serializable output");
            println!("{out}");
        }
        OutputFormat::Basic => {
            let out =
                serde_json::to_string_pretty(&err.basic_output()).expect("serializable output");
            println!("{out}");
        }
        OutputFormat::Detailed => {
            let out =
                serde_json::to_string_pretty(&err.detailed_output()).expect("serializable output");
            println!("{out}");
        }
    }
}

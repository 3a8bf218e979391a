//! cellexpr CLI - evaluate spreadsheet formulas from the command line

use anyhow::{bail, Context, Result};
use cellexpr::{
    EngineOptions, FunctionCatalog, FunctionOptions, NumericOptions, ParseError, ParserList,
};
use clap::{Parser, Subcommand};
use std::io::{self, Write};

#[derive(Parser)]
#[command(name = "cellexpr")]
#[command(author, version, about = "Spreadsheet formula evaluator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and evaluate one formula
    Eval {
        /// Formula text, e.g. "1+2*3"
        formula: String,

        /// Accept integer literals only
        #[arg(long, conflicts_with_all = ["decimal", "single"])]
        int_only: bool,

        /// Enable decimal literals
        #[arg(long)]
        decimal: bool,

        /// Enable single-precision literals
        #[arg(long)]
        single: bool,

        /// Argument separator (repeatable, default: comma)
        #[arg(short, long)]
        separator: Vec<String>,

        /// Match function names case-sensitively
        #[arg(long)]
        case_sensitive: bool,

        /// Print the parsed expression tree
        #[arg(long)]
        tree: bool,
    },

    /// List the built-in functions with their argument counts
    Functions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            formula,
            int_only,
            decimal,
            single,
            separator,
            case_sensitive,
            tree,
        } => {
            let numeric = if int_only {
                NumericOptions::int32_only()
            } else {
                NumericOptions::default()
                    .with_decimal(decimal)
                    .with_single(single)
            };
            let mut functions = FunctionOptions::default().with_case_sensitive(case_sensitive);
            if !separator.is_empty() {
                functions = functions.with_separators(separator);
            }
            let options = EngineOptions::default()
                .with_numeric(numeric)
                .with_functions(functions);
            eval(&formula, options, tree)
        }
        Commands::Functions => list_functions(),
    }
}

fn eval(formula: &str, options: EngineOptions, tree: bool) -> Result<()> {
    let parser = ParserList::with_options(options);

    let expr = match parser.parse_formula(formula) {
        Ok(expr) => expr,
        Err(err) => {
            eprintln!("{}", caret_report(formula, &err));
            bail!("Failed to parse formula");
        }
    };

    if tree {
        println!("Expression: {expr}");
        println!("{expr:#?}");
    }

    let value = expr.calc().context("Failed to evaluate formula")?;
    println!("{value} ({})", value.kind());
    Ok(())
}

/// The formula with a caret line under the span of the error
fn caret_report(formula: &str, err: &ParseError) -> String {
    let start = err.span.start.min(formula.len());
    let end = err.span.end.min(formula.len());
    let column = formula[..start].chars().count();
    let width = formula[start..end].chars().count().max(1);
    format!(
        "{formula}\n{}{}\n{err}",
        " ".repeat(column),
        "^".repeat(width)
    )
}

fn list_functions() -> Result<()> {
    let catalog = FunctionCatalog::default();
    let mut stdout = io::stdout().lock();
    for def in catalog.definitions() {
        writeln!(stdout, "{}\t{}", def.name, def.arity()).context("Failed to write to stdout")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_report() {
        let parser = ParserList::standard();
        let err = parser.parse_formula("1 + (2").unwrap_err();
        assert_eq!(
            caret_report("1 + (2", &err),
            "1 + (2\n    ^\nUnmatched '(' at position 5"
        );

        let err = parser.parse_formula("MIN(1,,2)").unwrap_err();
        let report = caret_report("MIN(1,,2)", &err);
        assert_eq!(report.lines().nth(1), Some("^^^^^^^^^"));
    }
}

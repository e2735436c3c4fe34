//! flowcalc - DataFlow formulas to SQL, and grid formula evaluation from the
//! command line.

mod cli;
mod config;
mod error;

use anyhow::{Context, Result};
use std::env;

use cli::{Mode, SqlArgs};
use config::{Config, load_config};
use flowcalc_core::{QueryOptions, Sheet, get_functions};
use flowcalc_engine::engine::{CellRef, evaluate_formula, extract_dependencies, format_value_with};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let cli = match cli::parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            cli::print_usage();
            std::process::exit(1);
        }
    };

    let config = if cli.no_config {
        Config::default()
    } else {
        let (config, warnings) = load_config(cli.config_file.as_deref());
        for warning in warnings {
            eprintln!("Warning: {}", warning);
        }
        config
    };

    match run(cli.mode, &config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Run one mode and return the exit code.
fn run(mode: Mode, config: &Config) -> Result<i32> {
    match mode {
        Mode::Help => {
            cli::print_usage();
            Ok(0)
        }
        Mode::Evaluate { formula, cells } => evaluate_command(&formula, &cells, config),
        Mode::Sql(args) => {
            println!("{}", build_sql(args, config)?);
            Ok(0)
        }
        Mode::Deps(formula) => {
            let mut deps = extract_dependencies(&formula);
            deps.sort_by_key(|name| CellRef::from_str(name).map(|c| (c.col, c.row)));
            for name in deps {
                println!("{}", name);
            }
            Ok(0)
        }
        Mode::Functions => {
            for def in get_functions() {
                println!("{:<14}{:<48}{}", def.name, def.syntax, def.description);
            }
            Ok(0)
        }
    }
}

/// Evaluate a formula against a sheet seeded from `--cell` assignments.
/// Exit code 1 when the result is an error marker.
fn evaluate_command(formula: &str, cells: &[(String, String)], config: &Config) -> Result<i32> {
    let mut sheet = Sheet::with_decimals(config.display.decimals);
    for (name, input) in cells {
        sheet
            .set_cell_by_name(name, input)
            .with_context(|| format!("cannot set {} to {:?}", name, input))?;
    }

    // Command mode accepts formulas with or without the leading '='.
    let formula = formula.trim();
    let formula = if formula.starts_with('=') {
        formula.to_string()
    } else {
        format!("={}", formula)
    };

    let value = evaluate_formula(&formula, &sheet, 0, 0);
    println!("{}", format_value_with(&value, sheet.decimals));
    Ok(if value.is_error() { 1 } else { 0 })
}

fn build_sql(args: SqlArgs, config: &Config) -> Result<String> {
    let options = QueryOptions {
        table: args.table.unwrap_or_default(),
        formula: args.formula,
        group_by: args.group_by,
        where_clause: args.where_clause,
        order_by: args.order_by,
        limit: args.limit,
    };
    let sql = config.query_builder().build_query(&options)?;
    Ok(sql)
}

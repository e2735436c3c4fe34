//! Hand-rolled argument parsing.

use std::path::PathBuf;

use crate::error::CliError;

pub fn print_usage() {
    eprintln!("Usage: flowcalc [OPTIONS]");
    eprintln!();
    eprintln!("Modes:");
    eprintln!("  -c, --command <FORMULA>   Evaluate a grid formula and print the result");
    eprintln!("      --cell <REF=INPUT>    Set a cell before evaluating (can be repeated)");
    eprintln!("  --sql <FORMULA>           Print the SELECT for a DataFlow formula");
    eprintln!("      --table <TABLE>       Table to select from (required)");
    eprintln!("      --group-by <C1,C2>    Grouping columns");
    eprintln!("      --where <CONDITION>   WHERE clause");
    eprintln!("      --order-by <ORDER>    ORDER BY clause");
    eprintln!("      --limit <N>           LIMIT clause");
    eprintln!("  --deps <FORMULA>          Print the cells a grid formula reads");
    eprintln!("  --functions               List DataFlow functions");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <PATH>           Read settings from PATH instead of the user config");
    eprintln!("  --no-config               Ignore config files and use defaults");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SqlArgs {
    pub formula: String,
    pub table: Option<String>,
    pub group_by: Option<Vec<String>>,
    pub where_clause: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Help,
    Evaluate {
        formula: String,
        cells: Vec<(String, String)>,
    },
    Sql(SqlArgs),
    Deps(String),
    Functions,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Cli {
    pub mode: Mode,
    pub config_file: Option<PathBuf>,
    pub no_config: bool,
}

/// Parse arguments (without the program name).
pub fn parse_args(args: &[String]) -> Result<Cli, CliError> {
    let mut command: Option<String> = None;
    let mut cells: Vec<(String, String)> = Vec::new();
    let mut sql: Option<SqlArgs> = None;
    let mut sql_opts = SqlArgs::default();
    let mut deps: Option<String> = None;
    let mut functions = false;
    let mut config_file: Option<PathBuf> = None;
    let mut no_config = false;

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = |flag: &'static str| -> Result<String, CliError> {
            i += 1;
            args.get(i).cloned().ok_or(CliError::MissingValue(flag))
        };
        match arg {
            "-h" | "--help" => {
                return Ok(Cli {
                    mode: Mode::Help,
                    config_file,
                    no_config,
                });
            }
            "-c" | "--command" => command = Some(value("--command")?),
            "--cell" => cells.push(parse_cell_assignment(&value("--cell")?)?),
            "--sql" => {
                sql = Some(SqlArgs {
                    formula: value("--sql")?,
                    ..Default::default()
                })
            }
            "--table" => sql_opts.table = Some(value("--table")?),
            "--group-by" => {
                let columns: Vec<String> = value("--group-by")?
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                sql_opts.group_by = Some(columns);
            }
            "--where" => sql_opts.where_clause = Some(value("--where")?),
            "--order-by" => sql_opts.order_by = Some(value("--order-by")?),
            "--limit" => {
                let raw = value("--limit")?;
                let limit = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| CliError::InvalidLimit(raw.clone()))?;
                sql_opts.limit = Some(limit);
            }
            "--deps" => deps = Some(value("--deps")?),
            "--functions" => functions = true,
            "--config" => config_file = Some(PathBuf::from(value("--config")?)),
            "--no-config" => no_config = true,
            other if other.starts_with('-') => {
                return Err(CliError::UnknownOption(other.to_string()));
            }
            other => return Err(CliError::UnexpectedArgument(other.to_string())),
        }
        i += 1;
    }

    let chosen = [command.is_some(), sql.is_some(), deps.is_some(), functions]
        .iter()
        .filter(|on| **on)
        .count();
    if chosen > 1 {
        return Err(CliError::ConflictingModes);
    }

    let mode = if let Some(formula) = command {
        Mode::Evaluate { formula, cells }
    } else if let Some(sql) = sql {
        if sql_opts.table.is_none() {
            return Err(CliError::MissingTable);
        }
        Mode::Sql(SqlArgs {
            formula: sql.formula,
            ..sql_opts
        })
    } else if let Some(formula) = deps {
        Mode::Deps(formula)
    } else if functions {
        Mode::Functions
    } else {
        Mode::Help
    };

    Ok(Cli {
        mode,
        config_file,
        no_config,
    })
}

/// `B1==A1*2` -> (`B1`, `=A1*2`). Splits on the first `=`.
fn parse_cell_assignment(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((name, input)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), input.to_string()))
        }
        _ => Err(CliError::InvalidCellAssignment(raw.to_string())),
    }
}

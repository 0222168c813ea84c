//! The minipg interactive shell.
//!
//! A Postgres-flavored prompt loop: `\`-prefixed meta-commands, statements
//! terminated by `;`, and statement continuation across lines. Input is
//! lowercased before parsing.

mod render;

use minipg_core::config::Config;
use minipg_core::sql::ast::Statement;
use minipg_core::sql::{ExecOutcome, SqlParser, execute};
use minipg_core::storage::Catalog;
use std::io::{BufRead, Write};
use std::path::Path;

const PROMPT: &str = "# ";

fn main() {
    minipg_core::logging::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "minipg.toml".to_string());
    let config = match Config::load(Path::new(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cannot load {config_path}: {e}");
            std::process::exit(1);
        }
    };
    let mut catalog = match Catalog::open(config) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("cannot open catalog: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "minipg shell, database '{}' ({} mode). Type \\h for help.",
        catalog.config().database,
        catalog.config().mode
    );

    let parser = SqlParser::new();
    let stdin = std::io::stdin();
    let mut pending = String::new();
    loop {
        print!("{PROMPT}");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("cannot read input: {e}");
                break;
            }
        }
        let mut text = line.trim().to_lowercase();
        if !pending.is_empty() {
            text = format!("{pending}{text}");
            pending.clear();
        }

        if let Some(command) = text.strip_prefix('\\') {
            if !run_meta_command(command.trim(), &catalog) {
                break;
            }
        } else if text.ends_with(';') {
            run_statement(&parser, &mut catalog, &text);
        } else if !text.is_empty() {
            // hold the partial statement for the next line
            pending = format!("{text} ");
        }
    }
}

/// Handle a `\` meta-command; returns false when the shell should exit.
fn run_meta_command(command: &str, catalog: &Catalog) -> bool {
    let mut words = command.split_whitespace();
    match words.next() {
        Some("q") | Some("quit") => {
            println!("quit");
            return false;
        }
        Some("h") | Some("help") => {
            println!("  \\d [table]   show tables, or one table's schema");
            println!("  \\h, \\help    show this help");
            println!("  \\q, \\quit    leave the shell");
            println!("  statements end with ';' (create table / insert / select / update)");
        }
        Some("d") => match words.next() {
            Some(name) => match catalog.get(name) {
                Ok(table) => print!("{}", render::render_schema(&table.schema)),
                Err(_) => println!("Don't find any relations named {name}"),
            },
            None => {
                println!("List of relations");
                for name in catalog.table_names() {
                    println!("{name}");
                }
            }
        },
        _ => println!("you input an invalid command: [{command}]"),
    }
    true
}

fn run_statement(parser: &SqlParser, catalog: &mut Catalog, text: &str) {
    tracing::debug!(statement = text, "executing");
    let stmt = match parser.parse(text) {
        Ok(stmt) => stmt,
        Err(e) => {
            println!("Error: {e}");
            return;
        }
    };

    // resolve the header before execution borrows the catalog mutably
    let header = select_header(&stmt, catalog);
    match execute(catalog, &stmt) {
        Ok(ExecOutcome::Created(name)) => println!("CREATE TABLE {name}"),
        Ok(ExecOutcome::Inserted(count)) => println!("INSERT 0 {count}"),
        Ok(ExecOutcome::Updated(count)) => println!("UPDATE {count}"),
        Ok(ExecOutcome::Rows(rows)) => {
            print!("{}", render::render_rows(&header, &rows));
        }
        Err(e) => println!("Error: {e}"),
    }
}

/// Column names a SELECT result renders under: the projected names, or the
/// table's full column list for `*`.
fn select_header(stmt: &Statement, catalog: &Catalog) -> Vec<String> {
    match stmt {
        Statement::Select(select) => {
            if select.contains_all_columns {
                catalog
                    .get(&select.table_name)
                    .map(|t| t.schema.column_names.clone())
                    .unwrap_or_default()
            } else {
                select.column_names.clone()
            }
        }
        _ => Vec::new(),
    }
}

//! group-settlement CLI
//!
//! Settle shared group expenses and summarize personal finances from the
//! command line.
//!
//! # Usage
//!
//! ```bash
//! # Settle every group in a file
//! group-settlement settle --input groups.json
//!
//! # Settle one group, output as JSON
//! group-settlement settle --input groups.json --group 2 --format json
//!
//! # Monthly income/expense summary with budget usage
//! group-settlement summary --input finances.json --month 2024-03
//!
//! # Generate a random group for testing
//! group-settlement generate --members 8 --expenses 40
//! ```
//!
//! Set `RUST_LOG=debug` to see skipped expenses and split fallbacks.

use group_settlement::core::member::GroupId;
use group_settlement::finance::book::FinanceBook;
use group_settlement::finance::month::Month;
use group_settlement::finance::transaction::{Budget, Transaction};
use group_settlement::settlement::service::{SettlementReport, SettlementService};
use group_settlement::simulation::stress_test::{generate_random_group, GroupConfig};
use group_settlement::store::memory::{GroupSnapshot, InMemoryStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"group-settlement: shared expense settlement and budget tracking

USAGE:
    group-settlement <COMMAND> [OPTIONS]

COMMANDS:
    settle      Compute balances and transfers for groups in a file
    summary     Summarize transactions and budgets per month
    generate    Generate a random group (for testing)
    help        Show this message

OPTIONS (settle):
    --input <FILE>      Path to JSON groups file
    --group <ID>        Only settle this group (ids follow file order, from 1)
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (summary):
    --input <FILE>      Path to JSON transactions/budgets file
    --month <YYYY-MM>   Restrict to one month and report budget usage
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --members <N>       Number of members (default: 6)
    --expenses <N>      Number of expenses (default: 30)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    group-settlement settle --input groups.json
    group-settlement settle --input groups.json --group 1 --format json
    group-settlement summary --input finances.json --month 2024-03
    group-settlement generate --members 10 --expenses 50 --output trip.json"#
    );
}

/// JSON schema for group input files.
#[derive(Serialize, Deserialize)]
struct GroupsFile {
    groups: Vec<GroupSnapshot>,
}

/// JSON schema for personal finance input files.
#[derive(Deserialize)]
struct FinanceFile {
    #[serde(default)]
    transactions: Vec<Transaction>,
    #[serde(default)]
    budgets: Vec<Budget>,
}

#[derive(Serialize)]
struct GroupSettlementOutput {
    id: GroupId,
    name: String,
    #[serde(flatten)]
    settlement: SettlementReport,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str, expected: &str) -> T {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));
    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!("{}", expected);
        process::exit(1);
    })
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(format!("serializing output: {}", e)))
}

/// Parse `--flag value` pairs, rejecting anything not in `allowed`.
fn parse_options(args: &[String], allowed: &[&str]) -> Vec<(String, String)> {
    let mut options = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            fail(format!("unknown option: {}", flag));
        }
        i += 1;
        let value = args
            .get(i)
            .cloned()
            .unwrap_or_else(|| fail(format!("{} requires a value", flag)));
        options.push((flag.to_string(), value));
        i += 1;
    }
    options
}

fn option<'a>(options: &'a [(String, String)], flag: &str) -> Option<&'a str> {
    options
        .iter()
        .rev()
        .find(|(f, _)| f == flag)
        .map(|(_, v)| v.as_str())
}

fn output_format(options: &[(String, String)]) -> &str {
    match option(options, "--format").unwrap_or("text") {
        f @ ("text" | "json") => f,
        other => fail(format!("--format must be 'text' or 'json', got '{}'", other)),
    }
}

fn cmd_settle(args: &[String]) {
    let options = parse_options(args, &["--input", "--group", "--format"]);
    let path = option(&options, "--input").unwrap_or_else(|| fail("--input <FILE> is required"));
    let format = output_format(&options);

    let file: GroupsFile = read_json(
        path,
        r#"{
  "groups": [{
    "name": "Trip",
    "members": [{ "id": 1, "name": "A" }, { "id": 2, "name": "B" }],
    "expenses": [{ "id": 1, "description": "Fuel", "amount": 50, "payer": 1,
                   "date": "2024-03-01", "split_policy": "ratio", "split_spec": "{\"1\": 1, \"2\": 3}" }]
  }]
}"#,
    );

    let mut store = InMemoryStore::new();
    for snapshot in file.groups {
        store.import_group(snapshot);
    }

    let selected = match option(&options, "--group") {
        Some(raw) => {
            let id = GroupId::parse(raw).unwrap_or_else(|e| fail(e));
            match store.group(id) {
                Some(group) => vec![group],
                None => fail(format!("group {} not found", id)),
            }
        }
        None => store.groups(),
    };

    let service = SettlementService::new(&store);
    let mut outputs = Vec::new();
    for group in selected {
        let settlement = service.compute_settlement(group.id).unwrap_or_else(|e| fail(e));
        outputs.push(GroupSettlementOutput {
            id: group.id,
            name: group.name,
            settlement,
        });
    }

    if format == "json" {
        println!("{}", to_json(&outputs));
    } else {
        for output in &outputs {
            println!("Group {}: {}", output.id, output.name);
            println!("{}", output.settlement);
        }
    }
}

fn cmd_summary(args: &[String]) {
    let options = parse_options(args, &["--input", "--month", "--format"]);
    let path = option(&options, "--input").unwrap_or_else(|| fail("--input <FILE> is required"));
    let format = output_format(&options);
    let month = option(&options, "--month").map(|raw| raw.parse::<Month>().unwrap_or_else(|e| fail(e)));

    let file: FinanceFile = read_json(
        path,
        r#"{
  "transactions": [{ "id": 1, "amount": 12.5, "type": "expense", "category": "Food", "date": "2024-03-02" }],
  "budgets": [{ "id": 1, "category": "Food", "limit": 200, "month": "2024-03" }]
}"#,
    );

    let book = FinanceBook::from_records(file.transactions, file.budgets);
    let summary = book.summary(month);

    if format == "json" {
        println!("{}", to_json(&summary));
    } else {
        println!("{}", summary);
    }
}

fn cmd_generate(args: &[String]) {
    let options = parse_options(args, &["--members", "--expenses", "--output"]);
    let count = |flag: &str, default: usize| -> usize {
        option(&options, flag)
            .map(|raw| {
                raw.parse()
                    .unwrap_or_else(|_| fail(format!("{} requires a number", flag)))
            })
            .unwrap_or(default)
    };

    let defaults = GroupConfig::default();
    let config = GroupConfig {
        member_count: count("--members", defaults.member_count),
        expense_count: count("--expenses", defaults.expense_count),
        ..defaults
    };

    let group = generate_random_group(&config);
    let expense_count = group.expenses.len();
    let json = to_json(&GroupsFile {
        groups: vec![group],
    });

    if let Some(path) = option(&options, "--output") {
        fs::write(path, &json).unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
        eprintln!(
            "Generated {} expenses across {} members → {}",
            expense_count, config.member_count, path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "settle" => cmd_settle(rest),
        "summary" => cmd_summary(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}

//! Stylewright - CSS specificity and rule inspector
//!
//! Usage: stylewright <command> [--json] <argument>

use std::env;
use std::fs;
use std::process::ExitCode;

use log::debug;
use serde::Serialize;

use stylewright_css::{compare_specificity, get_specificity, SelectorSpecificity, Specificity};
use stylewright_style::Document;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "stylewright".to_string());

    let json = args.iter().any(|a| a == "--json");
    args.retain(|a| a != "--json");

    if args.len() < 2 {
        print_usage(&program);
        return ExitCode::FAILURE;
    }

    let result = match args[1].as_str() {
        "--help" | "-h" => {
            print_usage(&program);
            return ExitCode::SUCCESS;
        }
        "--version" | "-V" => {
            println!("Stylewright {}", VERSION);
            return ExitCode::SUCCESS;
        }
        "specificity" => match args.get(2) {
            Some(selector) => show_specificity(selector, json),
            None => {
                eprintln!("Usage: {} specificity <SELECTOR>", program);
                return ExitCode::FAILURE;
            }
        },
        "rules" => match args.get(2) {
            Some(path) => show_rules(path, json),
            None => {
                eprintln!("Usage: {} rules <FILE.css>", program);
                return ExitCode::FAILURE;
            }
        },
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&program);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_usage(program: &str) {
    println!(
        r##"Stylewright {} - CSS specificity and rule inspector

USAGE:
    {} [OPTIONS] <COMMAND>

COMMANDS:
    specificity <SELECTOR>    Specificity of each selector in a list
    rules <FILE.css>          Rules of a stylesheet, most specific first

OPTIONS:
    -h, --help        Print this help message
    -V, --version     Print version information
    --json            Print results as JSON

EXAMPLES:
    {} specificity "#UserContent div#Div1, .box"
    {} rules test-pages/style.css --json
"##,
        VERSION, program, program, program
    );
}

/// Print each selector of a (possibly grouped) selector, most specific first
fn show_specificity(selector: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let list: Vec<SelectorSpecificity> = get_specificity(selector).into_iter().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    for entry in &list {
        println!("{}  {}", entry.specificity, entry.selector);
    }
    Ok(())
}

/// A stylesheet rule as listed by `rules`
#[derive(Debug, Serialize)]
struct RuleSummary {
    position: usize,
    selector: String,
    /// The rule's most specific selector
    specificity: Specificity,
    declarations: String,
}

/// Parse a stylesheet and list its rules in dominance order
fn show_rules(path: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let css = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;

    let mut doc = Document::default();
    let sheet = doc.add_stylesheet_from_text(Some(path), &css)?;
    let sheet = doc.sheet(sheet).ok_or("stylesheet vanished after parsing")?;
    debug!("Parsed {} rules from {}", sheet.len(), path);

    let mut rules: Vec<RuleSummary> = sheet
        .rules()
        .iter()
        .enumerate()
        .map(|(position, rule)| RuleSummary {
            position,
            selector: rule.selector_text().to_string(),
            specificity: rule.specificity().first().map(|s| s.specificity).unwrap_or_default(),
            declarations: rule.style.css_text(),
        })
        .collect();

    // Later rules win ties
    rules.sort_by(|a, b| compare_specificity(&a.specificity, &b.specificity).then(b.position.cmp(&a.position)));

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    println!("=== {} ({} rules) ===\n", path, rules.len());
    for rule in &rules {
        println!("{}  #{}  {} {{ {} }}", rule.specificity, rule.position, rule.selector, rule.declarations);
    }
    Ok(())
}

mod commands;

use anyhow::Result;
use console::style;

use crate::core::config::Config;
use crate::core::terminal::print_error;
use crate::core::timeline::TimelineView;

fn print_help() {
    println!("\n{}", style("fieldwork").bold().green());
    println!("{}\n", style("Farm incident reports in, tracked work orders out.").dim());

    println!("{}", style("Commands").bold());
    println!("  {:<28} {}", "submit <text> [--source X]", "Submit one incident report");
    println!("  {:<28} {}", "timeline [--activity]", "Print the severity-over-time series");
    println!("  {:<28} {}", "recent [--limit N]", "Show the latest work orders");
    println!("  {:<28} {}", "help", "Show this help");
    println!(
        "\n {} {} [command]   (no command starts the interactive loop)\n",
        style("Usage:").bold(),
        style("fieldwork").green()
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubmitArgs {
    pub text: String,
    pub source: Option<String>,
}

pub(crate) fn parse_submit_args(args: &[String], start: usize) -> SubmitArgs {
    let mut words: Vec<&str> = Vec::new();
    let mut source = None;
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--source" | "-s" => {
                if i + 1 < args.len() {
                    source = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            other => {
                words.push(other);
                i += 1;
            }
        }
    }
    SubmitArgs {
        text: words.join(" "),
        source,
    }
}

pub(crate) fn parse_limit(args: &[String], start: usize, default: u32) -> u32 {
    let mut i = start;
    while i < args.len() {
        if args[i] == "--limit" && i + 1 < args.len() {
            return args[i + 1].parse().unwrap_or(default);
        }
        i += 1;
    }
    default
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::load()?;

    if args.len() > 1 {
        match args[1].as_str() {
            "submit" => {
                let parsed = parse_submit_args(&args, 2);
                if parsed.text.trim().is_empty() {
                    print_error("Error: incident text is required for submit.");
                    print_help();
                    return Ok(());
                }
                commands::run_submit(&config, &parsed.text, parsed.source.as_deref()).await
            }
            "timeline" => {
                let view = if args.iter().any(|a| a == "--activity") {
                    TimelineView::Activity
                } else {
                    TimelineView::FirstOccurrence
                };
                commands::run_timeline(&config, view).await
            }
            "recent" => {
                let limit = parse_limit(&args, 2, 10);
                commands::run_recent(&config, limit).await
            }
            "help" | "--help" | "-h" => {
                print_help();
                Ok(())
            }
            other => {
                print_error(&format!("Unknown command: {}", other));
                print_help();
                Ok(())
            }
        }
    } else {
        commands::run_interactive(&config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn submit_args_join_positionals_and_take_source() {
        let args = argv(&["fieldwork", "submit", "Pump", "3", "overheating", "--source", "sensor-3"]);
        let parsed = parse_submit_args(&args, 2);
        assert_eq!(parsed.text, "Pump 3 overheating");
        assert_eq!(parsed.source.as_deref(), Some("sensor-3"));
    }

    #[test]
    fn submit_args_without_source() {
        let args = argv(&["fieldwork", "submit", "pump noise"]);
        let parsed = parse_submit_args(&args, 2);
        assert_eq!(parsed.text, "pump noise");
        assert_eq!(parsed.source, None);
    }

    #[test]
    fn limit_defaults_when_absent_or_unparseable() {
        assert_eq!(parse_limit(&argv(&["fieldwork", "recent"]), 2, 10), 10);
        assert_eq!(
            parse_limit(&argv(&["fieldwork", "recent", "--limit", "3"]), 2, 10),
            3
        );
        assert_eq!(
            parse_limit(&argv(&["fieldwork", "recent", "--limit", "lots"]), 2, 10),
            10
        );
    }
}

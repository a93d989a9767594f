//! Output formatting module for CLI display
//!
//! Report data arrives as rendered tables; this module only adds the
//! terminal decoration around them.

use colored::Colorize;
use std::collections::BTreeSet;

use ledger_holdings::export::{Classification, PortfolioExport};
use ledger_holdings::reports::{create_table, field_spec, render_table, OutputFormat};

/// Format empty report message
pub fn format_empty_report(title: &str) -> String {
    format!("\n{} No {} to show.\n", "ℹ".blue().bold(), title)
}

fn section(title: &str, count: usize) -> String {
    format!(
        "\n{} {} ({})\n",
        "━━".bright_black(),
        title.bold(),
        count.to_string().cyan()
    )
}

/// Format the export classification as three holdings tables followed by
/// the commodities without a declared ticker.
pub fn format_classification(classification: &Classification) -> anyhow::Result<String> {
    let mut output = String::new();
    let groups = [
        ("Exportable", &classification.exportable),
        ("Cash-like", &classification.cashlike),
        ("Ignored", &classification.ignored),
    ];

    for (title, holdings) in groups {
        output.push_str(&section(title, holdings.len()));
        if holdings.is_empty() {
            output.push_str(&format!("{}\n", "(none)".bright_black()));
            continue;
        }
        let mut rendered = Vec::new();
        render_table(
            &create_table(holdings, &field_spec()),
            OutputFormat::Text,
            &mut rendered,
        )?;
        output.push_str(&String::from_utf8_lossy(&rendered));
    }

    if !classification.ignored_commodities.is_empty() {
        output.push('\n');
        output.push_str(&format_ignored_commodities(&classification.ignored_commodities));
    }
    Ok(output)
}

/// One warning line per commodity left out of the export.
pub fn format_ignored_commodities(commodities: &BTreeSet<String>) -> String {
    commodities
        .iter()
        .map(|currency| {
            format!(
                "{} Ignored commodity {}: no ticker declared\n",
                "⚠".yellow().bold(),
                currency.yellow()
            )
        })
        .collect()
}

/// Warning for holdings whose value is lost because the export has no
/// cash currency to fold them into.
pub fn format_dropped_value(
    export: &PortfolioExport,
    cash_currency: Option<&str>,
) -> Option<String> {
    if cash_currency.is_some() || export.folded.is_empty() {
        return None;
    }
    Some(format!(
        "{} No operating currency: value of {} holding(s) not exported individually \
         is dropped\n",
        "⚠".yellow().bold(),
        export.folded.len()
    ))
}

use anyhow::{anyhow, Result};
use itertools::Itertools;
use serde_json::{Map, Value};
use std::io::Write;
use std::str::FromStr;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Style},
};

/// One column of a report: how to name it and how to render a row's cell.
pub struct Column<R> {
    pub name: &'static str,
    pub header: &'static str,
    pub format: fn(&R) -> String,
    pub numeric: bool,
}

impl<R> Column<R> {
    pub fn text(name: &'static str, header: &'static str, format: fn(&R) -> String) -> Self {
        Self {
            name,
            header,
            format,
            numeric: false,
        }
    }

    pub fn number(name: &'static str, header: &'static str, format: fn(&R) -> String) -> Self {
        Self {
            name,
            header,
            format,
            numeric: true,
        }
    }
}

/// Rendered cells, ready for output in any format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub names: Vec<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    numeric: Vec<bool>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn create_table<R>(rows: &[R], spec: &[Column<R>]) -> Table {
    Table {
        names: spec.iter().map(|c| c.name.to_string()).collect(),
        headers: spec.iter().map(|c| c.header.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| spec.iter().map(|c| (c.format)(row)).collect())
            .collect(),
        numeric: spec.iter().map(|c| c.numeric).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Html,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unsupported output format: {}", s)),
        }
    }
}

pub fn render_table<W: Write + ?Sized>(
    table: &Table,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", render_text(table))?,
        OutputFormat::Csv => render_csv(table, out)?,
        OutputFormat::Html => write!(out, "{}", render_html(table))?,
        OutputFormat::Json => writeln!(out, "{}", render_json(table)?)?,
    }
    Ok(())
}

pub fn render_text(table: &Table) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.headers.clone());
    for row in &table.rows {
        builder.push_record(row.clone());
    }

    let mut rendered = builder.build();
    rendered.with(Style::modern());
    for (idx, _) in table.numeric.iter().enumerate().filter(|(_, numeric)| **numeric) {
        rendered.modify(Columns::new(idx..idx + 1), Alignment::right());
    }
    rendered.to_string()
}

fn render_csv<W: Write + ?Sized>(table: &Table, out: &mut W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_html(table: &Table) -> String {
    let cells = |tag: &str, row: &[String]| {
        row.iter()
            .map(|cell| format!("<{tag}>{}</{tag}>", escape_html(cell)))
            .join("")
    };

    let mut html = String::from("<table>\n<thead>\n");
    html.push_str(&format!("<tr>{}</tr>\n", cells("th", &table.headers)));
    html.push_str("</thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str(&format!("<tr>{}</tr>\n", cells("td", row)));
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn render_json(table: &Table) -> Result<String> {
    let rows: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = table
                .names
                .iter()
                .zip(row)
                .map(|(name, cell)| (name.clone(), Value::String(cell.clone())))
                .collect();
            Value::Object(object)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

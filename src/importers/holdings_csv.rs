use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::HoldingsError;
use crate::holdings::Holding;

/// Columns understood by the loader, keyed by their header text.
const COLUMN_SPEC: &[(&str, HoldingColumn)] = &[
    ("Account", HoldingColumn::Account),
    ("Units", HoldingColumn::Number),
    ("Currency", HoldingColumn::Currency),
    ("Cost Currency", HoldingColumn::CostCurrency),
    ("Average Cost", HoldingColumn::CostNumber),
    ("Price", HoldingColumn::PriceNumber),
    ("Book Value", HoldingColumn::BookValue),
    ("Market Value", HoldingColumn::MarketValue),
    ("Price Date", HoldingColumn::PriceDate),
];

/// Columns a file must carry to describe a position at all.
const REQUIRED_COLUMNS: &[HoldingColumn] = &[
    HoldingColumn::Account,
    HoldingColumn::Number,
    HoldingColumn::Currency,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldingColumn {
    Account,
    Number,
    Currency,
    CostCurrency,
    CostNumber,
    PriceNumber,
    BookValue,
    MarketValue,
    PriceDate,
}

impl HoldingColumn {
    fn from_header(header: &str) -> Option<Self> {
        COLUMN_SPEC
            .iter()
            .find(|(name, _)| *name == header.trim())
            .map(|(_, column)| *column)
    }

    fn header(&self) -> &'static str {
        COLUMN_SPEC
            .iter()
            .find(|(_, column)| column == self)
            .map(|(name, _)| *name)
            .unwrap_or("?")
    }
}

/// Parse a holdings CSV file.
pub fn parse_holdings_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<Holding>> {
    let path = file_path.as_ref();
    info!("Parsing holdings CSV file: {:?}", path);

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open holdings file {}", path.display()))?;
    load_from_csv(file)
}

/// Load holdings from any CSV source whose first row is a header.
pub fn load_from_csv<R: Read>(source: R) -> Result<Vec<Holding>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);

    let headers = reader
        .headers()
        .map_err(HoldingsError::from)
        .context("Failed to read CSV headers")?
        .clone();
    debug!("CSV headers: {:?}", headers);

    let mapping = map_columns(&headers)?;

    let mut holdings = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result
            .map_err(HoldingsError::from)
            .context("Failed to read CSV record")?;
        // Header is row 1
        holdings.push(parse_row(&record, &mapping, idx + 2)?);
    }

    info!("Loaded {} holdings from CSV", holdings.len());
    Ok(holdings)
}

fn map_columns(headers: &csv::StringRecord) -> Result<Vec<Option<HoldingColumn>>, HoldingsError> {
    let mapping: Vec<Option<HoldingColumn>> = headers
        .iter()
        .map(|header| {
            let column = HoldingColumn::from_header(header);
            if column.is_none() {
                debug!("Ignoring unrecognized column '{}'", header);
            }
            column
        })
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !mapping.contains(&Some(**required)))
        .map(|column| column.header())
        .collect();
    if !missing.is_empty() {
        return Err(HoldingsError::Format(format!(
            "invalid holdings header, missing column(s): {}",
            missing.join(", ")
        )));
    }

    Ok(mapping)
}

fn parse_row(
    record: &csv::StringRecord,
    mapping: &[Option<HoldingColumn>],
    row_num: usize,
) -> Result<Holding, HoldingsError> {
    let mut holding = Holding::default();

    for (column, value) in mapping.iter().zip(record.iter()) {
        let Some(column) = column else { continue };
        let value = value.trim();
        let text = (!value.is_empty()).then(|| value.to_string());
        let number = || parse_decimal(value, row_num, column.header());

        match column {
            HoldingColumn::Account => holding.account = value.to_string(),
            HoldingColumn::Number => holding.number = number()?,
            HoldingColumn::Currency => holding.currency = text,
            HoldingColumn::CostCurrency => holding.cost_currency = text,
            HoldingColumn::CostNumber => holding.cost_number = number()?,
            HoldingColumn::PriceNumber => holding.price_number = number()?,
            HoldingColumn::BookValue => holding.book_value = number()?,
            HoldingColumn::MarketValue => holding.market_value = number()?,
            HoldingColumn::PriceDate => holding.price_date = parse_date(value, row_num)?,
        }
    }

    Ok(holding)
}

/// Parse a decimal cell, tolerating thousands separators. Empty is absent.
fn parse_decimal(
    text: &str,
    row_num: usize,
    column: &str,
) -> Result<Option<Decimal>, HoldingsError> {
    let cleaned = text.replace(',', "");
    if cleaned.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(&cleaned).map(Some).map_err(|e| {
        HoldingsError::Format(format!(
            "row {}: invalid number '{}' in column {}: {}",
            row_num, text, column, e
        ))
    })
}

fn parse_date(text: &str, row_num: usize) -> Result<Option<NaiveDate>, HoldingsError> {
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| {
            HoldingsError::Format(format!(
                "row {}: invalid price date '{}': {}",
                row_num, text, e
            ))
        })
}

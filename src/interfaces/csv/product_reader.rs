use crate::error::{Result, StoreError};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Columns an import file must carry.
pub const REQUIRED_HEADERS: [&str; 7] = [
    "name",
    "product_code",
    "price_usd",
    "image",
    "category",
    "description",
    "stock",
];

/// Columns an import file may carry.
pub const OPTIONAL_HEADERS: [&str; 2] = ["barcode", "cost_usd"];

/// A validated import row. Prices are still in USD.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// 1-based row number, counting the header.
    pub row: usize,
    pub name: String,
    pub product_code: String,
    pub barcode: Option<String>,
    pub price_usd: Decimal,
    pub cost_usd: Option<Decimal>,
    pub image: Option<String>,
    pub category: String,
    pub description: String,
    pub stock: u32,
}

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

/// Reads product import rows from a header-driven CSV source.
///
/// Header names are matched case-insensitively and cells are trimmed.
/// Quoted fields with `""` escapes are handled by the `csv` crate.
pub struct ProductReader<R: Read> {
    reader: csv::Reader<R>,
    columns: HashMap<String, usize>,
}

impl<R: Read> ProductReader<R> {
    /// Creates a reader and checks the header row.
    ///
    /// Fails with a single validation error listing every missing required header.
    pub fn new(source: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        let columns: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_lowercase(), i))
            .collect();

        let missing: Vec<&str> = REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|h| !columns.contains_key(*h))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::ValidationError(format!(
                "Missing required headers: {}",
                missing.join(", ")
            )));
        }

        Ok(Self { reader, columns })
    }

    /// Lazily yields each non-blank data row, validated.
    pub fn rows(self) -> impl Iterator<Item = std::result::Result<ImportRow, RowError>> {
        let columns = self.columns;
        self.reader
            .into_records()
            .enumerate()
            .filter_map(move |(index, record)| {
                let row = index + 2;
                match record {
                    Ok(record) if record.iter().all(|cell| cell.is_empty()) => None,
                    Ok(record) => Some(parse_row(row, &columns, &record)),
                    Err(e) => Some(Err(RowError::new(row, e.to_string()))),
                }
            })
    }
}

fn parse_row(
    row: usize,
    columns: &HashMap<String, usize>,
    record: &csv::StringRecord,
) -> std::result::Result<ImportRow, RowError> {
    let get = |name: &str| cell(columns, record, name);
    let optional = |name: &str| Some(get(name).to_string()).filter(|s| !s.is_empty());

    let name = get("name");
    if name.is_empty() {
        return Err(RowError::new(row, "Name is required"));
    }
    let product_code = get("product_code");
    if product_code.is_empty() {
        return Err(RowError::new(row, "Product code is required"));
    }
    let price_usd = Decimal::from_str(get("price_usd"))
        .map_err(|_| RowError::new(row, "Valid price_usd is required"))?;
    let category = get("category");
    if category.is_empty() {
        return Err(RowError::new(row, "Category is required"));
    }
    let cost_usd = match optional("cost_usd") {
        Some(raw) => Some(
            Decimal::from_str(&raw).map_err(|_| RowError::new(row, "Invalid cost_usd"))?,
        ),
        None => None,
    };

    Ok(ImportRow {
        row,
        name: name.to_string(),
        product_code: product_code.to_string(),
        barcode: optional("barcode"),
        price_usd,
        cost_usd,
        image: optional("image"),
        category: category.to_string(),
        description: get("description").to_string(),
        stock: parse_stock(get("stock")),
    })
}

/// Whole units at the start of the cell, so `12.5` and `12 pcs` read as 12.
/// Anything without leading digits, negatives included, reads as 0.
fn parse_stock(raw: &str) -> u32 {
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().unwrap_or(0)
}

fn cell<'a>(columns: &HashMap<String, usize>, record: &'a csv::StringRecord, name: &str) -> &'a str {
    columns
        .get(name)
        .and_then(|&i| record.get(i))
        .unwrap_or_default()
}

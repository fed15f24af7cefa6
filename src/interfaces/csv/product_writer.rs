use super::product_reader::{OPTIONAL_HEADERS, REQUIRED_HEADERS};
use crate::domain::catalog::Product;
use crate::error::Result;
use std::io::Write;

/// Columns of a product export.
pub const EXPORT_HEADERS: [&str; 9] = [
    "id",
    "name",
    "price",
    "cost_usd",
    "image",
    "category",
    "description",
    "stock",
    "created_at",
];

/// Writes products as CSV.
pub struct ProductWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ProductWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the export header and one record per product.
    pub fn write_products(&mut self, products: &[Product]) -> Result<()> {
        self.writer.write_record(EXPORT_HEADERS)?;
        for product in products {
            self.writer.write_record([
                product.id.map(|id| id.to_string()).unwrap_or_default(),
                product.name.clone(),
                product.price.normalize().to_string(),
                product
                    .cost_usd
                    .map(|c| c.normalize().to_string())
                    .unwrap_or_default(),
                product.image.clone(),
                product.category.clone(),
                product.description.clone(),
                product.stock.to_string(),
                product
                    .created_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Writes the import template: every import column and one sample row.
    pub fn write_template(&mut self) -> Result<()> {
        let headers = [
            REQUIRED_HEADERS[0],
            REQUIRED_HEADERS[1],
            OPTIONAL_HEADERS[0],
            REQUIRED_HEADERS[2],
            OPTIONAL_HEADERS[1],
            REQUIRED_HEADERS[3],
            REQUIRED_HEADERS[4],
            REQUIRED_HEADERS[5],
            REQUIRED_HEADERS[6],
        ];
        self.writer.write_record(headers)?;
        self.writer.write_record([
            "Sample Product",
            "PRD-001234",
            "1234567890123",
            "29.99",
            "15.00",
            "https://example.com/image.jpg",
            "skincare",
            "Sample description",
            "100",
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

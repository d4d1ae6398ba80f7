//! ============================================================================
//! Product Catalog - Header-driven CSV product file
//! ============================================================================
//! Columns are matched by header name; order is irrelevant and unknown
//! columns are ignored. Rows may stop early; the cells they leave out,
//! like price and billing interval, fall back to defaults instead of
//! failing the row. Only header names are trimmed.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::CatalogError;

pub const DEFAULT_BILLING_INTERVAL: &str = "one-time";

/// A purchasable product, one row of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Raw price text as found in the file
    pub price: Option<String>,
    pub billing_interval: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: None,
            billing_interval: None,
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_billing_interval(mut self, interval: impl Into<String>) -> Self {
        self.billing_interval = Some(interval.into());
        self
    }

    /// Numeric price; missing, empty, unparsable or non-finite -> 0.0
    pub fn price_value(&self) -> f64 {
        self.price
            .as_deref()
            .and_then(|p| p.trim().parse::<f64>().ok())
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
    }

    /// Billing interval, or "one-time" when missing or empty
    pub fn billing_interval_or_default(&self) -> &str {
        self.billing_interval
            .as_deref()
            .filter(|i| !i.is_empty())
            .unwrap_or(DEFAULT_BILLING_INTERVAL)
    }
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    billing_interval: Option<String>,
}

impl ProductRow {
    /// Rows without an `id` column get `row-<n>` (1-based data row)
    fn into_product(self, row_number: usize) -> Product {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("row-{}", row_number));

        Product {
            id,
            name: self.name.unwrap_or_default(),
            price: self.price,
            billing_interval: self.billing_interval,
        }
    }
}

/// Read every product from a CSV file
pub fn read_products(path: impl AsRef<Path>) -> Result<Vec<Product>, CatalogError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let products = read_products_from(file)?;
    info!("Loaded {} products from {}", products.len(), path.display());
    Ok(products)
}

/// Read every product from CSV text with a header row
pub fn read_products_from<R: Read>(reader: R) -> Result<Vec<Product>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut products = Vec::new();
    for (index, row) in reader.deserialize::<ProductRow>().enumerate() {
        let product = row?.into_product(index + 1);
        debug!("Product {}: {} ({:?})", product.id, product.name, product.price);
        products.push(product);
    }
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_parsing() {
        let p = |price: Option<&str>| Product {
            price: price.map(str::to_string),
            ..Product::new("p", "P")
        };

        assert_eq!(p(Some("19.99")).price_value(), 19.99);
        assert_eq!(p(Some("49.90")).price_value(), 49.9);
        assert_eq!(p(Some(" 5 ")).price_value(), 5.0);
        assert_eq!(p(None).price_value(), 0.0);
        assert_eq!(p(Some("")).price_value(), 0.0);
        assert_eq!(p(Some("abc")).price_value(), 0.0);
        assert_eq!(p(Some("NaN")).price_value(), 0.0);
        assert_eq!(p(Some("inf")).price_value(), 0.0);
    }

    #[test]
    fn test_billing_interval_default() {
        let product = Product::new("p", "P");
        assert_eq!(product.billing_interval_or_default(), "one-time");
        assert_eq!(
            product.clone().with_billing_interval("").billing_interval_or_default(),
            "one-time"
        );
        assert_eq!(
            product.with_billing_interval("monthly").billing_interval_or_default(),
            "monthly"
        );
    }

    #[test]
    fn test_columns_matched_by_header() {
        let csv = "billing_interval,price,name,extra\nmonthly,49.90,Course A,x\n,,Course B,y\n";
        let products = read_products_from(csv.as_bytes()).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Course A");
        assert_eq!(products[0].id, "row-1");
        assert_eq!(products[0].price_value(), 49.9);
        assert_eq!(products[0].billing_interval_or_default(), "monthly");

        assert_eq!(products[1].id, "row-2");
        assert_eq!(products[1].price, None);
        assert_eq!(products[1].price_value(), 0.0);
        assert_eq!(products[1].billing_interval_or_default(), "one-time");
    }

    #[test]
    fn test_id_column_and_missing_price_column() {
        let csv = "id,name\nprod_1,Course A\n,Course B\n";
        let products = read_products_from(csv.as_bytes()).unwrap();

        assert_eq!(products[0].id, "prod_1");
        assert_eq!(products[1].id, "row-2");
        assert_eq!(products[0].price_value(), 0.0);
    }

    #[test]
    fn test_short_row_defaults_missing_cells() {
        let csv = "id,name,price,billing_interval\ncourse-a,Course A,49.90,monthly\nebook-c,Ebook C\n";
        let products = read_products_from(csv.as_bytes()).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price_value(), 49.9);
        assert_eq!(products[1].id, "ebook-c");
        assert_eq!(products[1].price, None);
        assert_eq!(products[1].price_value(), 0.0);
        assert_eq!(products[1].billing_interval_or_default(), "one-time");
    }

    #[test]
    fn test_cells_kept_as_written() {
        let csv = " id , name ,price\n p1 ,  Course A , 12.50 \n";
        let products = read_products_from(csv.as_bytes()).unwrap();

        assert_eq!(products[0].id, " p1 ");
        assert_eq!(products[0].name, "  Course A ");
        assert_eq!(products[0].price_value(), 12.5);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = read_products("/definitely/not/here/products.csv");
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        std::fs::write(&path, "name,price,billing_interval\nCourse A,49.90,monthly\n").unwrap();

        let products = read_products(&path).unwrap();
        assert_eq!(products, vec![Product::new("row-1", "Course A")
            .with_price("49.90")
            .with_billing_interval("monthly")]);
    }
}

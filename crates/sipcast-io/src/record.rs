//! Domain types for sipcast-io.

use std::fmt;

/// The three columns a sales file must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// Air temperature (numeric, may be blank).
    Temperature,
    /// Weather condition (category).
    Weather,
    /// Beverage sold (category, the prediction target).
    Product,
}

impl ColumnRole {
    /// All roles, in canonical column order.
    pub const ALL: [ColumnRole; 3] = [
        ColumnRole::Temperature,
        ColumnRole::Weather,
        ColumnRole::Product,
    ];

    /// Header spellings recognized for this role, compared after trimming
    /// and ASCII lowercasing. Includes the Japanese headers of the shop's
    /// sales sheets.
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Temperature => &["temperature", "temp", "気温"],
            ColumnRole::Weather => &["weather", "天気"],
            ColumnRole::Product => &["product", "商品"],
        }
    }

    /// Return `true` if `header` names this role.
    #[must_use]
    pub fn matches(self, header: &str) -> bool {
        let normalized = header.trim_start_matches('\u{feff}').trim().to_ascii_lowercase();
        self.aliases().contains(&normalized.as_str())
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnRole::Temperature => "temperature",
            ColumnRole::Weather => "weather",
            ColumnRole::Product => "product",
        })
    }
}

/// One raw sales observation as read from disk.
///
/// Every field is optional: a blank temperature is imputed downstream, while
/// a blank weather or product makes the record malformed for encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    /// Temperature reading, `None` when the cell was blank or a missing marker.
    pub temperature: Option<f64>,
    /// Raw weather category.
    pub weather: Option<String>,
    /// Raw product category.
    pub product: Option<String>,
}

impl SalesRecord {
    /// Build a complete record with all categorical fields present.
    #[must_use]
    pub fn new(temperature: Option<f64>, weather: &str, product: &str) -> Self {
        Self {
            temperature,
            weather: Some(weather.to_string()),
            product: Some(product.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_and_japanese_headers_match() {
        assert!(ColumnRole::Temperature.matches("Temperature"));
        assert!(ColumnRole::Temperature.matches(" temp "));
        assert!(ColumnRole::Temperature.matches("気温"));
        assert!(ColumnRole::Weather.matches("天気"));
        assert!(ColumnRole::Product.matches("\u{feff}PRODUCT"));
        assert!(!ColumnRole::Product.matches("weather"));
    }

    #[test]
    fn new_fills_categoricals() {
        let record = SalesRecord::new(Some(25.0), "Sunny", "Cola");
        assert_eq!(record.weather.as_deref(), Some("Sunny"));
        assert_eq!(record.product.as_deref(), Some("Cola"));
    }

    #[test]
    fn display_names_roles() {
        assert_eq!(ColumnRole::Weather.to_string(), "weather");
    }
}

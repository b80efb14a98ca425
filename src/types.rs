use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One CSV row exactly as it appears on disk. Every cell is optional text;
/// typing happens in the loader.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Platform")]
    pub platform: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Genre")]
    pub genre: Option<String>,
    #[serde(rename = "Publisher")]
    pub publisher: Option<String>,
    #[serde(rename = "NA_Sales")]
    pub na_sales: Option<String>,
    #[serde(rename = "EU_Sales")]
    pub eu_sales: Option<String>,
    #[serde(rename = "JP_Sales")]
    pub jp_sales: Option<String>,
    #[serde(rename = "Other_Sales")]
    pub other_sales: Option<String>,
    #[serde(rename = "Global_Sales")]
    pub global_sales: Option<String>,
}

/// A typed sales row. Sales figures are in millions of units and are
/// always finite and non-negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Platform")]
    pub platform: String,
    #[serde(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "Publisher")]
    pub publisher: String,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "NA_Sales")]
    pub na_sales: f64,
    #[serde(rename = "EU_Sales")]
    pub eu_sales: f64,
    #[serde(rename = "JP_Sales")]
    pub jp_sales: f64,
    #[serde(rename = "Other_Sales")]
    pub other_sales: f64,
    #[serde(rename = "Global_Sales")]
    pub global_sales: f64,
}

impl SalesRecord {
    /// Value of a categorical column, used as a grouping key.
    pub fn dimension(&self, dim: Dimension) -> Value {
        match dim {
            Dimension::Name => Value::Text(self.name.clone()),
            Dimension::Platform => Value::Text(self.platform.clone()),
            Dimension::Genre => Value::Text(self.genre.clone()),
            Dimension::Publisher => Value::Text(self.publisher.clone()),
            Dimension::Year => self.year.map_or(Value::Missing, Value::Int),
        }
    }

    /// Value of a numeric column.
    pub fn field(&self, field: SalesField) -> f64 {
        match field {
            SalesField::NaSales => self.na_sales,
            SalesField::EuSales => self.eu_sales,
            SalesField::JpSales => self.jp_sales,
            SalesField::OtherSales => self.other_sales,
            SalesField::GlobalSales => self.global_sales,
        }
    }

    /// Overwrite a text column. Returns `false` for `Year`, which cannot
    /// hold a label.
    pub fn set_label(&mut self, dim: Dimension, label: &str) -> bool {
        let slot = match dim {
            Dimension::Name => &mut self.name,
            Dimension::Platform => &mut self.platform,
            Dimension::Genre => &mut self.genre,
            Dimension::Publisher => &mut self.publisher,
            Dimension::Year => return false,
        };
        *slot = label.to_string();
        true
    }
}

/// Categorical columns a table can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Name,
    Platform,
    Genre,
    Publisher,
    Year,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Name => "Name",
            Dimension::Platform => "Platform",
            Dimension::Genre => "Genre",
            Dimension::Publisher => "Publisher",
            Dimension::Year => "Year",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric sales columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalesField {
    #[serde(rename = "NA_Sales")]
    NaSales,
    #[serde(rename = "EU_Sales")]
    EuSales,
    #[serde(rename = "JP_Sales")]
    JpSales,
    #[serde(rename = "Other_Sales")]
    OtherSales,
    #[serde(rename = "Global_Sales")]
    GlobalSales,
}

impl SalesField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesField::NaSales => "NA_Sales",
            SalesField::EuSales => "EU_Sales",
            SalesField::JpSales => "JP_Sales",
            SalesField::OtherSales => "Other_Sales",
            SalesField::GlobalSales => "Global_Sales",
        }
    }
}

/// A grouping-key cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Missing,
    Int(i32),
    Text(String),
}

impl Value {
    /// Whether this cell equals an allow-list entry (exact, case-sensitive).
    pub fn matches_label(&self, label: &str) -> bool {
        match self {
            Value::Text(s) => s == label,
            Value::Int(i) => label.trim().parse::<i32>().is_ok_and(|l| l == *i),
            Value::Missing => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Missing => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Int(i) => serializer.serialize_i32(*i),
            Value::Missing => serializer.serialize_none(),
        }
    }
}

/// A computed metric cell. Counts and ranks stay integral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Number(f64),
    Integer(u64),
}

impl Measure {
    pub fn as_f64(&self) -> f64 {
        match self {
            Measure::Number(v) => *v,
            Measure::Integer(v) => *v as f64,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Six decimals hides summation noise like 0.30000000000000004.
            Measure::Number(v) => write!(f, "{}", (v * 1e6).round() / 1e6),
            Measure::Integer(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measure::Number(v) => serializer.serialize_f64(*v),
            Measure::Integer(v) => serializer.serialize_u64(*v),
        }
    }
}

/// One row of a derived table: the grouping key followed by its metrics.
///
/// Serializes as a flat object, e.g.
/// `{"Platform": "PS2", "Genre": "Action", "TotalSales": 1.5}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedRow {
    pub keys: IndexMap<Dimension, Value>,
    pub metrics: IndexMap<String, Measure>,
}

impl AggregatedRow {
    pub fn key(&self, dim: Dimension) -> Option<&Value> {
        self.keys.get(&dim)
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(Measure::as_f64)
    }

    /// Column headers in output order.
    pub fn columns(&self) -> Vec<String> {
        self.keys
            .keys()
            .map(|d| d.as_str().to_string())
            .chain(self.metrics.keys().cloned())
            .collect()
    }

    /// Cell text in the same order as [`AggregatedRow::columns`].
    pub fn cells(&self) -> Vec<String> {
        self.keys
            .values()
            .map(Value::to_string)
            .chain(self.metrics.values().map(Measure::to_string))
            .collect()
    }

    /// Same row with one more metric appended.
    pub fn with_metric(mut self, name: &str, value: Measure) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }
}

impl Serialize for AggregatedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len() + self.metrics.len()))?;
        for (dim, value) in &self.keys {
            map.serialize_entry(dim.as_str(), value)?;
        }
        for (name, measure) in &self.metrics {
            map.serialize_entry(name, measure)?;
        }
        map.end()
    }
}

/// An aggregated row with its ordinal position among peers sharing the
/// same partition value (1 = highest).
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    pub row: AggregatedRow,
    pub rank: usize,
}

impl RankedRow {
    /// Flatten into a plain row carrying the rank as an integer metric.
    pub fn into_row(self, rank_name: &str) -> AggregatedRow {
        self.row.with_metric(rank_name, Measure::Integer(self.rank as u64))
    }
}

/// Headline figures written alongside the view tables.
#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub total_platforms: usize,
    pub total_genres: usize,
    pub total_publishers: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub total_global_sales: f64,
    pub avg_global_sales: f64,
    pub views: Vec<ViewSummary>,
}

#[derive(Debug, Serialize)]
pub struct ViewSummary {
    pub name: String,
    pub rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SalesRecord {
        SalesRecord {
            name: "Wii Sports".to_string(),
            platform: "Wii".to_string(),
            genre: "Sports".to_string(),
            publisher: "Nintendo".to_string(),
            year: Some(2006),
            na_sales: 41.49,
            eu_sales: 29.02,
            jp_sales: 3.77,
            other_sales: 8.46,
            global_sales: 82.74,
        }
    }

    #[test]
    fn test_dimension_and_field_access() {
        let r = sample();
        assert_eq!(r.dimension(Dimension::Platform), Value::Text("Wii".into()));
        assert_eq!(r.dimension(Dimension::Year), Value::Int(2006));
        assert_eq!(r.field(SalesField::JpSales), 3.77);

        let undated = SalesRecord { year: None, ..sample() };
        assert_eq!(undated.dimension(Dimension::Year), Value::Missing);
    }

    #[test]
    fn test_set_label() {
        let mut r = sample();
        assert!(r.set_label(Dimension::Publisher, "Other Publishers"));
        assert_eq!(r.publisher, "Other Publishers");
        assert!(!r.set_label(Dimension::Year, "2000"));
        assert_eq!(r.year, Some(2006));
    }

    #[test]
    fn test_value_matches_label() {
        assert!(Value::Text("PS2".into()).matches_label("PS2"));
        assert!(!Value::Text("PS2".into()).matches_label("ps2"));
        assert!(Value::Int(2001).matches_label("2001"));
        assert!(!Value::Missing.matches_label(""));
    }

    #[test]
    fn test_row_serializes_flat() {
        let mut row = AggregatedRow::default();
        row.keys.insert(Dimension::Platform, Value::Text("PS2".into()));
        row.keys.insert(Dimension::Year, Value::Int(2004));
        row.metrics.insert("TotalSales".into(), Measure::Number(1.5));
        row.metrics.insert("GameCount".into(), Measure::Integer(2));

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"Platform":"PS2","Year":2004,"TotalSales":1.5,"GameCount":2}"#
        );
        assert_eq!(row.columns(), vec!["Platform", "Year", "TotalSales", "GameCount"]);
        assert_eq!(row.cells(), vec!["PS2", "2004", "1.5", "2"]);
    }

    #[test]
    fn test_measure_cells_drop_float_noise() {
        let mut row = AggregatedRow::default();
        row.keys.insert(Dimension::Genre, Value::Text("Puzzle".into()));
        row.metrics.insert("TotalSales".into(), Measure::Number(0.1 + 0.2));
        row.metrics.insert("AvgSales".into(), Measure::Number(82.74));
        row.metrics.insert("GameCount".into(), Measure::Integer(3));
        assert_eq!(row.cells(), vec!["Puzzle", "0.3", "82.74", "3"]);
    }

    #[test]
    fn test_ranked_row_into_row() {
        let mut row = AggregatedRow::default();
        row.keys.insert(Dimension::Publisher, Value::Text("Sega".into()));
        let ranked = RankedRow { row, rank: 3 };
        let flat = ranked.into_row("Rank");
        assert_eq!(flat.metrics.get("Rank"), Some(&Measure::Integer(3)));
    }
}

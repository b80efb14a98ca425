//! Built-in report views: the derived tables behind the sales dashboard.

use crate::error::{Error, Result};
use crate::pipeline::{AggregateOp, SortOrder};
use crate::request::{AggregationRequest, Predicate};
use crate::types::{Dimension, SalesField};
use serde::{Deserialize, Serialize};

pub const TRACKED_PLATFORMS: [&str; 15] = [
    "PS2", "PS3", "PS4", "X360", "Wii", "DS", "GBA", "3DS", "N64", "NES", "SNES", "PC", "PSP", "GC",
    "XB",
];

pub const TRACKED_PUBLISHERS: [&str; 9] = [
    "Nintendo",
    "Electronic Arts",
    "Activision",
    "Ubisoft",
    "Konami Digital Entertainment",
    "Sega",
    "Namco Bandai Games",
    "THQ",
    "Sony Computer Entertainment",
];

pub const FIRST_YEAR: i32 = 1990;
pub const LAST_YEAR: i32 = 2016;

/// Minimum NA or JP sales (millions) for a title to appear in the regional comparison.
pub const REGIONAL_THRESHOLD: f64 = 0.1;

/// A named request whose output becomes one report table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub request: AggregationRequest,
}

fn year_range() -> Predicate {
    Predicate::YearBetween {
        min: FIRST_YEAR,
        max: LAST_YEAR,
    }
}

/// Global sales per platform and genre for the tracked platforms, with each
/// platform's total attached. Platforms are ordered by that total (name breaks
/// ties) and genres within a platform by their own sales.
pub fn platform_genre_sales() -> View {
    View {
        name: "platform_genre_sales".to_string(),
        title: "Global Sales by Platform and Genre".to_string(),
        note: Some("Tracked platforms, ordered by platform total".to_string()),
        request: AggregationRequest::new()
            .allow(Dimension::Platform, &TRACKED_PLATFORMS)
            .group_by(&[Dimension::Platform, Dimension::Genre])
            .aggregate(AggregateOp::Sum, SalesField::GlobalSales, "TotalSales")
            .join(&[Dimension::Platform], AggregateOp::Sum, "TotalSales", "PlatformTotal")
            .sort("PlatformTotal", SortOrder::Descending)
            .sort_by(Dimension::Platform, SortOrder::Ascending)
            .sort("TotalSales", SortOrder::Descending),
    }
}

/// Yearly global sales per genre.
pub fn genre_timeline() -> View {
    View {
        name: "genre_timeline".to_string(),
        title: "Genre Sales over Time".to_string(),
        note: Some(format!("Grouped by Year and Genre, {}-{}", FIRST_YEAR, LAST_YEAR)),
        request: AggregationRequest::new()
            .filter(year_range())
            .group_by(&[Dimension::Year, Dimension::Genre])
            .aggregate(AggregateOp::Sum, SalesField::GlobalSales, "TotalSales"),
    }
}

/// North America vs Japan sales per title, Nintendo against everyone else.
pub fn regional_comparison() -> View {
    View {
        name: "regional_comparison".to_string(),
        title: "North America vs Japan Sales".to_string(),
        note: Some(format!(
            "Titles with NA or JP sales >= {}M",
            REGIONAL_THRESHOLD
        )),
        request: AggregationRequest::new()
            .filter(Predicate::AnyAtLeast {
                fields: vec![SalesField::NaSales, SalesField::JpSales],
                threshold: REGIONAL_THRESHOLD,
            })
            .relabel(Dimension::Publisher, &["Nintendo"], "Other Publishers")
            .project(
                &[Dimension::Name, Dimension::Platform, Dimension::Publisher],
                &[SalesField::NaSales, SalesField::JpSales, SalesField::GlobalSales],
            ),
    }
}

/// Annual sales of the tracked publishers with each publisher's rank per year.
pub fn publisher_trends() -> View {
    View {
        name: "publisher_trends".to_string(),
        title: "Top Publishers' Annual Sales".to_string(),
        note: Some("Ranked within each year by TotalSales".to_string()),
        request: AggregationRequest::new()
            .filter(year_range())
            .allow(Dimension::Publisher, &TRACKED_PUBLISHERS)
            .group_by(&[Dimension::Year, Dimension::Publisher])
            .aggregate(AggregateOp::Sum, SalesField::GlobalSales, "TotalSales")
            .rank(Dimension::Year, "TotalSales", "Rank"),
    }
}

pub fn builtin_views() -> Vec<View> {
    vec![
        platform_genre_sales(),
        genre_timeline(),
        regional_comparison(),
        publisher_trends(),
    ]
}

/// Built-in views followed by custom ones. A custom view with a built-in's
/// name replaces it in place.
pub fn resolve_views(custom: &[View]) -> Vec<View> {
    let mut views = builtin_views();
    for view in custom {
        match views.iter_mut().find(|v| v.name == view.name) {
            Some(slot) => *slot = view.clone(),
            None => views.push(view.clone()),
        }
    }
    views
}

/// Keep only the named views, in the order given. An empty selection keeps all.
pub fn select_views(views: Vec<View>, names: &[String]) -> Result<Vec<View>> {
    if names.is_empty() {
        return Ok(views);
    }
    names
        .iter()
        .map(|name| {
            views
                .iter()
                .find(|v| &v.name == name)
                .cloned()
                .ok_or_else(|| Error::UnknownView(name.clone()))
        })
        .collect()
}

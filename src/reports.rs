use crate::types::{AggregatedRow, SalesRecord, SummaryStats, ViewSummary};
use crate::util::average;
use crate::views::View;
use chrono::Utc;
use std::collections::HashSet;
use tracing::info;

/// A view together with the rows it produced.
#[derive(Debug, Clone)]
pub struct ViewReport {
    pub view: View,
    pub rows: Vec<AggregatedRow>,
}

pub fn generate_view(data: &[SalesRecord], view: &View) -> ViewReport {
    let rows = view.request.run(data);
    info!(view = %view.name, rows = rows.len(), "Generated view");
    ViewReport {
        view: view.clone(),
        rows,
    }
}

pub fn generate_reports(data: &[SalesRecord], views: &[View]) -> Vec<ViewReport> {
    views.iter().map(|v| generate_view(data, v)).collect()
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values
        .filter(|s| !s.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

pub fn generate_summary(data: &[SalesRecord], reports: &[ViewReport]) -> SummaryStats {
    let global: Vec<f64> = data.iter().map(|r| r.global_sales).collect();
    SummaryStats {
        generated_at: Utc::now(),
        total_records: data.len(),
        total_platforms: distinct(data.iter().map(|r| r.platform.as_str())),
        total_genres: distinct(data.iter().map(|r| r.genre.as_str())),
        total_publishers: distinct(data.iter().map(|r| r.publisher.as_str())),
        first_year: data.iter().filter_map(|r| r.year).min(),
        last_year: data.iter().filter_map(|r| r.year).max(),
        total_global_sales: global.iter().sum(),
        avg_global_sales: average(&global),
        views: reports
            .iter()
            .map(|r| ViewSummary {
                name: r.view.name.clone(),
                rows: r.rows.len(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::builtin_views;

    fn data() -> Vec<SalesRecord> {
        vec![
            SalesRecord {
                name: "Wii Sports".into(),
                platform: "Wii".into(),
                genre: "Sports".into(),
                publisher: "Nintendo".into(),
                year: Some(2006),
                na_sales: 41.49,
                global_sales: 82.74,
                ..Default::default()
            },
            SalesRecord {
                name: "GTA: San Andreas".into(),
                platform: "PS2".into(),
                genre: "Action".into(),
                publisher: "Take-Two Interactive".into(),
                year: Some(2004),
                na_sales: 9.43,
                global_sales: 20.81,
                ..Default::default()
            },
            SalesRecord {
                name: "Unknown".into(),
                platform: "PS2".into(),
                genre: "Action".into(),
                year: None,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_generate_reports_runs_every_view() {
        let reports = generate_reports(&data(), &builtin_views());
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[0].view.name, "platform_genre_sales");
        assert_eq!(reports[0].rows.len(), 2);
        assert_eq!(reports[3].rows.len(), 1);
    }

    #[test]
    fn test_summary() {
        let d = data();
        let reports = generate_reports(&d, &builtin_views());
        let s = generate_summary(&d, &reports);
        assert_eq!(s.total_records, 3);
        assert_eq!(s.total_platforms, 2);
        assert_eq!(s.total_genres, 2);
        // empty publisher is not counted
        assert_eq!(s.total_publishers, 2);
        assert_eq!(s.first_year, Some(2004));
        assert_eq!(s.last_year, Some(2006));
        assert!((s.total_global_sales - 103.55).abs() < 1e-9);
        assert_eq!(s.views.len(), 4);
        assert_eq!(s.views[2].rows, 2);
    }
}

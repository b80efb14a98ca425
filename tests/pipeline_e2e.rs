// tests/pipeline_e2e.rs
//
// End-to-end runs: CSV text in, derived rows out.
use vgsales_report::loader::load_from_reader;
use vgsales_report::pipeline::{AggregateOp, SortOrder};
use vgsales_report::views::{builtin_views, publisher_trends};
use vgsales_report::{AggregationRequest, Dimension, Measure, SalesField, Value};

const GAMES: &str = "\
Name,Platform,Year,Genre,Publisher,NA_Sales,EU_Sales,JP_Sales,Other_Sales,Global_Sales
Alpha,PS2,2001,Action,Sega,0.5,0.2,0.1,0.1,1.5
Beta,PS2,2002,Action,Sega,0.1,0.1,0.0,0.0,bad
Gamma,Wii,2006,Sports,Nintendo,1.0,0.5,0.3,0.2,2.0
";

fn json(rows: &[vgsales_report::AggregatedRow]) -> String {
    serde_json::to_string(rows).unwrap()
}

#[test]
fn platform_genre_totals_with_allow_list() {
    let (data, report) = load_from_reader(GAMES.as_bytes(), ',').unwrap();
    assert_eq!(report.coerced_cells, 1);

    let rows = AggregationRequest::new()
        .allow(Dimension::Platform, &["PS2", "Wii"])
        .group_by(&[Dimension::Platform, Dimension::Genre])
        .aggregate(AggregateOp::Sum, SalesField::GlobalSales, "TotalSales")
        .run(&data);

    assert_eq!(
        json(&rows),
        r#"[{"Platform":"PS2","Genre":"Action","TotalSales":1.5},{"Platform":"Wii","Genre":"Sports","TotalSales":2.0}]"#
    );
}

#[test]
fn filtering_happens_before_aggregation() {
    let src = "Platform,Global_Sales\nPS2,1\nWii,2\n";
    let (data, _) = load_from_reader(src.as_bytes(), ',').unwrap();
    let rows = AggregationRequest::new()
        .allow(Dimension::Platform, &["PS2"])
        .aggregate(AggregateOp::Sum, SalesField::GlobalSales, "TotalSales")
        .run(&data);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].metric("TotalSales"), Some(1.0));
}

#[test]
fn sum_mean_count_agree_with_partition() {
    let (data, _) = load_from_reader(GAMES.as_bytes(), ',').unwrap();
    let rows = AggregationRequest::new()
        .group_by(&[Dimension::Publisher])
        .aggregate(AggregateOp::Sum, SalesField::NaSales, "TotalNA")
        .aggregate(AggregateOp::Mean, SalesField::NaSales, "AvgNA")
        .aggregate(AggregateOp::Count, SalesField::NaSales, "GameCount")
        .run(&data);

    for row in &rows {
        let publisher = row.key(Dimension::Publisher).unwrap().to_string();
        let matching: Vec<f64> = data
            .iter()
            .filter(|r| r.publisher == publisher)
            .map(|r| r.na_sales)
            .collect();
        let sum: f64 = matching.iter().sum();
        assert_eq!(row.metric("TotalNA"), Some(sum));
        assert_eq!(row.metric("AvgNA"), Some(sum / matching.len() as f64));
        assert_eq!(
            row.metrics.get("GameCount"),
            Some(&Measure::Integer(matching.len() as u64))
        );
    }
}

#[test]
fn yearly_publisher_rank() {
    let src = "\
Name,Year,Publisher,Global_Sales
a,2000,P1,10
b,2000,P2,30
c,2000,P3,20
";
    let (data, _) = load_from_reader(src.as_bytes(), ',').unwrap();
    let rows = AggregationRequest::new()
        .group_by(&[Dimension::Year, Dimension::Publisher])
        .aggregate(AggregateOp::Sum, SalesField::GlobalSales, "Sales")
        .rank(Dimension::Year, "Sales", "Rank")
        .run(&data);
    let ranks: Vec<(String, Measure)> = rows
        .iter()
        .map(|r| {
            (
                r.key(Dimension::Publisher).unwrap().to_string(),
                r.metrics["Rank"],
            )
        })
        .collect();
    assert_eq!(
        ranks,
        vec![
            ("P2".to_string(), Measure::Integer(1)),
            ("P3".to_string(), Measure::Integer(2)),
            ("P1".to_string(), Measure::Integer(3)),
        ]
    );
}

#[test]
fn builtin_views_are_idempotent() {
    let (data, _) = load_from_reader(GAMES.as_bytes(), ',').unwrap();
    for view in builtin_views() {
        let first = view.request.run(&data);
        let second = view.request.run(&data);
        assert_eq!(json(&first), json(&second), "view {}", view.name);
    }
}

#[test]
fn publisher_trends_ranks_are_contiguous() {
    let src = "\
Name,Year,Publisher,Global_Sales
a,2001,Sega,1
b,2001,THQ,2
c,2001,Nintendo,3
d,2002,Sega,5
e,2002,Ubisoft,n/a
f,1985,Nintendo,40
";
    let (data, _) = load_from_reader(src.as_bytes(), ',').unwrap();
    let rows = publisher_trends().request.run(&data);
    assert_eq!(rows.len(), 5);
    for year in [2001, 2002] {
        let mut ranks: Vec<u64> = rows
            .iter()
            .filter(|r| r.key(Dimension::Year) == Some(&Value::Int(year)))
            .filter_map(|r| match r.metrics.get("Rank") {
                Some(Measure::Integer(n)) => Some(*n),
                _ => None,
            })
            .collect();
        ranks.sort_unstable();
        let expected: Vec<u64> = (1..=ranks.len() as u64).collect();
        assert_eq!(ranks, expected);
    }
}

#[test]
fn join_totals_drive_platform_order() {
    let (data, _) = load_from_reader(GAMES.as_bytes(), ',').unwrap();
    let rows = AggregationRequest::new()
        .group_by(&[Dimension::Platform, Dimension::Genre])
        .aggregate(AggregateOp::Sum, SalesField::GlobalSales, "TotalSales")
        .join(&[Dimension::Platform], AggregateOp::Sum, "TotalSales", "PlatformTotal")
        .sort("PlatformTotal", SortOrder::Descending)
        .run(&data);
    assert_eq!(rows[0].key(Dimension::Platform), Some(&Value::Text("Wii".into())));
    assert_eq!(rows[0].metric("PlatformTotal"), Some(2.0));
    assert_eq!(rows[1].metric("PlatformTotal"), Some(1.5));
}

use case_growth::chart::layout::REGIONS;
use case_growth::config::{DateWindow, PipelineConfig, StagingConfig};
use case_growth::fetch::BasicClient;
use case_growth::parser::parse_cases;
use case_growth::pipeline::{compute, run, stage};
use case_growth::records::AgeBand;
use case_growth::staging::StagingStore;
use case_growth::transform::filter::{DateRange, select_region, value_bounds};
use chrono::{Days, NaiveDate};

fn unbounded() -> PipelineConfig {
    PipelineConfig {
        ingest: DateWindow::default(),
        ..Default::default()
    }
}

fn synthetic_feed(days: u64, cases: impl Fn(u64) -> i64) -> String {
    let start = NaiveDate::from_ymd_opt(2022, 10, 1).unwrap();
    let mut body = String::from("areaCode,areaName,areaType,date,age,cases,rollingSum,rollingRate\n");
    for day in 0..days {
        let date = start + Days::new(day);
        body.push_str(&format!("E12000007,London,region,{date},20_24,{},0,0\n", cases(day)));
        body.push_str(&format!("E12000007,London,region,{date},60+,999,0,0\n"));
    }
    body
}

#[test]
fn test_fixture_parse_and_aggregate() {
    let bytes = include_bytes!("fixtures/regional_sample.csv");
    let records = parse_cases(bytes).expect("Failed to parse fixture");
    assert_eq!(records.len(), 14);

    let rows = compute(records, &unbounded()).unwrap();

    let find = |region: &str, band: AgeBand, day: u32| {
        rows.iter()
            .find(|r| {
                r.region == region
                    && r.age_band == band
                    && r.date == NaiveDate::from_ymd_opt(2022, 9, day).unwrap()
            })
            .map(|r| r.cases)
    };

    assert_eq!(find("North East", AgeBand::Under20, 2), Some(21));
    assert_eq!(find("North East", AgeBand::Age20To59, 2), Some(49));
    assert_eq!(find("North East", AgeBand::Under20, 1), Some(7));
    assert_eq!(find("North East", AgeBand::Age20To59, 1), Some(22));
    assert_eq!(find("London", AgeBand::Under20, 2), Some(40));
    assert_eq!(find("London", AgeBand::Age20To59, 2), Some(183));
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|r| r.growth_rate.is_none()));
}

#[test]
fn test_constant_cases_end_to_end() {
    let feed = synthetic_feed(30, |_| 100);
    let records = parse_cases(feed.as_bytes()).unwrap();
    let rows = compute(records, &unbounded()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut store = StagingStore::open(dir.path().join("staging.db"), "cases_by_specdate").unwrap();
    assert_eq!(stage(&mut store, &rows).unwrap(), 30);

    let reloaded = store.select_all().unwrap();
    let range = DateRange::resolve(&reloaded, &DateWindow::default()).unwrap();
    assert_eq!(range.from, NaiveDate::from_ymd_opt(2022, 10, 15).unwrap());
    assert_eq!(range.to, NaiveDate::from_ymd_opt(2022, 10, 30).unwrap());

    let london = select_region(&reloaded, "London", &range);
    assert_eq!(london.len(), 16);
    assert!(london.iter().all(|r| r.growth_rate == Some(0.0)));
    assert_eq!(value_bounds(&reloaded, &range).unwrap(), (0.0, 0.0));

    let mut warm_up: Vec<_> = reloaded
        .iter()
        .filter(|r| r.growth_rate.is_none())
        .map(|r| r.date)
        .collect();
    warm_up.sort();
    assert_eq!(warm_up.len(), 13);
    assert_eq!(warm_up.last(), Some(&NaiveDate::from_ymd_opt(2022, 10, 13).unwrap()));
}

#[test]
fn test_growing_cases_end_to_end() {
    let feed = synthetic_feed(35, |day| (100_000.0 * 2f64.powf(day as f64 / 7.0)).round() as i64);
    let records = parse_cases(feed.as_bytes()).unwrap();
    let rows = compute(records, &unbounded()).unwrap();

    let mut store = StagingStore::open_in_memory("cases").unwrap();
    stage(&mut store, &rows).unwrap();
    let reloaded = store.select_all().unwrap();

    let range = DateRange::resolve(&reloaded, &DateWindow::default()).unwrap();
    let expected = (2f64.powf(1.0 / 7.0) - 1.0) * 100.0;
    let (lo, hi) = value_bounds(&reloaded, &range).unwrap();
    assert!((lo - expected).abs() < 0.05, "{lo}");
    assert!((hi - expected).abs() < 0.05, "{hi}");
}

#[test]
fn test_malformed_feed_aborts() {
    let feed = "areaName,date,age,cases\nLondon,2022-10-01,20_24,\n";
    assert!(parse_cases(feed.as_bytes()).is_err());
}

#[tokio::test]
async fn test_run_from_local_file_writes_chart() {
    let dir = tempfile::tempdir().unwrap();
    let start = NaiveDate::from_ymd_opt(2022, 10, 1).unwrap();
    let mut body = String::from("areaCode,areaName,areaType,date,age,cases,rollingSum,rollingRate\n");
    for region in REGIONS {
        for day in 0..28u64 {
            let date = start + Days::new(day);
            body.push_str(&format!("X,{region},region,{date},00_04,{},0,0\n", 50 + day * 3));
            body.push_str(&format!("X,{region},region,{date},20_24,{},0,0\n", 200 + day * 7));
        }
    }
    let feed = dir.path().join("feed.csv");
    std::fs::write(&feed, body).unwrap();

    let config = PipelineConfig {
        staging: StagingConfig {
            db_path: dir.path().join("staging.db"),
            ..Default::default()
        },
        output_path: dir.path().join("out").join("chart.png"),
        ..Default::default()
    };

    let summary = run(&BasicClient::new(), &config, feed.to_str().unwrap())
        .await
        .expect("pipeline run failed");

    assert_eq!(summary.fetched_rows, 9 * 2 * 28);
    assert_eq!(summary.staged_rows, 9 * 2 * 28);
    assert_eq!(summary.chart_path, config.output_path);
    assert!(std::fs::metadata(&config.output_path).unwrap().len() > 0);

    let store = StagingStore::open(&config.staging.db_path, &config.staging.table).unwrap();
    assert_eq!(store.select_all().unwrap().len(), 9 * 2 * 28);
}

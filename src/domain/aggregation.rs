// Aggregation engine - KPIs, pie breakdown, time buckets and failure rankings
use super::inspection::{format_timestamp, InspectionRecord, Status};
use serde::Serialize;
use std::collections::HashMap;

/// Default minute-precision bucket label pattern (dd.mm.yyyy hh:mm).
pub const DEFAULT_BUCKET_LABEL_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Machine,
    Product,
}

impl Dimension {
    fn key<'a>(&self, record: &'a InspectionRecord) -> &'a str {
        match self {
            Dimension::Machine => &record.machine_id,
            Dimension::Product => &record.product_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub yield_rate: f64,
    pub pass_percent: f64,
    pub fail_percent: f64,
}

impl Kpis {
    pub fn yield_label(&self) -> String {
        format_percent(self.yield_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub status: Status,
    pub count: usize,
    pub percent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    pub label: String,
    pub pass: usize,
    pub fail: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionAggregate {
    pub key: String,
    pub pass: usize,
    pub fail: usize,
    pub total: usize,
}

/// Entries of one dimension, worst first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionRanking {
    pub dimension: Dimension,
    pub entries: Vec<DimensionAggregate>,
}

impl DimensionRanking {
    pub fn top(&self) -> Option<&DimensionAggregate> {
        self.entries.first()
    }
}

/// Key to value association that iterates in first-insertion order.
#[derive(Debug)]
struct OrderedGroups<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> OrderedGroups<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry_or_insert_with(&mut self, key: &str, init: impl FnOnce() -> V) -> &mut V {
        let position = match self.index.get(key) {
            Some(&position) => position,
            None => {
                self.entries.push((key.to_string(), init()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].1
    }

    fn into_values(self) -> impl Iterator<Item = V> {
        self.entries.into_iter().map(|(_, value)| value)
    }
}

/// `round(numerator / denominator * 100, 1)`, `0.0` for an empty denominator.
pub fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let raw = numerator as f64 / denominator as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}", value)
}

pub fn kpis(records: &[InspectionRecord]) -> Kpis {
    let total = records.len();
    let pass_count = records.iter().filter(|r| r.is_pass()).count();
    let fail_count = total - pass_count;

    Kpis {
        total,
        pass_count,
        fail_count,
        yield_rate: percent(pass_count, total),
        pass_percent: percent(pass_count, total),
        fail_percent: percent(fail_count, total),
    }
}

pub fn pie_breakdown(kpis: &Kpis) -> [PieSlice; 2] {
    [
        PieSlice {
            status: Status::Pass,
            count: kpis.pass_count,
            percent: format_percent(percent(kpis.pass_count, kpis.total)),
        },
        PieSlice {
            status: Status::Fail,
            count: kpis.fail_count,
            percent: format_percent(percent(kpis.fail_count, kpis.total)),
        },
    ]
}

/// Bucket records per formatted minute, oldest bucket first.
///
/// `records` are expected newest-first as delivered by the source, so they
/// are walked in reverse and buckets keep first-seen order.
pub fn time_series(records: &[InspectionRecord], label_format: &str) -> Vec<TimeBucket> {
    let mut groups = OrderedGroups::new();

    for record in records.iter().rev() {
        let label = format_timestamp(&record.timestamp, label_format);
        let bucket = groups.entry_or_insert_with(&label, || TimeBucket {
            label: label.clone(),
            pass: 0,
            fail: 0,
        });
        match record.status() {
            Status::Pass => bucket.pass += 1,
            Status::Fail => bucket.fail += 1,
        }
    }

    groups.into_values().collect()
}

/// Group by `dimension` and rank by fail count descending, ties by key ascending.
pub fn dimension_ranking(records: &[InspectionRecord], dimension: Dimension) -> DimensionRanking {
    let mut groups = OrderedGroups::new();

    for record in records {
        let key = dimension.key(record);
        let aggregate = groups.entry_or_insert_with(key, || DimensionAggregate {
            key: key.to_string(),
            pass: 0,
            fail: 0,
            total: 0,
        });
        match record.status() {
            Status::Pass => aggregate.pass += 1,
            Status::Fail => aggregate.fail += 1,
        }
        aggregate.total += 1;
    }

    let mut entries: Vec<DimensionAggregate> = groups.into_values().collect();
    entries.sort_by(|a, b| b.fail.cmp(&a.fail).then_with(|| a.key.cmp(&b.key)));

    DimensionRanking { dimension, entries }
}

/// All derived views of one record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub kpis: Kpis,
    pub yield_label: String,
    pub pie: [PieSlice; 2],
    pub time_series: Vec<TimeBucket>,
    pub machines: DimensionRanking,
    pub products: DimensionRanking,
}

pub fn aggregate(records: &[InspectionRecord], label_format: &str) -> Aggregates {
    let kpis = kpis(records);
    Aggregates {
        yield_label: kpis.yield_label(),
        pie: pie_breakdown(&kpis),
        time_series: time_series(records, label_format),
        machines: dimension_ranking(records, Dimension::Machine),
        products: dimension_ranking(records, Dimension::Product),
        kpis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, status: &str, machine: &str, product: &str, ts: &str) -> InspectionRecord {
        InspectionRecord::new(id, status, machine, product, ts)
    }

    #[test]
    fn test_kpis_mixed_case_statuses() {
        let records = vec![
            record(1, "pass", "M1", "P1", "2024-05-01 10:00:00"),
            record(2, "FAIL", "M1", "P1", "2024-05-01 10:00:05"),
            record(3, "Pass", "M2", "P1", "2024-05-01 10:00:09"),
        ];
        let kpis = kpis(&records);

        assert_eq!(kpis.total, 3);
        assert_eq!(kpis.pass_count, 2);
        assert_eq!(kpis.fail_count, 1);
        assert_eq!(kpis.yield_label(), "66.7");
        assert_eq!(kpis.pass_count + kpis.fail_count, kpis.total);
    }

    #[test]
    fn test_unknown_status_counts_as_fail() {
        let records = vec![
            record(1, "", "M1", "P1", "2024-05-01 10:00:00"),
            record(2, "error", "M1", "P1", "2024-05-01 10:00:00"),
        ];
        let kpis = kpis(&records);
        assert_eq!(kpis.fail_count, 2);
        assert_eq!(kpis.yield_rate, 0.0);
    }

    #[test]
    fn test_empty_record_set() {
        let aggregates = aggregate(&[], DEFAULT_BUCKET_LABEL_FORMAT);

        assert_eq!(aggregates.kpis.total, 0);
        assert_eq!(aggregates.kpis.yield_rate, 0.0);
        assert_eq!(aggregates.pie[0].status, Status::Pass);
        assert_eq!(aggregates.pie[0].count, 0);
        assert_eq!(aggregates.pie[0].percent, "0.0");
        assert_eq!(aggregates.pie[1].status, Status::Fail);
        assert_eq!(aggregates.pie[1].count, 0);
        assert_eq!(aggregates.pie[1].percent, "0.0");
        assert!(aggregates.time_series.is_empty());
        assert!(aggregates.machines.entries.is_empty());
        assert!(aggregates.products.top().is_none());
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(3, 3), 100.0);
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(format_percent(percent(1, 8)), "12.5");
        assert_eq!(format_percent(100.0), "100.0");
    }

    #[test]
    fn test_same_minute_shares_one_bucket() {
        let records = vec![
            record(2, "FAIL", "M1", "P1", "2024-05-01 10:15:48"),
            record(1, "PASS", "M1", "P1", "2024-05-01 10:15:03"),
        ];
        let series = time_series(&records, DEFAULT_BUCKET_LABEL_FORMAT);

        assert_eq!(
            series,
            vec![TimeBucket {
                label: "01.05.2024 10:15".to_string(),
                pass: 1,
                fail: 1,
            }]
        );
    }

    #[test]
    fn test_buckets_are_chronological_for_newest_first_input() {
        let records = vec![
            record(4, "PASS", "M1", "P1", "2024-05-01 10:17:00"),
            record(3, "FAIL", "M1", "P1", "2024-05-01 10:16:30"),
            record(2, "PASS", "M1", "P1", "2024-05-01 10:16:10"),
            record(1, "PASS", "M1", "P1", "2024-05-01 10:15:00"),
        ];
        let series = time_series(&records, DEFAULT_BUCKET_LABEL_FORMAT);
        let labels: Vec<&str> = series.iter().map(|b| b.label.as_str()).collect();

        assert_eq!(
            labels,
            vec!["01.05.2024 10:15", "01.05.2024 10:16", "01.05.2024 10:17"]
        );
        assert_eq!(series[1].pass, 1);
        assert_eq!(series[1].fail, 1);
        let bucketed: usize = series.iter().map(|b| b.pass + b.fail).sum();
        assert_eq!(bucketed, records.len());
    }

    #[test]
    fn test_unparsable_timestamp_gets_raw_bucket() {
        let records = vec![
            record(2, "PASS", "M1", "P1", "2024-05-01 10:15:00"),
            record(1, "FAIL", "M1", "P1", "n/a"),
        ];
        let series = time_series(&records, DEFAULT_BUCKET_LABEL_FORMAT);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "n/a");
        assert_eq!(series[0].fail, 1);
        assert_eq!(series[1].label, "01.05.2024 10:15");
    }

    #[test]
    fn test_custom_label_format() {
        let records = vec![record(1, "PASS", "M1", "P1", "2024-05-01 10:15:00")];
        let series = time_series(&records, "%Y/%m/%d %H:%M");
        assert_eq!(series[0].label, "2024/05/01 10:15");
    }

    #[test]
    fn test_dimension_ranking_orders_by_fail_count() {
        let records = vec![
            record(1, "FAIL", "M2", "P1", "2024-05-01 10:00:00"),
            record(2, "PASS", "M1", "P2", "2024-05-01 10:00:00"),
            record(3, "FAIL", "M3", "P2", "2024-05-01 10:00:00"),
            record(4, "FAIL", "M3", "P2", "2024-05-01 10:00:00"),
            record(5, "FAIL", "M1", "P1", "2024-05-01 10:00:00"),
        ];
        let machines = dimension_ranking(&records, Dimension::Machine);

        let top = machines.top().unwrap();
        assert_eq!(top.key, "M3");
        assert_eq!(top.fail, 2);
        assert!(machines.entries.iter().all(|e| top.fail >= e.fail));
        assert!(machines.entries.iter().all(|e| e.pass + e.fail == e.total));

        // M1 and M2 tie on one failure each; ascending key breaks the tie
        let keys: Vec<&str> = machines.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["M3", "M1", "M2"]);

        let products = dimension_ranking(&records, Dimension::Product);
        assert_eq!(products.top().unwrap().key, "P1");
        assert_eq!(products.entries[1].total, 3);
    }
}

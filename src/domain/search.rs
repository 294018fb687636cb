// In-memory free text search over loaded history
use super::inspection::InspectionRecord;

/// Records whose id, status, machine, product or timestamp contain `query`
/// (case-insensitive). A blank query keeps everything.
pub fn filter_records<'a>(records: &'a [InspectionRecord], query: &str) -> Vec<&'a InspectionRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }

    records
        .iter()
        .filter(|record| record.search_text().to_lowercase().contains(&needle))
        .collect()
}

pub fn visible_count_label(visible: usize, total: usize) -> String {
    format!("{} / {}", visible, total)
}

//! URL extraction from raw search records

use super::types::RawResultRecord;

/// Collect the URLs of all records that carry one
///
/// Input order is preserved and duplicates are kept.
pub fn extract_urls(records: &[RawResultRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.usable_url())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_records_without_url() {
        let records = vec![
            RawResultRecord::new("a", "first", "test"),
            RawResultRecord::without_url("second", "test"),
            RawResultRecord::new("b", "third", "test"),
        ];
        assert_eq!(extract_urls(&records), vec!["a", "b"]);
    }

    #[test]
    fn test_keeps_duplicates_in_order() {
        let records = vec![
            RawResultRecord::new("https://x.example", "1", "test"),
            RawResultRecord::new("https://y.example", "2", "test"),
            RawResultRecord::new("https://x.example", "3", "test"),
        ];
        assert_eq!(
            extract_urls(&records),
            vec!["https://x.example", "https://y.example", "https://x.example"]
        );
    }

    #[test]
    fn test_no_urls() {
        let records = vec![
            RawResultRecord::without_url("first", "test"),
            RawResultRecord::new("", "second", "test"),
        ];
        assert!(extract_urls(&records).is_empty());
        assert!(extract_urls(&[]).is_empty());
    }
}

//! CSV input parsing
//!
//! Expected shape: a header row, then `video_link,creator_handle` data rows.
//! The creator handle and video id are taken from the link itself; rows whose
//! link does not match the expected URL pattern are skipped.

use brandlens_common::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::models::VideoRef;

static VIDEO_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://www\.tiktok\.com/@([^/]+)/video/(\d+)")
        .expect("video link pattern must compile")
});

/// Parse a video link into (handle, video id)
pub fn parse_video_link(link: &str) -> Option<(String, String)> {
    let captures = VIDEO_LINK_RE.captures(link.trim())?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

/// Outcome of a CSV parse
#[derive(Debug)]
pub struct CsvParseOutcome {
    pub records: Vec<VideoRef>,
    /// Rows skipped for being malformed (missing columns, bad link)
    pub skipped: usize,
}

/// Read video references from a CSV file
///
/// `max_records` truncates accepted records deterministically from the head.
pub fn parse_video_csv(path: &Path, max_records: Option<usize>) -> Result<CsvParseOutcome> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::InvalidInput(format!("Read CSV failed ({}): {}", path.display(), e)))?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (row_index, row) in reader.records().enumerate() {
        if let Some(cap) = max_records {
            if records.len() >= cap {
                break;
            }
        }

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(row = row_index + 1, error = %e, "Skipping unreadable CSV row");
                skipped += 1;
                continue;
            }
        };

        let link = row.get(0).unwrap_or("").trim();
        let handle_column = row.get(1).unwrap_or("").trim();
        if link.is_empty() || handle_column.is_empty() {
            tracing::warn!(row = row_index + 1, "Skipping CSV row with missing columns");
            skipped += 1;
            continue;
        }

        let Some((handle, video_id)) = parse_video_link(link) else {
            tracing::warn!(row = row_index + 1, link = %link, "Skipping CSV row with unparsable video link");
            skipped += 1;
            continue;
        };

        records.push(VideoRef {
            link: link.to_string(),
            handle,
            video_id,
        });
    }

    tracing::info!(
        path = %path.display(),
        accepted = records.len(),
        skipped,
        "CSV input parsed"
    );

    Ok(CsvParseOutcome { records, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_wellformed_rows() {
        let file = csv_file(
            "video_link,creator_handler\n\
             https://www.tiktok.com/@acme/video/111,acme\n\
             https://www.tiktok.com/@nat/video/222,nat\n",
        );

        let outcome = parse_video_csv(file.path(), None).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.records[0].handle, "acme");
        assert_eq!(outcome.records[0].video_id, "111");
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let file = csv_file(
            "video_link,creator_handler\n\
             https://www.tiktok.com/@acme/video/111,acme\n\
             not-a-link,whoever\n\
             ,missing\n\
             https://www.tiktok.com/@nat/video/222,nat\n",
        );

        let outcome = parse_video_csv(file.path(), None).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn max_records_truncates_from_the_head() {
        let file = csv_file(
            "video_link,creator_handler\n\
             https://www.tiktok.com/@a/video/1,a\n\
             https://www.tiktok.com/@b/video/2,b\n\
             https://www.tiktok.com/@c/video/3,c\n",
        );

        let outcome = parse_video_csv(file.path(), Some(2)).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].handle, "a");
        assert_eq!(outcome.records[1].handle, "b");
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = parse_video_csv(Path::new("/nonexistent/links.csv"), None).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.to_string().contains("/nonexistent/links.csv"));
    }

    #[test]
    fn link_pattern_extraction() {
        assert_eq!(
            parse_video_link("https://www.tiktok.com/@some.creator/video/7301234"),
            Some(("some.creator".to_string(), "7301234".to_string()))
        );
        assert_eq!(parse_video_link("https://example.com/watch?v=1"), None);
        assert_eq!(parse_video_link("https://www.tiktok.com/@handle/photo/1"), None);
    }
}

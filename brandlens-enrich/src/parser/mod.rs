//! Input record parsing
//!
//! Two input formats normalize into the pipeline's canonical records. Parsing
//! is tolerant: a malformed row or entry is skipped and counted, never fatal.
//! Only an unreadable file or an undecodable JSON document aborts the task.

mod csv_input;
mod json_input;

pub use csv_input::{parse_video_csv, CsvParseOutcome};
pub use json_input::{parse_creator_json, JsonParseOutcome, JsonShape};

use std::path::Path;

/// Declared input format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `video_link,creator_handle` rows
    Csv,
    /// Array of creator profile objects (nested or flat)
    Json,
}

impl InputFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Some(Self::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown input format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_inference_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a/creators.json")), Some(InputFormat::Json));
        assert_eq!(InputFormat::from_path(Path::new("links.CSV")), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(InputFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn format_parses_from_string() {
        assert_eq!("csv".parse::<InputFormat>(), Ok(InputFormat::Csv));
        assert_eq!("JSON".parse::<InputFormat>(), Ok(InputFormat::Json));
        assert!("xml".parse::<InputFormat>().is_err());
    }
}

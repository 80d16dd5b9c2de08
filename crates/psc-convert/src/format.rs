//! Series file format selection.
//!
//! The study's data-series files are delimited text: comma-separated for
//! `.csv`, tab-separated for `.tsv`. Any other flag is rejected up front,
//! before the pipeline touches the filesystem.

use std::fmt;
use std::str::FromStr;

use psc_core::{PscError, PscResult};

/// Output format for time-series files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeriesFormat {
    #[default]
    Csv,
    Tsv,
}

impl SeriesFormat {
    /// Parse a format flag. Accepts `.csv`/`.tsv` with or without the
    /// leading dot, case-insensitive.
    pub fn parse(flag: &str) -> PscResult<Self> {
        match flag.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(SeriesFormat::Csv),
            "tsv" => Ok(SeriesFormat::Tsv),
            _ => Err(PscError::UnsupportedFormat(flag.to_string())),
        }
    }

    /// File extension including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            SeriesFormat::Csv => ".csv",
            SeriesFormat::Tsv => ".tsv",
        }
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            SeriesFormat::Csv => b',',
            SeriesFormat::Tsv => b'\t',
        }
    }
}

impl FromStr for SeriesFormat {
    type Err = PscError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeriesFormat::parse(s)
    }
}

impl fmt::Display for SeriesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!(SeriesFormat::parse(".csv").unwrap(), SeriesFormat::Csv);
        assert_eq!(SeriesFormat::parse("tsv").unwrap(), SeriesFormat::Tsv);
        assert_eq!(SeriesFormat::parse(" .TSV ").unwrap(), SeriesFormat::Tsv);
    }

    #[test]
    fn rejects_unknown_formats() {
        let err = SeriesFormat::parse(".parquet").unwrap_err();
        assert!(matches!(err, PscError::UnsupportedFormat(_)));
        assert!(SeriesFormat::parse("").is_err());
    }

    #[test]
    fn delimiters_match_extension() {
        assert_eq!(SeriesFormat::Csv.delimiter(), b',');
        assert_eq!(SeriesFormat::Tsv.delimiter(), b'\t');
        assert_eq!(SeriesFormat::Tsv.extension(), ".tsv");
    }
}

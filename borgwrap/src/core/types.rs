//! Engine JSON documents consumed by borgwrap.
//!
//! Only the fields borgwrap reads are modelled; everything else in the engine output is
//! ignored. Missing fields fall back to defaults so older engines still parse.

use serde::Deserialize;

/// Output of `borg info --json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InfoDocument {
    #[serde(default)]
    pub archives: Vec<ArchiveInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArchiveInfo {
    #[serde(default)]
    pub name: String,
    /// Local start time, `YYYY-MM-DDTHH:MM:SS.ffffff`.
    #[serde(default)]
    pub start: String,
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub stats: ArchiveStats,
}

/// Per-archive sizes in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArchiveStats {
    #[serde(default)]
    pub original_size: u64,
    #[serde(default)]
    pub compressed_size: u64,
    #[serde(default)]
    pub deduplicated_size: u64,
    #[serde(default)]
    pub nfiles: u64,
}

impl InfoDocument {
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_info_output_and_ignores_extra_fields() {
        let doc = InfoDocument::parse(
            r#"{
                "repository": {"id": "abc", "location": "/repo"},
                "archives": [{
                    "name": "host-2024-01-02T03:04:05Z",
                    "start": "2024-01-02T03:04:05.123456",
                    "duration": 12.5,
                    "stats": {
                        "original_size": 2048,
                        "compressed_size": 1024,
                        "deduplicated_size": 512,
                        "nfiles": 3
                    },
                    "command_line": ["borg", "create"]
                }]
            }"#,
        )
        .expect("parse");
        let archive = &doc.archives[0];
        assert_eq!(archive.name, "host-2024-01-02T03:04:05Z");
        assert_eq!(archive.stats.original_size, 2048);
        assert_eq!(archive.stats.nfiles, 3);
        assert!((archive.duration - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_archives_is_empty() {
        let doc = InfoDocument::parse(r#"{"repository": {}}"#).expect("parse");
        assert!(doc.archives.is_empty());
    }
}

//! Seam to the AI label-extraction service.
//!
//! The service itself lives outside this codebase; the backend's only
//! obligations are to hand it image URLs and to merge whatever partial
//! fields come back into the draft without trampling user-locked fields.

use axum::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    FullScan,
    Rescan,
}

/// Partial record fields returned by an extraction pass, keyed by column
/// name. Only the fields the scanner could read are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFields(pub Map<String, Value>);

#[async_trait]
pub trait ExtractionClient: Send + Sync {
    async fn process(&self, image_urls: &[String], mode: ScanMode)
        -> anyhow::Result<ExtractedFields>;
}

/// Stand-in while the extraction service is not wired up: every scan comes
/// back empty, so a rescan merge is a no-op.
pub struct DisabledExtraction;

#[async_trait]
impl ExtractionClient for DisabledExtraction {
    async fn process(
        &self,
        _image_urls: &[String],
        _mode: ScanMode,
    ) -> anyhow::Result<ExtractedFields> {
        Ok(ExtractedFields::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_extraction_returns_no_fields() {
        let client = DisabledExtraction;
        let fields = client
            .process(&["https://img.local/front.jpg".into()], ScanMode::Rescan)
            .await
            .unwrap();
        assert!(fields.0.is_empty());
    }

    #[test]
    fn scan_mode_wire_format() {
        assert_eq!(
            serde_json::to_string(&ScanMode::FullScan).unwrap(),
            "\"full-scan\""
        );
        assert_eq!(serde_json::to_string(&ScanMode::Rescan).unwrap(), "\"rescan\"");
    }
}

use serde::{Deserialize, Serialize};

use crate::snippet::ContractError;

/// Manifest file written next to the `samples/` directory.
pub const MANIFEST_FILE: &str = "dataset_info.csv";
/// Subdirectory of the dataset root holding one CSV per snippet.
pub const SAMPLES_SUBDIR: &str = "samples";

/// One manifest row, identifying a snippet file on disk.
///
/// Extra columns (such as the leading `sample_index`) are ignored when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetRecord {
    pub effect_name: String,
    pub start_timestamp: String,
    pub snippet_number: u32,
}

impl SnippetRecord {
    pub fn new(
        effect_name: impl Into<String>,
        start_timestamp: impl Into<String>,
        snippet_number: u32,
    ) -> Self {
        Self {
            effect_name: effect_name.into(),
            start_timestamp: start_timestamp.into(),
            snippet_number,
        }
    }

    /// `{effect_name}_{start_timestamp}_{snippet_number}`
    pub fn sample_name(&self) -> String {
        format!(
            "{}_{}_{}",
            self.effect_name, self.start_timestamp, self.snippet_number
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.sample_name())
    }

    /// The sample name must split back into exactly three `_`-separated parts.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.effect_name.trim().is_empty() {
            return Err(ContractError::EmptyField("effect_name"));
        }
        if self.effect_name.contains('_') {
            return Err(ContractError::Separator {
                field: "effect_name",
                value: self.effect_name.clone(),
            });
        }
        if self.start_timestamp.trim().is_empty() {
            return Err(ContractError::EmptyField("start_timestamp"));
        }
        if self.start_timestamp.contains('_') {
            return Err(ContractError::Separator {
                field: "start_timestamp",
                value: self.start_timestamp.clone(),
            });
        }
        if self.snippet_number == 0 {
            return Err(ContractError::SnippetNumber);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_name_joins_fields() {
        let rec = SnippetRecord::new("bounce", "2024-05-01 12:00:00", 3);
        assert_eq!(rec.sample_name(), "bounce_2024-05-01 12:00:00_3");
        assert_eq!(rec.file_name(), "bounce_2024-05-01 12:00:00_3.csv");
    }

    #[test]
    fn zero_snippet_number_rejected() {
        let rec = SnippetRecord::new("bounce", "2024-05-01 12:00:00", 0);
        assert!(matches!(rec.validate(), Err(ContractError::SnippetNumber)));
    }
}

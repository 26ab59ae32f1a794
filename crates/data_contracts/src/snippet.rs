use thiserror::Error;

/// Number of frames per snippet unless configured otherwise.
pub const DEFAULT_SAMPLE_LENGTH: usize = 150;
/// Elapsed seconds since the start of the source recording.
pub const TIME_COLUMN: &str = "time_s";
/// Absolute wall-clock column present only in raw recordings.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Columns starting with this prefix carry the human input (condition).
pub const HUMAN_INPUT_PREFIX: &str = "mouse";
/// Columns starting with this prefix carry the animation (target).
pub const ANIMATION_PREFIX: &str = "flower";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{field} must not contain '_': {value:?}")]
    Separator { field: &'static str, value: String },
    #[error("snippet_number starts at 1")]
    SnippetNumber,
    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error("no columns with prefix {0:?}")]
    EmptyChannelGroup(&'static str),
}

/// Column layout of a snippet file, resolved from its header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetColumns {
    pub time: usize,
    pub human_input: Vec<usize>,
    pub animation: Vec<usize>,
}

impl SnippetColumns {
    /// Resolve the time column and both channel groups. Headers are matched after trimming.
    pub fn classify<S: AsRef<str>>(headers: &[S]) -> Result<Self, ContractError> {
        let mut time = None;
        let mut human_input = Vec::new();
        let mut animation = Vec::new();
        for (idx, raw) in headers.iter().enumerate() {
            let name = raw.as_ref().trim();
            if name == TIME_COLUMN {
                time = Some(idx);
            } else if name.starts_with(HUMAN_INPUT_PREFIX) {
                human_input.push(idx);
            } else if name.starts_with(ANIMATION_PREFIX) {
                animation.push(idx);
            }
        }
        let time = time.ok_or(ContractError::MissingColumn(TIME_COLUMN))?;
        if human_input.is_empty() {
            return Err(ContractError::EmptyChannelGroup(HUMAN_INPUT_PREFIX));
        }
        if animation.is_empty() {
            return Err(ContractError::EmptyChannelGroup(ANIMATION_PREFIX));
        }
        Ok(Self {
            time,
            human_input,
            animation,
        })
    }

    pub fn human_channels(&self) -> usize {
        self.human_input.len()
    }

    pub fn animation_channels(&self) -> usize {
        self.animation.len()
    }
}

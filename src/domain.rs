use derive_setters::Setters;
use polars::error::PolarsError;
use std::fmt;
use std::io::Error;
use std::path::PathBuf;

pub const DEFAULT_TITLE: &str = "Political Survey in Jharkhand 2024";

pub const HELP_TEXT: &str = "\
Tab / BackTab   focus next / previous filter
Up, k / Down, j move inside the filter
Space / Enter   toggle the value under the cursor
c               clear the focused filter
x               clear all filters
v               cycle table (filtered / interested / survey)
PgUp / PgDown   scroll the table
g / G           jump to first / last row
d               download the table shown as CSV
e               download all CSV exports
y               copy the selected row to the clipboard
r               reload records from the source
?               show this help
Esc             close popup
q               quit";

#[derive(Debug)]
pub enum SurveyError {
    IoError(Error),
    PolarsError(PolarsError),
    JsonError(serde_json::Error),
    LoadingFailed(String),
    ExportFailed(String),
    FileNotFound,
    PermissionDenied,
}

impl fmt::Display for SurveyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveyError::IoError(e) => write!(f, "io error: {e}"),
            SurveyError::PolarsError(e) => write!(f, "polars error: {e}"),
            SurveyError::JsonError(e) => write!(f, "malformed document: {e}"),
            SurveyError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            SurveyError::ExportFailed(msg) => write!(f, "export failed: {msg}"),
            SurveyError::FileNotFound => write!(f, "record source not found"),
            SurveyError::PermissionDenied => write!(f, "permission denied on record source"),
        }
    }
}

impl std::error::Error for SurveyError {}

impl From<Error> for SurveyError {
    fn from(err: Error) -> Self {
        SurveyError::IoError(err)
    }
}

impl From<PolarsError> for SurveyError {
    fn from(err: PolarsError) -> Self {
        SurveyError::PolarsError(err)
    }
}

impl From<serde_json::Error> for SurveyError {
    fn from(err: serde_json::Error) -> Self {
        SurveyError::JsonError(err)
    }
}

/// The fixed column set every survey table carries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurveyColumn {
    Name,
    Number,
    AgeGroup,
    Gender,
    Occupation,
    Constituency,
    Interested,
    AdditionalComments,
}

impl SurveyColumn {
    pub const ALL: [SurveyColumn; 8] = [
        SurveyColumn::Name,
        SurveyColumn::Number,
        SurveyColumn::AgeGroup,
        SurveyColumn::Gender,
        SurveyColumn::Occupation,
        SurveyColumn::Constituency,
        SurveyColumn::Interested,
        SurveyColumn::AdditionalComments,
    ];

    /// Field name in the source documents, also used as the CSV header.
    pub fn name(&self) -> &'static str {
        match self {
            SurveyColumn::Name => "Name",
            SurveyColumn::Number => "Number",
            SurveyColumn::AgeGroup => "Age Group",
            SurveyColumn::Gender => "Gender",
            SurveyColumn::Occupation => "Occupation",
            SurveyColumn::Constituency => "Constituency",
            SurveyColumn::Interested => "Interested",
            SurveyColumn::AdditionalComments => "Additional Comments",
        }
    }

    pub fn idx(&self) -> usize {
        *self as usize
    }
}

/// The four sidebar filters, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterColumn {
    Constituency,
    Occupation,
    AgeGroup,
    Gender,
}

impl FilterColumn {
    pub const CASCADE: [FilterColumn; 4] = [
        FilterColumn::Constituency,
        FilterColumn::Occupation,
        FilterColumn::AgeGroup,
        FilterColumn::Gender,
    ];

    pub fn column(&self) -> SurveyColumn {
        match self {
            FilterColumn::Constituency => SurveyColumn::Constituency,
            FilterColumn::Occupation => SurveyColumn::Occupation,
            FilterColumn::AgeGroup => SurveyColumn::AgeGroup,
            FilterColumn::Gender => SurveyColumn::Gender,
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            FilterColumn::Constituency => "Pick your Constituency",
            FilterColumn::Occupation => "Pick the Occupation",
            FilterColumn::AgeGroup => "Pick the Age Group",
            FilterColumn::Gender => "Pick the Gender",
        }
    }

    pub fn idx(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Self {
        Self::CASCADE[(self.idx() + 1) % Self::CASCADE.len()]
    }

    pub fn previous(&self) -> Self {
        Self::CASCADE[(self.idx() + Self::CASCADE.len() - 1) % Self::CASCADE.len()]
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct DashboardConfig {
    pub title: String,
    pub source: PathBuf,
    pub export_dir: PathBuf,
    pub event_poll_time: u64,
    pub max_column_width: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            source: PathBuf::new(),
            export_dir: PathBuf::from("."),
            event_poll_time: 100,
            max_column_width: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    FocusNext,
    FocusPrevious,
    MoveUp,
    MoveDown,
    ToggleOption,
    ClearSelection,
    ClearAllSelections,
    CycleTableView,
    ScrollUp,
    ScrollDown,
    ScrollBeginning,
    ScrollEnd,
    Download,
    DownloadAll,
    CopyRow,
    Reload,
    Resize(usize, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_wraps_around_the_cascade() {
        assert_eq!(FilterColumn::Gender.next(), FilterColumn::Constituency);
        assert_eq!(FilterColumn::Constituency.previous(), FilterColumn::Gender);
        assert_eq!(FilterColumn::Occupation.next(), FilterColumn::AgeGroup);
    }

    #[test]
    fn filter_columns_map_onto_survey_columns() {
        assert_eq!(FilterColumn::AgeGroup.column().name(), "Age Group");
        assert_eq!(SurveyColumn::ALL[SurveyColumn::Constituency.idx()], SurveyColumn::Constituency);
    }

    #[test]
    fn config_setters_chain() {
        let cfg = DashboardConfig::default()
            .with_event_poll_time(250)
            .with_title("Survey".to_string());
        assert_eq!(cfg.event_poll_time, 250);
        assert_eq!(cfg.title, "Survey");
        assert_eq!(cfg.export_dir, PathBuf::from("."));
    }
}

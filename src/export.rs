use polars::prelude::{Column as PlColumn, CsvWriter, DataFrame, SerWriter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::SurveyError;
use crate::table::Table;

pub const CSV_MIME: &str = "text/csv";

/// The places in the dashboard that offer a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSite {
    SurveyData,
    ConstituencyData,
    InterestedConstituencyData,
}

impl ExportSite {
    pub const ALL: [ExportSite; 3] = [
        ExportSite::ConstituencyData,
        ExportSite::InterestedConstituencyData,
        ExportSite::SurveyData,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportSite::SurveyData => "Data.csv",
            ExportSite::ConstituencyData => "Constituency_Data.csv",
            ExportSite::InterestedConstituencyData => "Interested_Constituency_Data.csv",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ExportSite::SurveyData => "Survey Data",
            ExportSite::ConstituencyData => "Constituency Data",
            ExportSite::InterestedConstituencyData => "Constituency Interested Data",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub content: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into `dir`, returning the final path.
    pub fn download(&self, dir: &Path) -> Result<PathBuf, SurveyError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name);
        fs::write(&path, &self.content)?;
        info!("Saved {} ({} bytes)", path.display(), self.content.len());
        Ok(path)
    }
}

/// Build a DataFrame of the given rows, fixed columns, no index column.
pub fn to_dataframe(table: &Table, rows: &[usize]) -> Result<DataFrame, SurveyError> {
    let columns: Vec<PlColumn> = table
        .columns()
        .iter()
        .map(|c| {
            let values: Vec<Option<String>> = rows.iter().map(|&r| c.data[r].clone()).collect();
            PlColumn::new(c.name().into(), values)
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

pub fn to_csv(table: &Table, rows: &[usize]) -> Result<Vec<u8>, SurveyError> {
    let mut df = to_dataframe(table, rows)?;
    let mut buf: Vec<u8> = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    debug!("Serialized {} rows into {} bytes of csv", rows.len(), buf.len());
    Ok(buf)
}

pub fn export(
    table: &Table,
    rows: &[usize],
    site: ExportSite,
) -> Result<ExportArtifact, SurveyError> {
    Ok(ExportArtifact {
        file_name: site.file_name(),
        mime: CSV_MIME,
        content: to_csv(table, rows)?,
    })
}

use rayon::prelude::*;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::SurveyColumn;
use crate::source::{Document, stringify_id};

pub struct Column {
    pub kind: SurveyColumn,
    pub data: Vec<Option<String>>,
    pub max_width: usize,
}

impl Column {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn as_string(&self) -> String {
        format!(
            "{} \"{}\", width_max: {}, # rows {}, # null {}",
            self.kind.idx(),
            self.name(),
            self.max_width,
            self.data.len(),
            self.data.iter().filter(|v| v.is_none()).count(),
        )
    }
}

/// Survey records projected onto the fixed column set.
pub struct Table {
    ids: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Project raw documents onto the fixed columns, one column per rayon task.
    /// Unknown fields are ignored, missing ones become null.
    pub fn project(documents: &[Document]) -> Self {
        let start_time = Instant::now();

        let columns: Vec<Column> = SurveyColumn::ALL
            .par_iter()
            .map(|&kind| Self::project_column(documents, kind))
            .collect();
        let ids = documents.iter().map(|d| stringify_id(d.get("_id"))).collect();

        info!(
            "Projected {} records in {}ms",
            documents.len(),
            start_time.elapsed().as_millis()
        );
        for c in columns.iter() {
            debug!("Column: {}", c.as_string());
        }
        Self { ids, columns }
    }

    fn project_column(documents: &[Document], kind: SurveyColumn) -> Column {
        let mut data = Vec::with_capacity(documents.len());
        let mut max_width = 0;
        for doc in documents {
            let value = match doc.get(kind.name()) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            };
            if let Some(s) = &value {
                max_width = std::cmp::max(max_width, s.chars().count());
            }
            data.push(value);
        }
        Column {
            kind,
            data,
            max_width,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, kind: SurveyColumn) -> &Column {
        &self.columns[kind.idx()]
    }

    pub fn value(&self, kind: SurveyColumn, row: usize) -> Option<&str> {
        self.columns[kind.idx()].data[row].as_deref()
    }

    pub fn id(&self, row: usize) -> &str {
        &self.ids[row]
    }

    pub fn all_rows(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }
}

use serde_json::{Value, json};

use crate::domain::SurveyError;
use crate::source::{Document, RecordSource};
use crate::table::Table;

/// Fixed set of documents handed out on every fetch.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    documents: Vec<Document>,
}

impl StaticSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

impl RecordSource for StaticSource {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn fetch_all(&self) -> Result<Vec<Document>, SurveyError> {
        Ok(self.documents.clone())
    }
}

fn doc(v: Value) -> Document {
    match v {
        Value::Object(m) => m,
        _ => unreachable!("fixtures are objects"),
    }
}

pub fn survey_documents() -> Vec<Document> {
    vec![
        doc(json!({"_id": {"$oid": "0001"}, "Name": "Asha", "Number": "9000000001", "Age Group": "18-25", "Gender": "F", "Occupation": "Farmer", "Constituency": "Ranchi", "Interested": "Yes", "Additional Comments": "Roads, water"})),
        doc(json!({"_id": {"$oid": "0002"}, "Name": "Ravi", "Number": "9000000002", "Age Group": "26-35", "Gender": "M", "Occupation": "Teacher", "Constituency": "Dhanbad", "Interested": "No", "Additional Comments": ""})),
        doc(json!({"_id": {"$oid": "0003"}, "Name": "Priya", "Number": "9000000003", "Age Group": "18-25", "Gender": "F", "Occupation": "Teacher", "Constituency": "Ranchi", "Interested": "Yes", "Additional Comments": "Needs \"better\" schools"})),
        doc(json!({"_id": {"$oid": "0004"}, "Name": "Sunil", "Number": 9000000004u64, "Age Group": "26-35", "Gender": "M", "Occupation": "Farmer", "Constituency": "Dumka", "Interested": "yes"})),
        doc(json!({"_id": {"$oid": "0005"}, "Name": "Meena", "Number": "9000000005", "Age Group": "46-60", "Gender": "F", "Occupation": "Farmer", "Constituency": "Ranchi", "Interested": "Yes", "Additional Comments": "Irrigation\nand power"})),
        doc(json!({"_id": {"$oid": "0006"}, "Name": "Kiran", "Number": "9000000006", "Age Group": "36-45", "Gender": "M", "Occupation": "Shopkeeper", "Constituency": "Dumka", "Interested": "No"})),
        doc(json!({"_id": {"$oid": "0007"}, "Name": "Anon", "Gender": "M", "Unrelated": 1})),
    ]
}

/// Seven records over three constituencies, one of them missing most fields.
pub fn survey_table() -> Table {
    Table::project(&survey_documents())
}

pub fn scenario_documents() -> Vec<Document> {
    vec![
        doc(json!({"Constituency": "A", "Occupation": "X", "Age Group": "18-25", "Gender": "M", "Interested": "Yes"})),
        doc(json!({"Constituency": "A", "Occupation": "Y", "Age Group": "26-35", "Gender": "F", "Interested": "No"})),
    ]
}

pub fn scenario_table() -> Table {
    Table::project(&scenario_documents())
}

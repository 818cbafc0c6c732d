//! Timetable service wire types

use serde::Deserialize;
use weekplan_domain::{Subject, TeacherRef};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SubjectsResponse {
    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SubjectRecord {
    #[serde(rename = "SubjectID")]
    pub subject_id: String,
    #[serde(default)]
    pub subject_name: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(rename = "TeacherID", default)]
    pub teacher_id: String,
}

impl SubjectRecord {
    pub fn into_entry(self) -> (String, Subject) {
        let subject = Subject {
            name: self.subject_name,
            teacher: TeacherRef { name: self.teacher_name, id: self.teacher_id },
        };
        (self.subject_id.trim().to_string(), subject)
    }
}

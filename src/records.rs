//! Typed records consumed by the report pipeline. They mirror the JSON documents
//! served by the data API, every field which might be absent is explicitly optional
//! and defaults to its empty state.

use serde::{Deserialize, Serialize};

use crate::error::{ContextError, ErrorKind};

/// The kinds of report which can be generated.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ReportType {
    /// Technical competences tracking of one student.
    Technical,
    /// Soft skills and attendance tracking of one student.
    Transversal,
    /// The charter of a promotion.
    Charter,
    /// The technical description of the program followed by a promotion.
    TechnicalDescription,
    /// The projects handed in by one student.
    ProjectReport,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Technical,
        ReportType::Transversal,
        ReportType::Charter,
        ReportType::TechnicalDescription,
        ReportType::ProjectReport,
    ];

    /// The identifier of the report type, also used as the prefix of the generated filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Technical => "technical",
            ReportType::Transversal => "transversal",
            ReportType::Charter => "charter",
            ReportType::TechnicalDescription => "technicalDescription",
            ReportType::ProjectReport => "projectReport",
        }
    }

    /// Whether one document is generated per student rather than one for the whole promotion.
    pub fn is_per_subject(&self) -> bool {
        matches!(
            self,
            ReportType::Technical | ReportType::Transversal | ReportType::ProjectReport
        )
    }

    /// The title printed in the header of the report.
    pub fn title(&self) -> &'static str {
        match self {
            ReportType::Technical => "Technical tracking",
            ReportType::Transversal => "Transversal tracking",
            ReportType::Charter => "Program charter",
            ReportType::TechnicalDescription => "Technical description",
            ReportType::ProjectReport => "Project report",
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReportType {
    type Err = ContextError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ReportType::ALL
            .into_iter()
            .find(|report_type| report_type.as_str().eq_ignore_ascii_case(value))
            .ok_or(
                ContextError::with_context(format!("The report type {:?} is not supported", value))
                    .of_kind(ErrorKind::InvalidRequest),
            )
    }
}

/// A request for the generation of one or more reports, triggered by the user.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub report_type: ReportType,
    /// The students the reports are generated for, in the order they are to be generated.
    #[serde(default)]
    pub subject_ids: Vec<String>,
    /// The promotion the subjects belong to.
    pub context_id: String,
}

impl ReportRequest {
    /// Checks that per-subject reports name at least one subject.
    pub fn validate(&self) -> Result<(), ContextError> {
        if self.report_type.is_per_subject() && self.subject_ids.is_empty() {
            return Err(ContextError::with_context(format!(
                "The {} report needs at least one student",
                self.report_type
            ))
            .of_kind(ErrorKind::InvalidRequest));
        }
        if self.context_id.trim().is_empty() {
            return Err(
                ContextError::with_context("The report request names no promotion")
                    .of_kind(ErrorKind::InvalidRequest),
            );
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub promotion_id: Option<String>,
    #[serde(default)]
    pub technical_tracking: TechnicalTracking,
    #[serde(default)]
    pub transversal_tracking: TransversalTracking,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Student {
    /// The full name of the student, `None` when neither the first nor the last name is known.
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalTracking {
    #[serde(default)]
    pub competences: Vec<CompetenceAssessment>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompetenceAssessment {
    pub competence: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub level: Option<CompetenceLevel>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CompetenceLevel {
    NotAcquired,
    InProgress,
    Acquired,
    Mastered,
}

impl CompetenceLevel {
    pub fn label(&self) -> &'static str {
        match self {
            CompetenceLevel::NotAcquired => "Not acquired",
            CompetenceLevel::InProgress => "In progress",
            CompetenceLevel::Acquired => "Acquired",
            CompetenceLevel::Mastered => "Mastered",
        }
    }

    /// Whether the competence counts as validated.
    pub fn is_validated(&self) -> bool {
        matches!(self, CompetenceLevel::Acquired | CompetenceLevel::Mastered)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransversalTracking {
    #[serde(default)]
    pub skills: Vec<SkillAssessment>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillAssessment {
    pub skill: String,
    /// A rating between 0 and 5.
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub date: String,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Excused => "Excused",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub submitted_on: Option<String>,
    /// A grade out of 20.
    #[serde(default)]
    pub grade: Option<f32>,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub teachers: Vec<String>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub competences: Vec<String>,
}

/// The extended information about the program followed by a promotion.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInfo {
    pub promotion_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub evaluation_methods: Vec<String>,
    #[serde(default)]
    pub charter_rules: Vec<String>,
    #[serde(default)]
    pub technical_stack: Vec<Technology>,
    #[serde(default)]
    pub total_hours: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Technology {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_with_only_an_identifier_is_accepted() {
        let student: Student = serde_json::from_str(r#"{ "id": "s-1" }"#).unwrap();

        assert_eq!(student.id, "s-1");
        assert!(student.full_name().is_none());
        assert!(student.technical_tracking.competences.is_empty());
        assert!(student.attendance.is_empty());
    }

    #[test]
    fn student_records_use_camel_case() {
        let student: Student = serde_json::from_str(
            r#"{
                "id": "s-2",
                "firstName": "Jane",
                "lastName": "Doe",
                "technicalTracking": {
                    "competences": [
                        { "competence": "SQL", "level": "inProgress" }
                    ]
                },
                "attendance": [{ "date": "2026-09-01", "status": "late" }]
            }"#,
        )
        .unwrap();

        assert_eq!(student.full_name().as_deref(), Some("Jane Doe"));
        assert_eq!(
            student.technical_tracking.competences[0].level,
            Some(CompetenceLevel::InProgress)
        );
        assert_eq!(student.attendance[0].status, AttendanceStatus::Late);
    }

    #[test]
    fn report_types_parse_from_their_identifiers() {
        for report_type in ReportType::ALL {
            assert_eq!(report_type.as_str().parse::<ReportType>().unwrap(), report_type);
        }
        assert!("weekly".parse::<ReportType>().is_err());
    }

    #[test]
    fn per_subject_requests_need_subjects() {
        let mut request = ReportRequest {
            report_type: ReportType::Technical,
            subject_ids: Vec::new(),
            context_id: "p-1".into(),
        };
        assert_eq!(
            request.validate().unwrap_err().kind,
            ErrorKind::InvalidRequest
        );

        request.report_type = ReportType::Charter;
        assert!(request.validate().is_ok());
    }
}

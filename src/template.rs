//! Construction of the report fragments. A fragment is a self-contained block of
//! XHTML-compatible markup: every tag is balanced, void elements are self-closed and
//! every interpolated string is escaped, so that the layout renderer can parse it
//! strictly. Sections are always emitted, missing data is replaced by a placeholder
//! so that the shape of the fragment stays predictable.

use time::macros::format_description;
use time::Date;

use crate::records::{
    AttendanceStatus, CompetenceLevel, ProgramInfo, Promotion, ReportType, Student,
};

/// Shown in place of missing identifying fields.
pub const MISSING: &str = "—";

/// A fragment ready to be rendered, together with the name of the file it ends up in.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableDocument {
    pub html_content: String,
    pub filename: String,
    pub title: String,
}

/// The records a report is built from.
#[derive(Debug, Clone, Copy)]
pub struct ReportData<'a> {
    pub promotion: &'a Promotion,
    /// Present for the per-subject reports.
    pub student: Option<&'a Student>,
    /// Present for the cohort-level reports.
    pub program_info: Option<&'a ProgramInfo>,
}

/// Build the document of the given report type. The builder never fails: records
/// lacking the data a report needs are rendered with placeholders.
pub fn build_document(report_type: ReportType, data: &ReportData, today: Date) -> RenderableDocument {
    let subject_name = subject_name(report_type, data);
    let html_content = build_fragment(report_type, data, today);

    RenderableDocument {
        html_content,
        filename: report_filename(report_type, &subject_name, "pdf"),
        title: format!("{} - {}", report_type.title(), subject_name),
    }
}

/// The name the report is about: the student for per-subject reports, the promotion otherwise.
pub fn subject_name(report_type: ReportType, data: &ReportData) -> String {
    match (report_type.is_per_subject(), data.student) {
        (true, Some(student)) => student.full_name().unwrap_or_else(|| student.id.clone()),
        _ => data
            .promotion
            .name
            .clone()
            .unwrap_or_else(|| data.promotion.id.clone()),
    }
}

/// The filename of a report, `<reportType>_<Subject-Name>.<extension>`.
pub fn report_filename(report_type: ReportType, subject_name: &str, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        report_type.as_str(),
        sanitize_file_stem(subject_name),
        extension
    )
}

/// Replace the whitespace runs by hyphens and drop the characters which are not
/// allowed in filenames on common platforms.
fn sanitize_file_stem(name: &str) -> String {
    let stem = name
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|character| {
                    !character.is_control()
                        && !matches!(
                            character,
                            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'
                        )
                })
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        "unnamed".to_string()
    } else {
        stem
    }
}

/// Build the fragment of the given report type.
pub fn build_fragment(report_type: ReportType, data: &ReportData, today: Date) -> String {
    let mut fragment = Fragment::default();
    fragment.open("div", Some("report"));
    write_header(&mut fragment, report_type, data, today);

    match report_type {
        ReportType::Technical => write_technical(&mut fragment, data),
        ReportType::Transversal => write_transversal(&mut fragment, data),
        ReportType::ProjectReport => write_project_report(&mut fragment, data),
        ReportType::Charter => write_charter(&mut fragment, data),
        ReportType::TechnicalDescription => write_technical_description(&mut fragment, data),
    }

    write_footer(&mut fragment, report_type, data, today);
    fragment.close("div");
    fragment.html
}

/// Escape the characters with a meaning in markup. Control characters other
/// than line feeds and tabulations are dropped as they can't appear in the fragment.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '\n' | '\t' => escaped.push(character),
            character if character.is_control() => {}
            character => escaped.push(character),
        }
    }
    escaped
}

/// Format a date the way it is printed on the reports, `DD/MM/YYYY`.
pub fn format_date(date: Date) -> String {
    date.format(format_description!("[day]/[month]/[year]"))
        .unwrap_or_else(|_| date.to_string())
}

/// A cell of a table, with an optional class.
struct Cell {
    text: String,
    class: Option<&'static str>,
}

impl Cell {
    fn text<S: Into<String>>(text: S) -> Self {
        Cell {
            text: text.into(),
            class: None,
        }
    }

    fn with_class<S: Into<String>>(text: S, class: &'static str) -> Self {
        Cell {
            text: text.into(),
            class: Some(class),
        }
    }

    /// The value if present and not blank, a muted placeholder otherwise.
    fn or_placeholder(value: Option<&str>, placeholder: &str) -> Self {
        match value.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => Cell::text(value),
            None => Cell::with_class(placeholder, "placeholder"),
        }
    }
}

/// Accumulates the markup of a fragment, the helpers always emit balanced tags.
#[derive(Default)]
struct Fragment {
    html: String,
}

impl Fragment {
    fn open(&mut self, tag: &str, class: Option<&str>) {
        match class {
            Some(class) => self.html.push_str(&format!("<{} class=\"{}\">", tag, class)),
            None => self.html.push_str(&format!("<{}>", tag)),
        }
    }

    fn close(&mut self, tag: &str) {
        self.html.push_str(&format!("</{}>", tag));
    }

    fn element(&mut self, tag: &str, class: Option<&str>, text: &str) {
        self.open(tag, class);
        self.html.push_str(&escape_html(text));
        self.close(tag);
    }

    /// A paragraph made of a bold label followed by a value.
    fn labelled(&mut self, class: Option<&str>, label: &str, value: &str) {
        self.open("p", class);
        self.element("strong", None, label);
        self.html.push(' ');
        self.html.push_str(&escape_html(value));
        self.close("p");
    }

    fn heading(&mut self, title: &str) {
        self.element("h2", None, title);
    }

    fn placeholder(&mut self, message: &str) {
        self.element("p", Some("placeholder"), message);
    }

    /// A paragraph with the given text, or the placeholder when the text is missing or blank.
    fn paragraph_or_placeholder(&mut self, text: Option<&str>, placeholder: &str) {
        match text.map(str::trim).filter(|text| !text.is_empty()) {
            Some(text) => self.element("p", None, text),
            None => self.placeholder(placeholder),
        }
    }

    fn list_or_placeholder(&mut self, items: &[String], placeholder: &str) {
        if items.is_empty() {
            self.placeholder(placeholder);
            return;
        }
        self.open("ul", None);
        for item in items {
            self.element("li", None, item);
        }
        self.close("ul");
    }

    /// A table with a header row. Columns given a width take that percentage of the
    /// table, the other ones share the rest. When there are no rows the placeholder
    /// is rendered instead of an empty table.
    fn table_or_placeholder(
        &mut self,
        columns: &[(&str, Option<u8>)],
        rows: Vec<Vec<Cell>>,
        placeholder: &str,
    ) {
        if rows.is_empty() {
            self.placeholder(placeholder);
            return;
        }
        self.open("table", None);
        self.open("thead", None);
        self.open("tr", None);
        for (title, width) in columns {
            match width {
                Some(width) => self.html.push_str(&format!("<th width=\"{}\">", width)),
                None => self.open("th", None),
            }
            self.html.push_str(&escape_html(title));
            self.close("th");
        }
        self.close("tr");
        self.close("thead");
        self.open("tbody", None);
        for row in rows {
            self.open("tr", None);
            for cell in row {
                self.element("td", cell.class, &cell.text);
            }
            self.close("tr");
        }
        self.close("tbody");
        self.close("table");
    }
}

fn write_header(fragment: &mut Fragment, report_type: ReportType, data: &ReportData, today: Date) {
    let promotion_name = data.promotion.name.as_deref().unwrap_or(MISSING);
    let title = match (report_type, data.program_info.and_then(|info| info.title.as_deref())) {
        (ReportType::TechnicalDescription, Some(program_title)) => program_title,
        _ => report_type.title(),
    };

    fragment.open("header", None);
    fragment.element("h1", None, title);
    fragment.labelled(Some("meta"), "Promotion:", promotion_name);
    if report_type.is_per_subject() {
        let student_name = data
            .student
            .and_then(Student::full_name)
            .unwrap_or_else(|| MISSING.to_string());
        fragment.labelled(Some("meta"), "Student:", &student_name);
    }
    fragment.labelled(Some("meta"), "Generated on:", &format_date(today));
    fragment.close("header");
}

fn write_footer(fragment: &mut Fragment, report_type: ReportType, data: &ReportData, today: Date) {
    let promotion_name = data.promotion.name.as_deref().unwrap_or(MISSING);
    fragment.open("footer", None);
    fragment.element(
        "p",
        None,
        &format!(
            "{} · {} · {}",
            report_type.title(),
            promotion_name,
            format_date(today)
        ),
    );
    fragment.close("footer");
}

fn write_student_identity(fragment: &mut Fragment, student: Option<&Student>, promotion: &Promotion) {
    fragment.heading("Student");
    let name = student.and_then(Student::full_name);
    let rows = vec![
        vec![Cell::text("Name"), Cell::or_placeholder(name.as_deref(), MISSING)],
        vec![
            Cell::text("Email"),
            Cell::or_placeholder(student.and_then(|student| student.email.as_deref()), MISSING),
        ],
        vec![
            Cell::text("Promotion"),
            Cell::or_placeholder(promotion.name.as_deref(), MISSING),
        ],
    ];
    fragment.table_or_placeholder(&[("Field", Some(30)), ("Value", None)], rows, MISSING);
}

fn level_cell(level: Option<CompetenceLevel>) -> Cell {
    match level {
        Some(level) if level.is_validated() => Cell::with_class(level.label(), "level-acquired"),
        Some(level @ CompetenceLevel::InProgress) => {
            Cell::with_class(level.label(), "level-pending")
        }
        Some(level) => Cell::with_class(level.label(), "level-missing"),
        None => Cell::with_class("Not assessed", "placeholder"),
    }
}

fn write_technical(fragment: &mut Fragment, data: &ReportData) {
    let student = data.student;
    write_student_identity(fragment, student, data.promotion);

    let competences = student
        .map(|student| student.technical_tracking.competences.as_slice())
        .unwrap_or_default();
    fragment.heading("Competences");
    let rows = competences
        .iter()
        .map(|assessment| {
            vec![
                Cell::text(assessment.competence.as_str()),
                Cell::or_placeholder(assessment.module.as_deref(), MISSING),
                level_cell(assessment.level),
                Cell::or_placeholder(assessment.comment.as_deref(), "No comment"),
            ]
        })
        .collect();
    fragment.table_or_placeholder(
        &[
            ("Competence", Some(30)),
            ("Module", Some(20)),
            ("Level", Some(18)),
            ("Comment", None),
        ],
        rows,
        "No competences assessed",
    );

    let validated = competences
        .iter()
        .filter(|assessment| assessment.level.is_some_and(|level| level.is_validated()))
        .count();
    fragment.open("div", Some("summary"));
    fragment.labelled(
        None,
        "Validated competences:",
        &format!("{} / {}", validated, competences.len()),
    );
    fragment.close("div");

    fragment.heading("Notes");
    fragment.paragraph_or_placeholder(
        student.and_then(|student| student.technical_tracking.notes.as_deref()),
        "No notes recorded",
    );
}

fn write_transversal(fragment: &mut Fragment, data: &ReportData) {
    let student = data.student;
    write_student_identity(fragment, student, data.promotion);

    fragment.heading("Transversal skills");
    let skills = student
        .map(|student| student.transversal_tracking.skills.as_slice())
        .unwrap_or_default();
    let rows = skills
        .iter()
        .map(|assessment| {
            let rating = match assessment.rating {
                Some(rating) => Cell::text(format!("{}/5", rating.min(5))),
                None => Cell::with_class("Not rated", "placeholder"),
            };
            vec![
                Cell::text(assessment.skill.as_str()),
                rating,
                Cell::or_placeholder(assessment.comment.as_deref(), "No comment"),
            ]
        })
        .collect();
    fragment.table_or_placeholder(
        &[("Skill", Some(30)), ("Rating", Some(15)), ("Comment", None)],
        rows,
        "No transversal skills assessed",
    );

    fragment.heading("Attendance");
    let attendance = student
        .map(|student| student.attendance.as_slice())
        .unwrap_or_default();
    let count = |status: AttendanceStatus| {
        attendance
            .iter()
            .filter(|record| record.status == status)
            .count()
    };
    let present = count(AttendanceStatus::Present);
    let late = count(AttendanceStatus::Late);
    let rate = if attendance.is_empty() {
        MISSING.to_string()
    } else {
        format!(
            "{:.0}%",
            (present + late) as f32 * 100.0 / attendance.len() as f32
        )
    };
    fragment.table_or_placeholder(
        &[
            ("Present", None),
            ("Absent", None),
            ("Late", None),
            ("Excused", None),
            ("Attendance rate", None),
        ],
        vec![vec![
            Cell::text(present.to_string()),
            Cell::text(count(AttendanceStatus::Absent).to_string()),
            Cell::text(late.to_string()),
            Cell::text(count(AttendanceStatus::Excused).to_string()),
            Cell::text(rate),
        ]],
        MISSING,
    );
    let rows = attendance
        .iter()
        .map(|record| {
            vec![
                Cell::text(record.date.as_str()),
                Cell::text(record.status.label()),
                Cell::or_placeholder(record.comment.as_deref(), "No comment"),
            ]
        })
        .collect();
    fragment.table_or_placeholder(
        &[("Date", Some(20)), ("Status", Some(20)), ("Comment", None)],
        rows,
        "No attendance recorded",
    );

    fragment.heading("Notes");
    fragment.paragraph_or_placeholder(
        student.and_then(|student| student.transversal_tracking.notes.as_deref()),
        "No notes recorded",
    );
}

fn write_project_report(fragment: &mut Fragment, data: &ReportData) {
    let student = data.student;
    write_student_identity(fragment, student, data.promotion);

    fragment.heading("Projects");
    let projects = student
        .map(|student| student.projects.as_slice())
        .unwrap_or_default();
    let rows = projects
        .iter()
        .map(|project| {
            let grade = match project.grade {
                Some(grade) => Cell::text(format!("{}/20", format_grade(grade))),
                None => Cell::with_class("Not graded", "placeholder"),
            };
            vec![
                Cell::text(project.title.as_str()),
                Cell::or_placeholder(project.module.as_deref(), MISSING),
                Cell::or_placeholder(project.submitted_on.as_deref(), "Not submitted"),
                grade,
                Cell::or_placeholder(project.feedback.as_deref(), "No feedback"),
            ]
        })
        .collect();
    fragment.table_or_placeholder(
        &[
            ("Project", Some(25)),
            ("Module", Some(18)),
            ("Submitted", Some(15)),
            ("Grade", Some(10)),
            ("Feedback", None),
        ],
        rows,
        "No projects submitted",
    );

    let grades: Vec<f32> = projects.iter().filter_map(|project| project.grade).collect();
    fragment.open("div", Some("summary"));
    if grades.is_empty() {
        fragment.placeholder("No graded project");
    } else {
        let average = grades.iter().sum::<f32>() / grades.len() as f32;
        fragment.labelled(
            None,
            "Average grade:",
            &format!("{}/20 over {} graded projects", format_grade(average), grades.len()),
        );
    }
    fragment.close("div");
}

/// Grades are printed with at most one decimal, without a trailing `.0`.
fn format_grade(grade: f32) -> String {
    let rounded = (grade * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}

fn date_range(start: Option<&str>, end: Option<&str>) -> String {
    format!("{} → {}", start.unwrap_or(MISSING), end.unwrap_or(MISSING))
}

fn write_charter(fragment: &mut Fragment, data: &ReportData) {
    let promotion = data.promotion;
    fragment.heading("Promotion");
    let teachers = promotion.teachers.join(", ");
    let rows = vec![
        vec![Cell::text("Name"), Cell::or_placeholder(promotion.name.as_deref(), MISSING)],
        vec![
            Cell::text("Dates"),
            Cell::text(date_range(
                promotion.start_date.as_deref(),
                promotion.end_date.as_deref(),
            )),
        ],
        vec![
            Cell::text("Location"),
            Cell::or_placeholder(promotion.location.as_deref(), MISSING),
        ],
        vec![Cell::text("Teachers"), Cell::or_placeholder(Some(teachers.as_str()), MISSING)],
    ];
    fragment.table_or_placeholder(&[("Field", Some(30)), ("Value", None)], rows, MISSING);

    fragment.heading("Rules");
    let rules = data
        .program_info
        .map(|info| info.charter_rules.as_slice())
        .unwrap_or_default();
    fragment.list_or_placeholder(rules, "No rules defined");

    fragment.heading("Modules calendar");
    let rows = promotion
        .modules
        .iter()
        .map(|module| {
            vec![
                Cell::text(module.name.as_str()),
                Cell::or_placeholder(module.start_date.as_deref(), MISSING),
                Cell::or_placeholder(module.end_date.as_deref(), MISSING),
                Cell::or_placeholder(Some(module.competences.join(", ").as_str()), MISSING),
            ]
        })
        .collect();
    fragment.table_or_placeholder(
        &[
            ("Module", Some(35)),
            ("Start", Some(20)),
            ("End", Some(20)),
            ("Competences", None),
        ],
        rows,
        "No modules scheduled",
    );

    fragment.heading("Commitment");
    fragment.element(
        "p",
        None,
        &format!(
            "By joining the promotion {}, every student commits to respect the rules above for the whole duration of the program.",
            promotion.name.as_deref().unwrap_or(MISSING)
        ),
    );
}

fn write_technical_description(fragment: &mut Fragment, data: &ReportData) {
    let program_info = data.program_info;
    let empty = ProgramInfo::default();
    let info = program_info.unwrap_or(&empty);

    fragment.heading("Objectives");
    fragment.list_or_placeholder(&info.objectives, "No objectives defined");

    fragment.heading("Prerequisites");
    fragment.list_or_placeholder(&info.prerequisites, "No prerequisites");

    fragment.heading("Technical stack");
    let rows = info
        .technical_stack
        .iter()
        .map(|technology| {
            vec![
                Cell::text(technology.name.as_str()),
                Cell::or_placeholder(technology.description.as_deref(), "No description"),
            ]
        })
        .collect();
    fragment.table_or_placeholder(
        &[("Technology", Some(30)), ("Description", None)],
        rows,
        "No technologies listed",
    );

    fragment.heading("Modules");
    let rows = data
        .promotion
        .modules
        .iter()
        .map(|module| {
            vec![
                Cell::text(module.name.as_str()),
                Cell::text(date_range(
                    module.start_date.as_deref(),
                    module.end_date.as_deref(),
                )),
                Cell::or_placeholder(Some(module.competences.join(", ").as_str()), MISSING),
                Cell::or_placeholder(module.description.as_deref(), "No description"),
            ]
        })
        .collect();
    fragment.table_or_placeholder(
        &[
            ("Module", Some(22)),
            ("Dates", Some(24)),
            ("Competences", Some(24)),
            ("Description", None),
        ],
        rows,
        "No modules scheduled",
    );

    fragment.heading("Evaluation");
    fragment.list_or_placeholder(&info.evaluation_methods, "No evaluation methods defined");

    fragment.open("div", Some("summary"));
    match info.total_hours {
        Some(total_hours) => {
            fragment.labelled(None, "Total duration:", &format!("{} hours", total_hours))
        }
        None => fragment.placeholder("Total duration not specified"),
    }
    fragment.close("div");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{
        AttendanceRecord, CompetenceAssessment, Module, Project, SkillAssessment,
        TechnicalTracking, TransversalTracking,
    };
    use time::Month;

    fn today() -> Date {
        Date::from_calendar_date(2026, Month::October, 15).unwrap()
    }

    fn promotion() -> Promotion {
        Promotion {
            id: "p-1".into(),
            name: Some("Rust Autumn 2026".into()),
            modules: vec![Module {
                name: "Ownership".into(),
                start_date: Some("2026-09-01".into()),
                end_date: None,
                description: None,
                competences: vec!["Borrowing".into(), "Lifetimes".into()],
            }],
            ..Promotion::default()
        }
    }

    #[test]
    fn user_strings_are_escaped() {
        let promotion = promotion();
        let student = Student {
            id: "s-1".into(),
            first_name: Some("<script>alert('x')</script>".into()),
            last_name: Some("O'Brien & Co".into()),
            ..Student::default()
        };
        let data = ReportData {
            promotion: &promotion,
            student: Some(&student),
            program_info: None,
        };
        let fragment = build_fragment(ReportType::Technical, &data, today());

        assert!(!fragment.contains("<script>"));
        assert!(fragment.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(fragment.contains("O&#39;Brien &amp; Co"));
    }

    #[test]
    fn missing_data_renders_placeholders() {
        let promotion = Promotion {
            id: "p-2".into(),
            ..Promotion::default()
        };
        let student = Student {
            id: "s-2".into(),
            ..Student::default()
        };
        let data = ReportData {
            promotion: &promotion,
            student: Some(&student),
            program_info: None,
        };
        let fragment = build_fragment(ReportType::Technical, &data, today());

        assert!(fragment.contains("No competences assessed"));
        assert!(fragment.contains("No notes recorded"));
        assert!(fragment.contains("<strong>Student:</strong> —"));
        assert!(fragment.contains("<strong>Validated competences:</strong> 0 / 0"));
    }

    #[test]
    fn competence_levels_are_classified() {
        let promotion = promotion();
        let student = Student {
            id: "s-3".into(),
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            technical_tracking: TechnicalTracking {
                competences: vec![
                    CompetenceAssessment {
                        competence: "Traits".into(),
                        module: Some("Ownership".into()),
                        level: Some(CompetenceLevel::Mastered),
                        comment: None,
                    },
                    CompetenceAssessment {
                        competence: "Macros".into(),
                        module: None,
                        level: None,
                        comment: Some("Next module".into()),
                    },
                ],
                notes: Some("Steady progress".into()),
            },
            ..Student::default()
        };
        let data = ReportData {
            promotion: &promotion,
            student: Some(&student),
            program_info: None,
        };
        let fragment = build_fragment(ReportType::Technical, &data, today());

        assert!(fragment.contains("<td class=\"level-acquired\">Mastered</td>"));
        assert!(fragment.contains("<td class=\"placeholder\">Not assessed</td>"));
        assert!(fragment.contains("<strong>Validated competences:</strong> 1 / 2"));
        assert!(fragment.contains("<p>Steady progress</p>"));
    }

    fn attendance(date: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            date: date.into(),
            status,
            comment: None,
        }
    }

    #[test]
    fn attendance_is_summarized() {
        let promotion = promotion();
        let student = Student {
            id: "s-5".into(),
            transversal_tracking: TransversalTracking {
                skills: vec![
                    SkillAssessment {
                        skill: "Teamwork".into(),
                        rating: Some(4),
                        comment: Some("Helpful".into()),
                    },
                    SkillAssessment {
                        skill: "Curiosity".into(),
                        rating: Some(7),
                        comment: None,
                    },
                ],
                notes: None,
            },
            attendance: vec![
                attendance("2026-09-01", AttendanceStatus::Present),
                attendance("2026-09-02", AttendanceStatus::Late),
                attendance("2026-09-03", AttendanceStatus::Absent),
                attendance("2026-09-04", AttendanceStatus::Present),
            ],
            ..Student::default()
        };
        let data = ReportData {
            promotion: &promotion,
            student: Some(&student),
            program_info: None,
        };
        let fragment = build_fragment(ReportType::Transversal, &data, today());

        assert!(fragment.contains("<td>Teamwork</td><td>4/5</td><td>Helpful</td>"));
        // Ratings above the scale are capped
        assert!(fragment.contains("<td>Curiosity</td><td>5/5</td>"));
        // Present, absent, late, excused, then late students count as attending
        assert!(fragment.contains("<tr><td>2</td><td>1</td><td>1</td><td>0</td><td>75%</td></tr>"));
        assert!(fragment.contains(
            "<tr><td>2026-09-02</td><td>Late</td><td class=\"placeholder\">No comment</td></tr>"
        ));
        assert!(fragment.contains("No notes recorded"));
    }

    #[test]
    fn empty_transversal_tracking_keeps_every_section() {
        let promotion = promotion();
        let student = Student {
            id: "s-6".into(),
            ..Student::default()
        };
        let data = ReportData {
            promotion: &promotion,
            student: Some(&student),
            program_info: None,
        };
        let fragment = build_fragment(ReportType::Transversal, &data, today());

        assert!(fragment.contains("No transversal skills assessed"));
        assert!(fragment.contains("<tr><td>0</td><td>0</td><td>0</td><td>0</td><td>—</td></tr>"));
        assert!(fragment.contains("No attendance recorded"));
        assert!(fragment.contains("No notes recorded"));
    }

    #[test]
    fn project_grades_are_averaged() {
        let promotion = promotion();
        let project = |title: &str, grade: Option<f32>| Project {
            title: title.into(),
            module: Some("Ownership".into()),
            submitted_on: grade.map(|_| "2026-09-20".to_string()),
            grade,
            feedback: None,
        };
        let student = Student {
            id: "s-7".into(),
            projects: vec![
                project("Borrow checker kata", Some(15.5)),
                project("Linked list", Some(12.0)),
                project("Async runtime", None),
            ],
            ..Student::default()
        };
        let data = ReportData {
            promotion: &promotion,
            student: Some(&student),
            program_info: None,
        };
        let fragment = build_fragment(ReportType::ProjectReport, &data, today());

        assert!(fragment.contains("<td>2026-09-20</td><td>15.5/20</td>"));
        assert!(fragment.contains("<td>12/20</td>"));
        assert!(fragment.contains(
            "<td class=\"placeholder\">Not submitted</td><td class=\"placeholder\">Not graded</td>"
        ));
        assert!(fragment.contains("<p><strong>Average grade:</strong> 13.8/20 over 2 graded projects</p>"));
    }

    #[test]
    fn projects_without_grades_have_no_average() {
        let promotion = promotion();
        let student = Student {
            id: "s-8".into(),
            ..Student::default()
        };
        let data = ReportData {
            promotion: &promotion,
            student: Some(&student),
            program_info: None,
        };
        let fragment = build_fragment(ReportType::ProjectReport, &data, today());

        assert!(fragment.contains("No projects submitted"));
        assert!(fragment.contains("<p class=\"placeholder\">No graded project</p>"));
        assert!(!fragment.contains("Average grade"));
    }

    #[test]
    fn header_is_always_first() {
        let promotion = promotion();
        let data = ReportData {
            promotion: &promotion,
            student: None,
            program_info: None,
        };
        let fragment = build_fragment(ReportType::Charter, &data, today());

        similar_asserts::assert_eq!(
            &fragment[..fragment.find("</header>").unwrap() + "</header>".len()],
            "<div class=\"report\"><header><h1>Program charter</h1>\
             <p class=\"meta\"><strong>Promotion:</strong> Rust Autumn 2026</p>\
             <p class=\"meta\"><strong>Generated on:</strong> 15/10/2026</p></header>"
        );
        assert!(fragment.contains("No rules defined"));
        assert!(fragment.contains("<td>Borrowing, Lifetimes</td>"));
        assert!(fragment.ends_with("</footer></div>"));
    }

    #[test]
    fn filenames_replace_spaces_with_hyphens() {
        assert_eq!(
            report_filename(ReportType::Technical, "Jane  Mary Doe", "pdf"),
            "technical_Jane-Mary-Doe.pdf"
        );
        assert_eq!(
            report_filename(ReportType::Charter, "Rust/2026: Autumn", "pdf"),
            "charter_Rust2026-Autumn.pdf"
        );
        assert_eq!(
            report_filename(ReportType::ProjectReport, "  ", "pdf"),
            "projectReport_unnamed.pdf"
        );
    }

    #[test]
    fn documents_are_named_after_their_subject() {
        let promotion = promotion();
        let student = Student {
            id: "s-4".into(),
            first_name: Some("Grace".into()),
            last_name: Some("Hopper".into()),
            ..Student::default()
        };
        let per_subject = build_document(
            ReportType::Transversal,
            &ReportData {
                promotion: &promotion,
                student: Some(&student),
                program_info: None,
            },
            today(),
        );
        let cohort = build_document(
            ReportType::TechnicalDescription,
            &ReportData {
                promotion: &promotion,
                student: None,
                program_info: None,
            },
            today(),
        );

        assert_eq!(per_subject.filename, "transversal_Grace-Hopper.pdf");
        assert_eq!(per_subject.title, "Transversal tracking - Grace Hopper");
        assert_eq!(cohort.filename, "technicalDescription_Rust-Autumn-2026.pdf");
    }

    #[test]
    fn grades_drop_trailing_zeroes() {
        assert_eq!(format_grade(15.0), "15");
        assert_eq!(format_grade(12.25), "12.3");
    }
}

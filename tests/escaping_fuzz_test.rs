use cohort_reports::fonts::FontSet;
use cohort_reports::layout::{DrawCommand, LayoutMeasurer as _, RenderingContext};
use cohort_reports::records::{
    CompetenceAssessment, Promotion, ReportType, SkillAssessment, Student, TechnicalTracking,
    TransversalTracking,
};
use cohort_reports::stylesheet::Stylesheet;
use cohort_reports::template::{self, ReportData};
use rand::Rng as _;
use time::{Date, Month};

const ITERATIONS: usize = 40;
const MAXIMUM_STRING_LENGTH: usize = 40;

fn random_utf8_characters(rng: &mut rand::rngs::ThreadRng) -> String {
    let length = rng.gen_range(1..=MAXIMUM_STRING_LENGTH);
    rand_utf8::rand_utf8(rng, length).to_string()
}

/// Whatever the users typed in the records, the fragments stay well-formed.
#[test]
fn random_user_strings_always_lay_out() {
    let fonts = FontSet::embedded().unwrap();
    let stylesheet = Stylesheet::report_default();
    let today = Date::from_calendar_date(2024, Month::March, 15).unwrap();
    let mut rng = rand::thread_rng();

    for iteration in 0..ITERATIONS {
        let promotion = Promotion {
            id: "promo-1".into(),
            name: Some(random_utf8_characters(&mut rng)),
            ..Promotion::default()
        };
        let student = Student {
            id: "s-1".into(),
            first_name: Some(random_utf8_characters(&mut rng)),
            last_name: Some(format!("<b>{}</b> & \"{}\"", random_utf8_characters(&mut rng), "'")),
            technical_tracking: TechnicalTracking {
                competences: vec![CompetenceAssessment {
                    competence: random_utf8_characters(&mut rng),
                    module: Some(random_utf8_characters(&mut rng)),
                    level: None,
                    comment: Some(random_utf8_characters(&mut rng)),
                }],
                notes: Some(random_utf8_characters(&mut rng)),
            },
            transversal_tracking: TransversalTracking {
                skills: vec![SkillAssessment {
                    skill: random_utf8_characters(&mut rng),
                    rating: Some(rng.gen_range(0..=5)),
                    comment: Some("</td></tr></table>".into()),
                }],
                notes: None,
            },
            ..Student::default()
        };
        let data = ReportData {
            promotion: &promotion,
            student: Some(&student),
            program_info: None,
        };

        for report_type in [ReportType::Technical, ReportType::Transversal] {
            let document = template::build_document(report_type, &data, today);
            let context = RenderingContext::open(&fonts, 794.0, format!("fuzz-{}", iteration));
            let laid_out = context
                .lay_out(&document.html_content, &stylesheet)
                .unwrap_or_else(|error| {
                    panic!("{}\n{}", error, document.html_content);
                });

            assert!(laid_out.measurement.height > 0.0);
            assert!(!document.filename.contains('/'));
            // Markup typed by the users is drawn as text, never interpreted
            assert!(laid_out.commands.iter().any(|command| matches!(
                command,
                DrawCommand::Text { text, .. } if text.contains("<b>") || text.contains("</td></tr></table>")
            )));
        }
    }
}

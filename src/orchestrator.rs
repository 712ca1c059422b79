//! The generation of a batch of reports.
//!
//! A `ReportSession` carries everything one invocation needs: where the records come
//! from, the pipeline turning a fragment into pages, and where the progress goes. The
//! documents are rendered strictly one after the other, each run of the pipeline
//! returning before the next one starts, and any failure aborts the whole batch.

use std::path::{Path, PathBuf};

use time::{Date, OffsetDateTime};

use crate::archive::ArchiveBundle;
use crate::configuration::{PageGeometry, ReportConfiguration};
use crate::document::OutputDocument;
use crate::error::{ContextError, ErrorKind};
use crate::fonts::FontSet;
use crate::layout::{LayoutMeasurer as _, RenderingContext};
use crate::paginator::Paginator;
use crate::raster::Rasterizer;
use crate::records::{Promotion, ReportRequest, ReportType};
use crate::source::RecordSource;
use crate::stylesheet::Stylesheet;
use crate::template::{self, RenderableDocument, ReportData};

/// Turns a renderable document into its pages.
pub trait DocumentPipeline {
    /// Fail fast when something the rendering needs is not available.
    fn ensure_capabilities(&self) -> Result<(), ContextError>;

    /// Lay out, rasterize and paginate one document.
    fn render(&mut self, document: &RenderableDocument) -> Result<OutputDocument, ContextError>;
}

/// The pipeline of this crate: glyph-measured layout, rasterization and row-aware pagination.
#[derive(Debug, Clone)]
pub struct RasterPipeline {
    fonts: FontSet,
    stylesheet: Stylesheet,
    rasterizer: Rasterizer,
    paginator: Paginator,
    page_geometry: PageGeometry,
    viewport_width: f32,
    creation_date: OffsetDateTime,
}

impl RasterPipeline {
    pub fn new(
        fonts: FontSet,
        configuration: &ReportConfiguration,
        creation_date: OffsetDateTime,
    ) -> Self {
        RasterPipeline {
            fonts,
            stylesheet: Stylesheet::report_default(),
            rasterizer: Rasterizer::new(
                configuration.oversampling_factor,
                configuration.maximum_raster_dimension,
            ),
            paginator: Paginator::new(
                configuration.page_geometry,
                configuration.oversampling_factor,
            ),
            page_geometry: configuration.page_geometry,
            viewport_width: configuration.viewport_width,
            creation_date,
        }
    }

    /// Build the pipeline with the fonts named by the configuration.
    pub fn from_configuration(
        configuration: &ReportConfiguration,
        creation_date: OffsetDateTime,
    ) -> Result<Self, ContextError> {
        let fonts = FontSet::from_configuration(configuration.fonts.as_ref())?;
        Ok(RasterPipeline::new(fonts, configuration, creation_date))
    }
}

impl DocumentPipeline for RasterPipeline {
    fn ensure_capabilities(&self) -> Result<(), ContextError> {
        let missing_capability = |context: &str| {
            Err(ContextError::with_context(context).of_kind(ErrorKind::MissingRenderingCapability))
        };
        if self.fonts.text_width("Aa", 12.0, false) <= 0.0
            || self.fonts.text_width("Aa", 12.0, true) <= 0.0
        {
            return missing_capability("The fonts have no usable glyphs");
        }
        if self.rasterizer.oversampling_factor == 0 {
            return missing_capability("The oversampling factor must be positive");
        }
        if !(self.viewport_width > 0.0) {
            return missing_capability("The viewport width must be positive");
        }

        Ok(())
    }

    fn render(&mut self, document: &RenderableDocument) -> Result<OutputDocument, ContextError> {
        let (laid_out, raster_image) = {
            // The context is released at the end of this block, whatever the outcome
            let context = RenderingContext::open(&self.fonts, self.viewport_width, &document.filename);
            let laid_out = context.lay_out(&document.html_content, &self.stylesheet)?;
            let raster_image = self.rasterizer.rasterize(&laid_out, context.fonts())?;
            (laid_out, raster_image)
        };
        let pages = self
            .paginator
            .paginate(&raster_image, &laid_out.measurement.row_boundaries);
        log::debug!("Paginated {:?} into {} pages", document.filename, pages.len());

        Ok(OutputDocument {
            filename: document.filename.clone(),
            title: document.title.clone(),
            page_geometry: self.page_geometry,
            creation_date: self.creation_date,
            pages,
        })
    }
}

/// The state of a batch when a document is about to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress<'a> {
    /// Starts at 1.
    pub index: usize,
    pub total: usize,
    pub subject_name: &'a str,
}

impl std::fmt::Display for Progress<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "Generating PDF {} of {}: {}…",
            self.index, self.total, self.subject_name
        )
    }
}

/// Receives the progress of a batch. `finished` is called exactly once per batch that
/// has started, on success as well as on failure.
pub trait ProgressReporter {
    fn started(&mut self, _total: usize) {}

    fn report(&mut self, progress: &Progress);

    fn finished(&mut self, _succeeded: bool) {}
}

/// Reports the progress through the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn started(&mut self, total: usize) {
        log::info!("Generating {} documents", total);
    }

    fn report(&mut self, progress: &Progress) {
        log::info!("{}", progress);
    }

    fn finished(&mut self, succeeded: bool) {
        if succeeded {
            log::info!("The generation is complete");
        } else {
            log::warn!("The generation was aborted");
        }
    }
}

/// Finishes the progress when dropped.
struct ProgressGuard<'r, R: ProgressReporter + ?Sized> {
    reporter: &'r mut R,
    succeeded: bool,
}

impl<'r, R: ProgressReporter + ?Sized> ProgressGuard<'r, R> {
    fn start(reporter: &'r mut R, total: usize) -> Self {
        reporter.started(total);
        ProgressGuard {
            reporter,
            succeeded: false,
        }
    }

    fn report(&mut self, progress: &Progress) {
        self.reporter.report(progress);
    }
}

impl<R: ProgressReporter + ?Sized> Drop for ProgressGuard<'_, R> {
    fn drop(&mut self) {
        self.reporter.finished(self.succeeded);
    }
}

/// What a batch produces: a single PDF, or an archive when there are several documents.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutput {
    Document {
        filename: String,
        bytes: Vec<u8>,
    },
    Archive {
        filename: String,
        bytes: Vec<u8>,
        /// The names of the entries, in generation order.
        entries: Vec<String>,
    },
}

impl BatchOutput {
    pub fn filename(&self) -> &str {
        match self {
            BatchOutput::Document { filename, .. } | BatchOutput::Archive { filename, .. } => filename,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            BatchOutput::Document { bytes, .. } | BatchOutput::Archive { bytes, .. } => bytes,
        }
    }

    /// Write the output into the directory, which is created if needed.
    pub fn save_into(&self, directory_path: &Path) -> Result<PathBuf, ContextError> {
        std::fs::create_dir_all(directory_path).map_err(|error| {
            ContextError::with_error(
                format!("Unable to create the output directory {:?}", directory_path),
                &error,
            )
            .of_kind(ErrorKind::Output)
        })?;
        let output_path = directory_path.join(self.filename());
        std::fs::write(&output_path, self.bytes()).map_err(|error| {
            ContextError::with_error(format!("Unable to write the output {:?}", output_path), &error)
                .of_kind(ErrorKind::Output)
        })?;

        Ok(output_path)
    }
}

/// The collaborators of one report generation. Nothing outlives the session.
pub struct ReportSession<'a> {
    source: &'a dyn RecordSource,
    pipeline: &'a mut dyn DocumentPipeline,
    progress: &'a mut dyn ProgressReporter,
    today: Date,
    page_dump_directory: Option<PathBuf>,
}

impl<'a> ReportSession<'a> {
    pub fn new(
        source: &'a dyn RecordSource,
        pipeline: &'a mut dyn DocumentPipeline,
        progress: &'a mut dyn ProgressReporter,
        today: Date,
    ) -> Self {
        ReportSession {
            source,
            pipeline,
            progress,
            today,
            page_dump_directory: None,
        }
    }

    /// Also save the pages of every document as PNG images into the directory.
    pub fn with_page_dump(mut self, directory_path: PathBuf) -> Self {
        self.page_dump_directory = Some(directory_path);
        self
    }

    /// Generate the reports of the request. Either every document is generated and
    /// bundled, or an error is returned and nothing is produced.
    pub fn run(&mut self, request: &ReportRequest) -> Result<BatchOutput, ContextError> {
        request.validate()?;
        self.pipeline.ensure_capabilities()?;

        let promotion = self
            .source
            .fetch_promotion(&request.context_id)
            .map_err(|error| {
                error.wrap(format!("Unable to fetch the promotion {:?}", request.context_id))
            })?;

        if request.report_type.is_per_subject() {
            self.generate_per_subject(request, &promotion)
        } else {
            if !request.subject_ids.is_empty() {
                log::warn!(
                    "The {} report covers the whole promotion, ignoring {} students",
                    request.report_type,
                    request.subject_ids.len()
                );
            }
            self.generate_for_promotion(request.report_type, &promotion)
        }
    }

    fn generate_per_subject(
        &mut self,
        request: &ReportRequest,
        promotion: &Promotion,
    ) -> Result<BatchOutput, ContextError> {
        let total = request.subject_ids.len();
        let mut guard = ProgressGuard::start(&mut *self.progress, total);
        let mut documents = Vec::with_capacity(total);

        for (index, subject_id) in request.subject_ids.iter().enumerate() {
            let student = self.source.fetch_student(subject_id).map_err(|error| {
                error.wrap(format!(
                    "Unable to fetch the record {} of {} ({:?})",
                    index + 1,
                    total,
                    subject_id
                ))
            })?;
            let data = ReportData {
                promotion,
                student: Some(&student),
                program_info: None,
            };
            let subject_name = template::subject_name(request.report_type, &data);
            guard.report(&Progress {
                index: index + 1,
                total,
                subject_name: &subject_name,
            });

            let renderable_document = template::build_document(request.report_type, &data, self.today);
            let document = self.pipeline.render(&renderable_document).map_err(|error| {
                error.wrap(format!(
                    "Unable to render the record {} of {} ({})",
                    index + 1,
                    total,
                    subject_name
                ))
            })?;
            dump_pages(self.page_dump_directory.as_deref(), &document)?;
            documents.push(SerializedDocument::from_document(document)?);
        }

        let output = bundle(request.report_type, promotion_name(promotion), documents)?;
        guard.succeeded = true;

        Ok(output)
    }

    fn generate_for_promotion(
        &mut self,
        report_type: ReportType,
        promotion: &Promotion,
    ) -> Result<BatchOutput, ContextError> {
        let mut guard = ProgressGuard::start(&mut *self.progress, 1);
        let program_info = self.source.fetch_program_info(&promotion.id).map_err(|error| {
            error.wrap(format!(
                "Unable to fetch the program information of the promotion {:?}",
                promotion.id
            ))
        })?;
        let data = ReportData {
            promotion,
            student: None,
            program_info: Some(&program_info),
        };
        let subject_name = template::subject_name(report_type, &data);
        guard.report(&Progress {
            index: 1,
            total: 1,
            subject_name: &subject_name,
        });

        let renderable_document = template::build_document(report_type, &data, self.today);
        let document = self
            .pipeline
            .render(&renderable_document)
            .map_err(|error| error.wrap(format!("Unable to render the report of {}", subject_name)))?;
        dump_pages(self.page_dump_directory.as_deref(), &document)?;
        let documents = vec![SerializedDocument::from_document(document)?];

        let output = bundle(report_type, promotion_name(promotion), documents)?;
        guard.succeeded = true;

        Ok(output)
    }
}

fn promotion_name(promotion: &Promotion) -> &str {
    promotion.name.as_deref().unwrap_or(&promotion.id)
}

fn dump_pages(directory_path: Option<&Path>, document: &OutputDocument) -> Result<(), ContextError> {
    if let Some(directory_path) = directory_path {
        document.save_page_images(directory_path)?;
    }

    Ok(())
}

/// A document turned into the bytes of its PDF file, its page bitmaps released.
struct SerializedDocument {
    filename: String,
    bytes: Vec<u8>,
}

impl SerializedDocument {
    fn from_document(document: OutputDocument) -> Result<Self, ContextError> {
        let bytes = document.to_pdf_bytes()?;

        Ok(SerializedDocument {
            filename: document.filename,
            bytes,
        })
    }
}

/// A single document is returned as such, several are bundled into an archive named
/// after the promotion.
fn bundle(
    report_type: ReportType,
    promotion_name: &str,
    mut documents: Vec<SerializedDocument>,
) -> Result<BatchOutput, ContextError> {
    if documents.len() == 1 {
        if let Some(document) = documents.pop() {
            return Ok(BatchOutput::Document {
                filename: document.filename,
                bytes: document.bytes,
            });
        }
    }

    let mut archive_bundle = ArchiveBundle::new();
    let entries = documents
        .into_iter()
        .map(|document| archive_bundle.add(&document.filename, document.bytes))
        .collect();
    let bytes = archive_bundle
        .finish()
        .map_err(|error| error.wrap("Unable to bundle the reports"))?;

    Ok(BatchOutput::Archive {
        filename: template::report_filename(report_type, promotion_name, "zip"),
        bytes,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::rc::Rc;

    use image::RgbaImage;

    use super::*;
    use crate::paginator::{PageImage, PageSlice};
    use crate::records::{ProgramInfo, Student};

    #[derive(Default)]
    struct MemorySource {
        students: HashMap<String, Student>,
        fetched: RefCell<Vec<String>>,
    }

    impl MemorySource {
        fn with_students(names: &[(&str, &str, &str)]) -> Self {
            let students = names
                .iter()
                .map(|(id, first_name, last_name)| {
                    let student = Student {
                        id: id.to_string(),
                        first_name: Some(first_name.to_string()),
                        last_name: Some(last_name.to_string()),
                        ..Student::default()
                    };
                    (id.to_string(), student)
                })
                .collect();

            MemorySource {
                students,
                fetched: RefCell::default(),
            }
        }
    }

    impl RecordSource for MemorySource {
        fn fetch_student(&self, student_id: &str) -> Result<Student, ContextError> {
            self.fetched.borrow_mut().push(student_id.to_string());
            self.students.get(student_id).cloned().ok_or(
                ContextError::with_context(format!("No student {}", student_id))
                    .of_kind(ErrorKind::RecordFetchFailure),
            )
        }

        fn fetch_promotion(&self, promotion_id: &str) -> Result<Promotion, ContextError> {
            Ok(Promotion {
                id: promotion_id.to_string(),
                name: Some("Web Developer 2024".into()),
                ..Promotion::default()
            })
        }

        fn fetch_program_info(&self, promotion_id: &str) -> Result<ProgramInfo, ContextError> {
            Ok(ProgramInfo {
                promotion_id: promotion_id.to_string(),
                ..ProgramInfo::default()
            })
        }
    }

    /// Records when each render starts and ends.
    #[derive(Default)]
    struct RecordingPipeline {
        events: Rc<RefCell<Vec<String>>>,
        capable: bool,
        /// The document whose page comes out without any pixel.
        blank_document: Option<String>,
    }

    impl DocumentPipeline for RecordingPipeline {
        fn ensure_capabilities(&self) -> Result<(), ContextError> {
            if self.capable {
                Ok(())
            } else {
                Err(ContextError::with_context("No fonts").of_kind(ErrorKind::MissingRenderingCapability))
            }
        }

        fn render(&mut self, document: &RenderableDocument) -> Result<OutputDocument, ContextError> {
            self.events.borrow_mut().push(format!("enter {}", document.filename));
            let page = PageImage {
                slice: PageSlice {
                    source_y_start: 0,
                    source_height: 4,
                    dest_x: 10.0,
                    dest_y: 10.0,
                    dest_width: 190.0,
                    dest_height: 20.0,
                },
                image: if self.blank_document.as_ref() == Some(&document.filename) {
                    RgbaImage::new(0, 0)
                } else {
                    RgbaImage::new(8, 4)
                },
            };
            let document = OutputDocument {
                filename: document.filename.clone(),
                title: document.title.clone(),
                page_geometry: PageGeometry::default(),
                creation_date: OffsetDateTime::UNIX_EPOCH,
                pages: vec![page],
            };
            self.events.borrow_mut().push(format!("exit {}", document.filename));

            Ok(document)
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        messages: Vec<String>,
        finished: Vec<bool>,
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&mut self, progress: &Progress) {
            self.messages.push(progress.to_string());
        }

        fn finished(&mut self, succeeded: bool) {
            self.finished.push(succeeded);
        }
    }

    fn today() -> Date {
        Date::from_calendar_date(2024, time::Month::March, 15).unwrap()
    }

    fn request(subject_ids: &[&str]) -> ReportRequest {
        ReportRequest {
            report_type: ReportType::Technical,
            subject_ids: subject_ids.iter().map(|id| id.to_string()).collect(),
            context_id: "promo-1".into(),
        }
    }

    fn five_students() -> MemorySource {
        MemorySource::with_students(&[
            ("s1", "Ada", "Lovelace"),
            ("s2", "Alan", "Turing"),
            ("s3", "Grace", "Hopper"),
            ("s4", "Jane", "Doe"),
            ("s5", "Edsger", "Dijkstra"),
        ])
    }

    #[test]
    fn renders_never_overlap_and_follow_the_request_order() {
        let source = five_students();
        let mut pipeline = RecordingPipeline {
            capable: true,
            ..RecordingPipeline::default()
        };
        let events = Rc::clone(&pipeline.events);
        let mut progress = RecordingProgress::default();

        ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request(&["s3", "s1", "s2"]))
            .unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                "enter technical_Grace-Hopper.pdf",
                "exit technical_Grace-Hopper.pdf",
                "enter technical_Ada-Lovelace.pdf",
                "exit technical_Ada-Lovelace.pdf",
                "enter technical_Alan-Turing.pdf",
                "exit technical_Alan-Turing.pdf",
            ]
        );
        assert_eq!(*source.fetched.borrow(), vec!["s3", "s1", "s2"]);
    }

    #[test]
    fn a_failed_fetch_aborts_the_batch() {
        let source = MemorySource::with_students(&[("s1", "Ada", "Lovelace"), ("s3", "Grace", "Hopper")]);
        let mut pipeline = RecordingPipeline {
            capable: true,
            ..RecordingPipeline::default()
        };
        let events = Rc::clone(&pipeline.events);
        let mut progress = RecordingProgress::default();

        let error = ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request(&["s1", "s2", "s3"]))
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::RecordFetchFailure);
        assert!(error.to_string().contains("record 2 of 3"), "{}", error);
        assert!(error.to_string().contains("s2"));
        // The third record is never reached
        assert_eq!(*source.fetched.borrow(), vec!["s1", "s2"]);
        assert_eq!(events.borrow().len(), 2);
        assert_eq!(progress.finished, vec![false]);
    }

    #[test]
    fn a_document_which_cannot_be_written_aborts_the_batch() {
        let source = five_students();
        let mut pipeline = RecordingPipeline {
            capable: true,
            blank_document: Some("technical_Alan-Turing.pdf".into()),
            ..RecordingPipeline::default()
        };
        let mut progress = RecordingProgress::default();

        let error = ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request(&["s1", "s2", "s3"]))
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::Output);
        assert_eq!(*source.fetched.borrow(), vec!["s1", "s2"]);
        assert_eq!(progress.finished, vec![false]);

        // Same for a lone document, which is written after its render
        let mut pipeline = RecordingPipeline {
            capable: true,
            blank_document: Some("technical_Jane-Doe.pdf".into()),
            ..RecordingPipeline::default()
        };
        let mut progress = RecordingProgress::default();
        let error = ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request(&["s4"]))
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::Output);
        assert_eq!(progress.finished, vec![false]);
    }

    #[test]
    fn several_documents_are_archived() {
        let source = five_students();
        let mut pipeline = RecordingPipeline {
            capable: true,
            ..RecordingPipeline::default()
        };
        let mut progress = RecordingProgress::default();

        let output = ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request(&["s1", "s2", "s3", "s4", "s5"]))
            .unwrap();

        let BatchOutput::Archive { filename, bytes, entries } = output else {
            panic!("expected an archive");
        };
        assert_eq!(filename, "technical_Web-Developer-2024.zip");
        assert_eq!(
            entries,
            vec![
                "technical_Ada-Lovelace.pdf",
                "technical_Alan-Turing.pdf",
                "technical_Grace-Hopper.pdf",
                "technical_Jane-Doe.pdf",
                "technical_Edsger-Dijkstra.pdf",
            ]
        );
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 5);
        assert_eq!(progress.messages[2], "Generating PDF 3 of 5: Grace Hopper…");
        assert_eq!(progress.finished, vec![true]);
    }

    #[test]
    fn homonyms_get_distinct_entries() {
        let source = MemorySource::with_students(&[("s1", "Jane", "Doe"), ("s2", "Jane", "Doe")]);
        let mut pipeline = RecordingPipeline {
            capable: true,
            ..RecordingPipeline::default()
        };
        let mut progress = RecordingProgress::default();

        let output = ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request(&["s1", "s2"]))
            .unwrap();

        match output {
            BatchOutput::Archive { entries, .. } => {
                assert_eq!(entries, vec!["technical_Jane-Doe.pdf", "technical_Jane-Doe-2.pdf"])
            }
            BatchOutput::Document { .. } => panic!("expected an archive"),
        }
    }

    #[test]
    fn a_single_document_is_not_archived() {
        let source = five_students();
        let mut pipeline = RecordingPipeline {
            capable: true,
            ..RecordingPipeline::default()
        };
        let mut progress = RecordingProgress::default();

        let output = ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request(&["s4"]))
            .unwrap();

        assert_eq!(output.filename(), "technical_Jane-Doe.pdf");
        assert!(output.bytes().starts_with(b"%PDF"));
    }

    #[test]
    fn cohort_reports_are_named_after_the_promotion() {
        let source = five_students();
        let mut pipeline = RecordingPipeline {
            capable: true,
            ..RecordingPipeline::default()
        };
        let mut progress = RecordingProgress::default();
        let request = ReportRequest {
            report_type: ReportType::Charter,
            subject_ids: Vec::new(),
            context_id: "promo-1".into(),
        };

        let output = ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request)
            .unwrap();

        assert_eq!(output.filename(), "charter_Web-Developer-2024.pdf");
        assert_eq!(progress.messages, vec!["Generating PDF 1 of 1: Web Developer 2024…"]);
    }

    #[test]
    fn missing_capabilities_fail_before_any_fetch() {
        let source = five_students();
        let mut pipeline = RecordingPipeline::default();
        let mut progress = RecordingProgress::default();

        let error = ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request(&["s1"]))
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::MissingRenderingCapability);
        assert!(source.fetched.borrow().is_empty());
        assert!(progress.finished.is_empty());
    }

    #[test]
    fn empty_per_subject_requests_are_rejected() {
        let source = five_students();
        let mut pipeline = RecordingPipeline {
            capable: true,
            ..RecordingPipeline::default()
        };
        let mut progress = RecordingProgress::default();

        let error = ReportSession::new(&source, &mut pipeline, &mut progress, today())
            .run(&request(&[]))
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::InvalidRequest);
    }
}

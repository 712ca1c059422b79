use std::path::PathBuf;

use clap::Parser;
use cohort_reports::{
    configuration::ReportConfiguration,
    error::{ContextError, ErrorKind},
    orchestrator::{DocumentPipeline as _, LogProgress, RasterPipeline, ReportSession},
    records::{ReportRequest, ReportType},
    source,
};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

#[derive(Parser, Debug)]
#[command(version, about = "Generate the PDF reports of a bootcamp promotion", long_about = None)]
struct CliArguments {
    /// The JSON configuration, the defaults are used when it is omitted.
    #[arg(short = 'c', long = "configuration", value_name = "json_file")]
    configuration_path: Option<PathBuf>,
    /// technical, transversal, projectReport, charter or technicalDescription.
    #[arg(short = 'r', long = "report", value_name = "report_type")]
    report_type: ReportType,
    #[arg(short = 'p', long = "promotion", value_name = "promotion_id")]
    promotion_id: String,
    /// The students to generate the reports for, in order. Repeat the flag for several students.
    #[arg(short = 's', long = "subject", value_name = "student_id")]
    subject_ids: Vec<String>,
    /// Overrides the output directory of the configuration.
    #[arg(short = 'o', long = "output-directory", value_name = "directory")]
    output_directory: Option<PathBuf>,
    /// The date printed on the reports, as YYYY-MM-DD. Defaults to the current date.
    #[arg(long = "today", value_name = "date")]
    today: Option<String>,
    /// Also save every page as a PNG image into this directory.
    #[arg(long = "dump-pages", value_name = "directory")]
    dump_pages_directory: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    if let Err(error) = fallible_main() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), ContextError> {
    let arguments = CliArguments::parse();
    env_logger::builder()
        .filter_level(if arguments.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Info
        })
        .init();
    log::debug!("{:?}", arguments);

    let mut configuration = match &arguments.configuration_path {
        Some(configuration_path) => ReportConfiguration::from_path(configuration_path)?,
        None => ReportConfiguration::default(),
    };
    if let Some(output_directory) = &arguments.output_directory {
        configuration.output_directory = output_directory.clone();
    }
    configuration.validate()?;
    log::debug!("{:?}", configuration);

    let today = match &arguments.today {
        Some(date) => parse_date(date)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let request = ReportRequest {
        report_type: arguments.report_type,
        subject_ids: arguments.subject_ids.clone(),
        context_id: arguments.promotion_id.clone(),
    };

    let record_source = source::from_configuration(&configuration.data_source)?;
    let mut pipeline =
        RasterPipeline::from_configuration(&configuration, today.midnight().assume_utc())?;
    pipeline.ensure_capabilities()?;
    let mut progress = LogProgress;

    let mut session = ReportSession::new(record_source.as_ref(), &mut pipeline, &mut progress, today);
    if let Some(dump_pages_directory) = &arguments.dump_pages_directory {
        session = session.with_page_dump(dump_pages_directory.clone());
    }
    let output = session.run(&request)?;

    let output_path = output.save_into(&configuration.output_directory)?;
    log::info!("Saved the output file to the path: {:?}", output_path);

    Ok(())
}

/// Parse a `YYYY-MM-DD` date.
fn parse_date(date: &str) -> Result<Date, ContextError> {
    Date::parse(date.trim(), format_description!("[year]-[month]-[day]")).map_err(|error| {
        ContextError::with_error(format!("The date {:?} is not of the form YYYY-MM-DD", date), &error)
            .of_kind(ErrorKind::InvalidRequest)
    })
}

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::configuration::DataSourceConfiguration;
use crate::error::{ContextError, ErrorKind};
use crate::records::{ProgramInfo, Promotion, Student};

/// The data API the report pipeline reads its records from. Implementations are
/// read-only from the point of view of the pipeline.
pub trait RecordSource {
    fn fetch_student(&self, student_id: &str) -> Result<Student, ContextError>;

    fn fetch_promotion(&self, promotion_id: &str) -> Result<Promotion, ContextError>;

    fn fetch_program_info(&self, promotion_id: &str) -> Result<ProgramInfo, ContextError>;
}

/// The collections the records are grouped into, both as directories and as API routes.
const STUDENTS: &str = "students";
const PROMOTIONS: &str = "promotions";
const PROGRAM_INFO: &str = "program-info";

/// Build the record source described by the configuration.
pub fn from_configuration(
    configuration: &DataSourceConfiguration,
) -> Result<Box<dyn RecordSource>, ContextError> {
    match configuration {
        DataSourceConfiguration::Directory { root_path } => {
            Ok(Box::new(JsonDirectorySource::new(root_path.clone())))
        }
        DataSourceConfiguration::Http {
            base_url,
            token_environment_variable,
            timeout_seconds,
        } => {
            let bearer_token = match token_environment_variable {
                Some(variable) => Some(std::env::var(variable).map_err(|error| {
                    ContextError::with_error(
                        format!("Unable to read the bearer token from {:?}", variable),
                        &error,
                    )
                    .of_kind(ErrorKind::Configuration)
                })?),
                None => None,
            };
            let source = HttpRecordSource::new(
                base_url,
                bearer_token,
                Duration::from_secs(*timeout_seconds),
            )?;

            Ok(Box::new(source))
        }
    }
}

/// Reads the records from JSON files laid out as `students/<id>.json`,
/// `promotions/<id>.json` and `program-info/<id>.json` under a root directory.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root_path: PathBuf,
}

impl JsonDirectorySource {
    pub fn new<P: Into<PathBuf>>(root_path: P) -> Self {
        JsonDirectorySource {
            root_path: root_path.into(),
        }
    }

    fn read_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        record_id: &str,
    ) -> Result<T, ContextError> {
        let record_path = self
            .root_path
            .join(collection)
            .join(format!("{}.json", sanitize_identifier(record_id)?));
        log::trace!("Reading the record {:?}", record_path);

        let record_content = std::fs::read(&record_path).map_err(|error| {
            ContextError::with_error(format!("Unable to read the record {:?}", record_path), &error)
                .of_kind(ErrorKind::RecordFetchFailure)
        })?;
        serde_json::from_slice(&record_content).map_err(|error| {
            ContextError::with_error(format!("Unable to parse the record {:?}", record_path), &error)
                .of_kind(ErrorKind::RecordFetchFailure)
        })
    }
}

impl RecordSource for JsonDirectorySource {
    fn fetch_student(&self, student_id: &str) -> Result<Student, ContextError> {
        self.read_record(STUDENTS, student_id)
    }

    fn fetch_promotion(&self, promotion_id: &str) -> Result<Promotion, ContextError> {
        self.read_record(PROMOTIONS, promotion_id)
    }

    fn fetch_program_info(&self, promotion_id: &str) -> Result<ProgramInfo, ContextError> {
        self.read_record(PROGRAM_INFO, promotion_id)
    }
}

/// Fetches the records from the JSON endpoints of the data API,
/// `GET {base}/students/{id}` and so on, authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    base_url: String,
    bearer_token: Option<String>,
    client: Client,
}

impl HttpRecordSource {
    pub fn new(
        base_url: &str,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ContextError> {
        let client = Client::builder().timeout(timeout).build().map_err(|error| {
            ContextError::with_error("Unable to create the HTTP client", &error)
                .of_kind(ErrorKind::Configuration)
        })?;

        Ok(HttpRecordSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
            client,
        })
    }

    /// The URL a record is fetched from.
    pub fn record_url(&self, collection: &str, record_id: &str) -> Result<String, ContextError> {
        Ok(format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            sanitize_identifier(record_id)?
        ))
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        record_id: &str,
    ) -> Result<T, ContextError> {
        let url = self.record_url(collection, record_id)?;
        log::debug!("Fetching the record {}", url);

        let mut request = self.client.get(&url);
        if let Some(bearer_token) = &self.bearer_token {
            request = request.bearer_auth(bearer_token);
        }
        let response = request
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|error| {
                ContextError::with_error(format!("Unable to fetch the record {}", url), &error)
                    .of_kind(ErrorKind::RecordFetchFailure)
            })?;
        response.json::<T>().map_err(|error| {
            ContextError::with_error(format!("Unable to parse the record {}", url), &error)
                .of_kind(ErrorKind::RecordFetchFailure)
        })
    }
}

impl RecordSource for HttpRecordSource {
    fn fetch_student(&self, student_id: &str) -> Result<Student, ContextError> {
        self.get_record(STUDENTS, student_id)
    }

    fn fetch_promotion(&self, promotion_id: &str) -> Result<Promotion, ContextError> {
        self.get_record(PROMOTIONS, promotion_id)
    }

    fn fetch_program_info(&self, promotion_id: &str) -> Result<ProgramInfo, ContextError> {
        self.get_record(PROGRAM_INFO, promotion_id)
    }
}

/// Identifiers are opaque, but they end up in paths and URLs so they must not be able
/// to escape the collection they are looked up in.
fn sanitize_identifier(record_id: &str) -> Result<&str, ContextError> {
    let is_valid = !record_id.is_empty()
        && record_id
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '-' | '_'));
    if !is_valid {
        return Err(ContextError::with_context(format!(
            "The record identifier {:?} is not valid",
            record_id
        ))
        .of_kind(ErrorKind::RecordFetchFailure));
    }

    Ok(record_id)
}

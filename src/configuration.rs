use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContextError, ErrorKind};

/// The configuration of the report generation, read from a JSON file. Every field
/// is optional in the file and falls back to the values of `Default`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfiguration {
    pub page_geometry: PageGeometry,
    /// The width of the virtual page the fragments are laid out in, in CSS pixels.
    pub viewport_width: f32,
    /// The multiplier applied when rasterizing the laid out fragments.
    pub oversampling_factor: u32,
    /// The largest width or height, in pixels, a rasterized report may have.
    pub maximum_raster_dimension: u32,
    pub fonts: Option<FontPaths>,
    pub data_source: DataSourceConfiguration,
    pub output_directory: PathBuf,
}

impl Default for ReportConfiguration {
    fn default() -> Self {
        ReportConfiguration {
            page_geometry: PageGeometry::default(),
            viewport_width: 794.0,
            oversampling_factor: 2,
            maximum_raster_dimension: 60_000,
            fonts: None,
            data_source: DataSourceConfiguration::default(),
            output_directory: PathBuf::from("reports"),
        }
    }
}

/// The geometry of the physical pages, in millimeters.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for PageGeometry {
    /// A4 with 10 millimeters margins.
    fn default() -> Self {
        PageGeometry {
            page_width: 210.0,
            page_height: 297.0,
            margin_top: 10.0,
            margin_bottom: 10.0,
            margin_left: 10.0,
            margin_right: 10.0,
        }
    }
}

impl PageGeometry {
    pub fn usable_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn usable_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    fn validate(&self) -> Result<(), ContextError> {
        if self.usable_width() <= 0.0 || self.usable_height() <= 0.0 {
            return Err(ContextError::with_context(format!(
                "The margins leave no usable area on a {}x{} page",
                self.page_width, self.page_height
            ))
            .of_kind(ErrorKind::Configuration));
        }

        Ok(())
    }
}

/// The TTF files used for the regular and the bold text, the embedded DejaVu Sans
/// fonts are used when they are not given.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FontPaths {
    pub regular_font_path: PathBuf,
    pub bold_font_path: PathBuf,
}

/// Where the student, promotion and program records are read from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DataSourceConfiguration {
    #[serde(rename_all = "camelCase")]
    Directory { root_path: PathBuf },
    #[serde(rename_all = "camelCase")]
    Http {
        base_url: String,
        /// The environment variable holding the bearer token, if any.
        #[serde(default)]
        token_environment_variable: Option<String>,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
    },
}

impl Default for DataSourceConfiguration {
    fn default() -> Self {
        DataSourceConfiguration::Directory {
            root_path: PathBuf::from("data"),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

impl ReportConfiguration {
    pub fn from_path(configuration_file_path: &Path) -> Result<Self, ContextError> {
        let configuration_file_contents = std::fs::read_to_string(configuration_file_path)
            .map_err(|error| {
                ContextError::with_error(
                    format!(
                        "Failed to read the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
                .of_kind(ErrorKind::Configuration)
            })?;
        let configuration: ReportConfiguration =
            serde_json::from_str(&configuration_file_contents).map_err(|error| {
                ContextError::with_error(
                    format!(
                        "Failed to parse the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
                .of_kind(ErrorKind::Configuration)
            })?;
        configuration.validate()?;

        Ok(configuration)
    }

    /// Checks that the values can actually be used for rendering.
    pub fn validate(&self) -> Result<(), ContextError> {
        self.page_geometry.validate()?;
        if self.viewport_width <= 0.0 {
            return Err(ContextError::with_context(format!(
                "The viewport width must be positive, found {}",
                self.viewport_width
            ))
            .of_kind(ErrorKind::Configuration));
        }
        if self.oversampling_factor == 0 {
            return Err(
                ContextError::with_context("The oversampling factor must be at least 1")
                    .of_kind(ErrorKind::Configuration),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configuration_uses_the_defaults() {
        let configuration: ReportConfiguration = serde_json::from_str("{}").unwrap();

        assert_eq!(configuration, ReportConfiguration::default());
        assert_eq!(configuration.page_geometry.usable_width(), 190.0);
        assert_eq!(configuration.page_geometry.usable_height(), 277.0);
    }

    #[test]
    fn http_data_source_is_parsed() {
        let configuration: ReportConfiguration = serde_json::from_str(
            r#"{
                "oversamplingFactor": 3,
                "dataSource": {
                    "type": "http",
                    "baseUrl": "https://api.example.org",
                    "tokenEnvironmentVariable": "REPORTS_TOKEN"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(configuration.oversampling_factor, 3);
        assert_eq!(
            configuration.data_source,
            DataSourceConfiguration::Http {
                base_url: "https://api.example.org".into(),
                token_environment_variable: Some("REPORTS_TOKEN".into()),
                timeout_seconds: 30,
            }
        );
    }

    #[test]
    fn margins_larger_than_the_page_are_rejected() {
        let configuration = ReportConfiguration {
            page_geometry: PageGeometry {
                margin_left: 120.0,
                margin_right: 120.0,
                ..PageGeometry::default()
            },
            ..ReportConfiguration::default()
        };

        assert_eq!(
            configuration.validate().unwrap_err().kind,
            ErrorKind::Configuration
        );
    }
}

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::configuration::PageGeometry;
use crate::error::{ContextError, ErrorKind};
use crate::paginator::PageImage;
use crate::pdf::{ImageXObject, PdfDocument, PdfMetadata};

/// A finished report: its pages, in order, and what is needed to serialize it.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDocument {
    pub filename: String,
    pub title: String,
    pub page_geometry: PageGeometry,
    pub creation_date: OffsetDateTime,
    pub pages: Vec<PageImage>,
}

/// The hexadecimal SHA-256 digest of the given parts, separated by a zero byte.
fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part);
    }

    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

impl OutputDocument {
    /// The permanent half of the PDF `ID`, stable across regenerations of the same report.
    pub fn document_id(&self) -> String {
        sha256_hex(&[self.filename.as_bytes()])[..32].to_string()
    }

    /// The changing half of the PDF `ID`, which depends on the content of this revision.
    pub fn instance_id(&self) -> String {
        let page_count = self.pages.len().to_string();
        let date = self.creation_date.unix_timestamp().to_string();
        sha256_hex(&[
            self.filename.as_bytes(),
            self.title.as_bytes(),
            page_count.as_bytes(),
            date.as_bytes(),
        ])[..32]
            .to_string()
    }

    /// Convert the pages into a PDF document, one page image per physical page placed at
    /// the margins of the page.
    pub fn to_pdf_document(&self) -> Result<PdfDocument, ContextError> {
        let mut pdf_document = PdfDocument::new(self.document_id());

        for page in &self.pages {
            let (page_index, layer_index) = pdf_document
                .add_page_with_layer(self.page_geometry.page_width, self.page_geometry.page_height);
            let slice = &page.slice;
            pdf_document.add_image_to_layer_in_page(
                ImageXObject::from_rgba(&page.image),
                (slice.dest_x, slice.dest_y, slice.dest_width, slice.dest_height),
                layer_index,
                page_index,
            )?;
        }
        pdf_document.write_all(
            self.instance_id(),
            &PdfMetadata {
                title: self.title.clone(),
                creation_date: self.creation_date,
            },
        )?;
        pdf_document.optimize();

        Ok(pdf_document)
    }

    /// Serialize the document into the bytes of a PDF file.
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>, ContextError> {
        self.to_pdf_document()
            .and_then(|mut pdf_document| pdf_document.save_to_bytes())
            .map_err(|error| error.wrap(format!("Unable to write the PDF document {:?}", self.filename)))
    }

    /// Save every page as a PNG image named after the document, for inspection.
    pub fn save_page_images(&self, directory_path: &Path) -> Result<Vec<PathBuf>, ContextError> {
        std::fs::create_dir_all(directory_path).map_err(|error| {
            ContextError::with_error(
                format!("Unable to create the directory {:?}", directory_path),
                &error,
            )
            .of_kind(ErrorKind::Output)
        })?;
        let file_stem = self.filename.trim_end_matches(".pdf");

        self.pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                let page_path = directory_path.join(format!("{}-page-{}.png", file_stem, index + 1));
                page.image.save(&page_path).map_err(|error| {
                    ContextError::with_error(format!("Unable to save the page {:?}", page_path), &error)
                        .of_kind(ErrorKind::Output)
                })?;
                log::debug!("Saved the page image {:?}", page_path);

                Ok(page_path)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::paginator::PageSlice;

    fn document(page_count: usize) -> OutputDocument {
        let page = PageImage {
            slice: PageSlice {
                source_y_start: 0,
                source_height: 20,
                dest_x: 10.0,
                dest_y: 10.0,
                dest_width: 190.0,
                dest_height: 95.0,
            },
            image: RgbaImage::from_pixel(40, 20, image::Rgba([255, 255, 255, 255])),
        };

        OutputDocument {
            filename: "technical_Ada-Lovelace.pdf".into(),
            title: "Technical tracking - Ada Lovelace".into(),
            page_geometry: PageGeometry::default(),
            creation_date: OffsetDateTime::UNIX_EPOCH,
            pages: vec![page; page_count],
        }
    }

    #[test]
    fn identifiers_are_deterministic() {
        let first = document(2);
        let second = document(2);

        assert_eq!(first.document_id().len(), 32);
        assert_eq!(first.document_id(), second.document_id());
        assert_eq!(first.instance_id(), second.instance_id());
        assert_ne!(first.instance_id(), document(3).instance_id());
    }

    #[test]
    fn every_page_becomes_a_pdf_page() {
        let pdf_document_bytes = document(3).to_pdf_bytes().unwrap();
        let loaded_document = lopdf::Document::load_mem(&pdf_document_bytes).unwrap();

        assert_eq!(loaded_document.get_pages().len(), 3);
    }

    #[test]
    fn page_images_are_dumped() {
        let directory = tempfile::tempdir().unwrap();
        let page_paths = document(2).save_page_images(directory.path()).unwrap();

        assert_eq!(page_paths.len(), 2);
        assert!(page_paths[1].ends_with("technical_Ada-Lovelace-page-2.png"));
        assert!(page_paths.iter().all(|page_path| page_path.exists()));
    }
}

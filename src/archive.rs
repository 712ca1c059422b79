use std::io::{Cursor, Write as _};

use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::{ContextError, ErrorKind};

/// The documents of a batch, bundled into a single zip archive.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArchiveBundle {
    /// The entries in the order they were added, every filename unique.
    entries: Vec<(String, Vec<u8>)>,
}

fn archival_error(context: &str, error: &dyn std::error::Error) -> ContextError {
    ContextError::with_error(context, error).of_kind(ErrorKind::ArchivalFailure)
}

impl ArchiveBundle {
    pub fn new() -> Self {
        ArchiveBundle::default()
    }

    /// Add a document and return the name of its entry. Two subjects may share a name,
    /// in which case the later entries get a `-2`, `-3`... suffix before the extension.
    pub fn add(&mut self, filename: &str, content: Vec<u8>) -> String {
        let entry_name = self.unique_filename(filename);
        if entry_name != filename {
            log::warn!("The filename {:?} is already taken, using {:?}", filename, entry_name);
        }
        self.entries.push((entry_name.clone(), content));

        entry_name
    }

    fn unique_filename(&self, filename: &str) -> String {
        let is_taken = |candidate: &str| self.entries.iter().any(|(name, _)| name == candidate);
        if !is_taken(filename) {
            return filename.to_string();
        }
        let (stem, extension) = match filename.rfind('.') {
            Some(index) if index > 0 => filename.split_at(index),
            _ => (filename, ""),
        };

        (2..)
            .map(|suffix| format!("{}-{}{}", stem, suffix, extension))
            .find(|candidate| !is_taken(candidate))
            .unwrap_or_else(|| filename.to_string())
    }

    /// Compress the entries into the bytes of a zip archive.
    pub fn finish(self) -> Result<Vec<u8>, ContextError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        // A fixed modification time keeps the archives of identical batches identical
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        for (filename, content) in &self.entries {
            zip.start_file(filename.as_str(), options)
                .map_err(|error| archival_error(&format!("Unable to add {:?} to the archive", filename), &error))?;
            zip.write_all(content)
                .map_err(|error| archival_error(&format!("Unable to compress {:?}", filename), &error))?;
        }
        let archive_bytes = zip
            .finish()
            .map_err(|error| archival_error("Unable to finalize the archive", &error))?
            .into_inner();
        log::debug!(
            "Bundled {} documents into an archive of {} bytes",
            self.entries.len(),
            archive_bytes.len()
        );

        Ok(archive_bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use super::*;

    #[test]
    fn entries_are_read_back_in_order() {
        let mut bundle = ArchiveBundle::new();
        bundle.add("technical_Ada-Lovelace.pdf", b"first".to_vec());
        bundle.add("technical_Alan-Turing.pdf", b"second".to_vec());
        let archive_bytes = bundle.finish().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive
            .by_name("technical_Alan-Turing.pdf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "second");
        assert_eq!(archive.by_index(0).unwrap().name(), "technical_Ada-Lovelace.pdf");
    }

    #[test]
    fn duplicate_filenames_get_a_suffix() {
        let mut bundle = ArchiveBundle::new();
        let names: Vec<String> = (0..3)
            .map(|_| bundle.add("technical_Jane-Doe.pdf", Vec::new()))
            .collect();

        assert_eq!(
            names,
            vec![
                "technical_Jane-Doe.pdf",
                "technical_Jane-Doe-2.pdf",
                "technical_Jane-Doe-3.pdf"
            ]
        );
        assert_eq!(bundle.add("README", Vec::new()), "README");
        assert_eq!(bundle.add("README", Vec::new()), "README-2");
    }

    #[test]
    fn identical_bundles_give_identical_archives() {
        let bundle = || {
            let mut bundle = ArchiveBundle::new();
            bundle.add("transversal_Jane-Doe.pdf", vec![7; 1024]);
            bundle
        };

        assert_eq!(bundle().finish().unwrap(), bundle().finish().unwrap());
    }
}

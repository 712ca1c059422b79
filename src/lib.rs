//! Cohort reports is the engine generating the PDF reports of a bootcamp: the technical and
//! transversal tracking of every student, their project reports, the program charter and the
//! technical description of a promotion.
//!
//! A report goes through a fixed pipeline. Its records are fetched from a `RecordSource`, turned
//! into a markup fragment by the `template` module, laid out on a page of fixed width by the
//! `layout` module, rasterized into one tall bitmap by the `raster` module and cut into pages by
//! the `paginator` module, which avoids splitting table rows across pages. The `orchestrator`
//! drives this pipeline for a whole batch of students, one document after the other, and bundles
//! the documents into a zip archive when there is more than one.

/// The module where the records the reports are built from are defined.
///
/// # Introduction
///
/// The `ReportRequest` names the kind of report, the students it is generated for and their
/// promotion. The `Student`, `Promotion` and `ProgramInfo` records mirror the JSON served by the
/// data API: every field which may be missing is optional, and collections default to empty,
/// so that a partial record still produces a report.
pub mod records;

/// This module contains the `ContextError` type which is the error type used throughout this library.
///
/// Every error carries a human readable context, the message of the error it was caused by if any,
/// and an `ErrorKind` telling which stage failed: a missing rendering capability, a record which
/// could not be fetched, a rasterization or an archival failure, and so on.
pub mod error;

/// The JSON configuration of the pipeline: page geometry, rasterization settings, fonts,
/// data source and output directory.
pub mod configuration;

/// The data API the records are read from, either a directory of JSON files or HTTP endpoints.
pub mod source;

/// The report fragments, built from the records with every interpolated string escaped.
pub mod template;

/// The stylesheet shared by every report.
pub mod stylesheet;

/// The fonts used to measure and draw the text.
pub mod fonts;

/// The module where the fragments are laid out and their row boundaries measured.
///
/// # Introduction
///
/// The entry point of this module is the `LayoutMeasurer` trait, implemented by the
/// `RenderingContext`. A context is opened for a single document with the width of the virtual
/// page, and disposed of once the document has been rasterized. Laying out a fragment returns the
/// drawing commands of its content, its total height and the bottom edge of every table row.
pub mod layout;

/// The conversion of laid out fragments into bitmaps.
pub mod raster;

/// The module where the bitmaps are cut into pages.
///
/// # Introduction
///
/// The algorithm lives in `plan_slices`, which only deals with lengths: it is given the total
/// height of the content, the row boundaries and the usable height of a page, and returns the
/// bands of content assigned to each page. The `Paginator` converts the bitmap and its row
/// boundaries into millimeters, plans the slices and crops the bitmap accordingly.
pub mod paginator;

/// The module were the `PdfDocument` interface for working with PDF documents is presented.
///
/// # Introduction
///
/// The main component of this module is the struct `PdfDocument`. It offers the convenience functions
/// `add_page_with_layer`, `add_image_to_layer_in_page`, `write_all` and `save_to_bytes` which allow to
/// assemble a PDF document page by page, while keeping the low-level details of `lopdf` hidden
/// below a curtain of private methods.
pub mod pdf;

/// The finished reports and their conversion into PDF files.
pub mod document;

/// The zip archives the batches of reports are bundled into.
pub mod archive;

/// The generation of a batch of reports, from the request to the file to be saved.
pub mod orchestrator;

use std::io::BufWriter;
use std::mem;

use lopdf::content::Operation;
use time::OffsetDateTime;

use crate::error::{ContextError, ErrorKind};

/// A content stream of a page. Usually, one page has a single layer.
#[derive(Debug, Clone, Default)]
pub struct PdfLayer {
    /// The operations of the layer, in drawing order.
    pub(crate) operations: Vec<Operation>,
}

impl PdfLayer {
    /// Encode the operations of the layer into a stream, isolated in its own graphics state.
    fn into_stream(self) -> Result<lopdf::Stream, ContextError> {
        let mut operations = Vec::with_capacity(self.operations.len() + 2);
        // In the PDF specification the q/Q operators save and restore the graphics state
        operations.push(Operation::new("q", vec![]));
        operations.extend(self.operations);
        operations.push(Operation::new("Q", vec![]));

        let stream_content = lopdf::content::Content { operations }.encode().map_err(|error| {
            ContextError::with_error("Failed to encode the PDF layer content", &error)
                .of_kind(ErrorKind::Output)
        })?;

        Ok(lopdf::Stream::new(lopdf::Dictionary::new(), stream_content))
    }
}

/// The low-level image representation for a PDF document: 8 bits per component RGB samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageXObject {
    /// Width of the image in samples (original width, not scaled width).
    pub width: u32,
    /// Height of the image in samples (original height, not scaled height).
    pub height: u32,
    /// Should the image be interpolated when scaled?
    pub interpolate: bool,
    /// The RGB samples, row by row from the top.
    pub image_data: Vec<u8>,
}

impl ImageXObject {
    /// Build the image from an RGBA bitmap. The alpha channel is dropped, the bitmaps
    /// of the reports are opaque.
    pub fn from_rgba(bitmap: &image::RgbaImage) -> Self {
        let (width, height) = bitmap.dimensions();
        let image_data = bitmap
            .pixels()
            .flat_map(|pixel| [pixel.0[0], pixel.0[1], pixel.0[2]])
            .collect();

        ImageXObject {
            width,
            height,
            interpolate: true,
            image_data,
        }
    }
}

impl From<ImageXObject> for lopdf::Stream {
    fn from(value: ImageXObject) -> Self {
        use lopdf::Object::*;

        let dictionary = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("XObject".into())),
            ("Subtype", Name("Image".into())),
            ("Width", Integer(value.width as i64)),
            ("Height", Integer(value.height as i64)),
            ("ColorSpace", Name("DeviceRGB".into())),
            ("BitsPerComponent", Integer(8)),
            ("Interpolate", Boolean(value.interpolate)),
        ]);

        lopdf::Stream::new(dictionary, value.image_data)
    }
}

/// Named reference to an image `XObject`.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub struct XObjectReference(String);

impl XObjectReference {
    /// Creates a new reference for an `XObject` from a number.
    pub fn new(index: usize) -> Self {
        Self(format!("X{index}"))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// The images of a page, in the order they were added.
#[derive(Default, Debug, Clone)]
pub struct XObjectMap(Vec<(XObjectReference, ImageXObject)>);

impl XObjectMap {
    fn add(&mut self, image: ImageXObject) -> XObjectReference {
        let reference = XObjectReference::new(self.0.len());
        self.0.push((reference.clone(), image));

        reference
    }

    /// Inserts the `XObject`s into the document, simultaneously constructing a PDF dictionary of them.
    fn into_with_document(self, document: &mut lopdf::Document) -> lopdf::Dictionary {
        self.0
            .into_iter()
            .map(|(reference, image)| {
                let stream: lopdf::Stream = image.into();
                let object_reference = document.add_object(stream);
                (reference.0, lopdf::Object::Reference(object_reference))
            })
            .collect()
    }
}

/// The representation of a PDF page, in points.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    pub layers: Vec<PdfLayer>,
    pub(crate) xobjects: XObjectMap,
}

impl PdfPage {
    /// Insert the images of the page into the document and encode its layers into a single
    /// content stream. Returns the resources dictionary and the content stream.
    fn collect_resources_and_content(
        self,
        inner_document: &mut lopdf::Document,
    ) -> Result<(lopdf::Dictionary, lopdf::Stream), ContextError> {
        let mut resource_dictionary = lopdf::Dictionary::new();
        let xobjects_dictionary = self.xobjects.into_with_document(inner_document);
        if !xobjects_dictionary.is_empty() {
            resource_dictionary.set("XObject", lopdf::Object::Dictionary(xobjects_dictionary));
        }

        // Merge the streams of the individual layers into one unified stream
        let mut merged_content = Vec::<u8>::new();
        for layer in self.layers {
            merged_content.append(&mut layer.into_stream()?.content);
        }

        Ok((
            resource_dictionary,
            lopdf::Stream::new(lopdf::Dictionary::new(), merged_content),
        ))
    }
}

/// Converts millimeters to points, the unit of the PDF specification.
pub fn millimeters_to_points(millimeters: f32) -> f32 {
    millimeters * 2.834646
}

/// The descriptive metadata written in the information dictionary of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfMetadata {
    pub title: String,
    pub creation_date: OffsetDateTime,
}

/// This struct represents the actual PDF document on a high-level. It is an interface to the underlying
/// `lopdf::Document` with the addition of the PDF pages and the document ID.
///
/// The pages are added with `add_page_with_layer`, filled with `add_image_to_layer_in_page`,
/// then `write_all` assembles the document tree and `save_to_bytes` serializes it.
pub struct PdfDocument {
    /// The underlying PDF document: this is a low-level interface and shouldn't be directly interacted with
    /// unless strictly necessary.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, it is used to in order to set the PDF `ID` tag.
    pub identifier: String,
    pub(crate) pages: Vec<PdfPage>,
}

impl PdfDocument {
    /// Create a new `PdfDocument` by defaulting the underlying PDF document to version 1.5
    /// of the PDF specification and customly specifying the PDF identifier.
    ///
    /// # Arguments
    ///
    /// * `pdf_document_identifier` - The identifier to be given to the PDF document.
    pub fn new(pdf_document_identifier: String) -> Self {
        PdfDocument {
            inner_document: lopdf::Document::with_version("1.5"),
            identifier: pdf_document_identifier,
            pages: Vec::new(),
        }
    }

    /// Adds a page of given width and height in millimeters with an empty layer for contents to be added to.
    /// The function returns the index of the page and of the layer in the page, these are to be passed
    /// to the other functions when calling them, such as to `add_image_to_layer_in_page`.
    ///
    /// # Arguments
    ///
    /// * `page_width` - The width of the PDF page to be created as expressed in millimeters.
    /// * `page_height` - The height of the PDF page to be created as expressed in millimeters.
    pub fn add_page_with_layer(&mut self, page_width: f32, page_height: f32) -> (usize, usize) {
        self.pages.push(PdfPage {
            width: millimeters_to_points(page_width),
            height: millimeters_to_points(page_height),
            layers: vec![PdfLayer::default()],
            xobjects: XObjectMap::default(),
        });

        (self.pages.len() - 1, 0)
    }

    /// Draw an image on the given layer of the given page, scaled into a rectangle whose
    /// position and size are expressed in millimeters from the top left corner of the page.
    ///
    /// # Arguments
    ///
    /// * `image` - The image to be drawn.
    /// * `rectangle` - The `(x, y, width, height)` of the image on the page, in millimeters.
    /// * `layer_index` - The index of the layer in the page, as returned by `add_page_with_layer`.
    /// * `page_index` - The index of the page, as returned by `add_page_with_layer`.
    pub fn add_image_to_layer_in_page(
        &mut self,
        image: ImageXObject,
        rectangle: (f32, f32, f32, f32),
        layer_index: usize,
        page_index: usize,
    ) -> Result<XObjectReference, ContextError> {
        if image.width == 0 || image.height == 0 {
            return Err(ContextError::with_context(format!(
                "Unable to draw an empty {}x{} image on the page {}",
                image.width, image.height, page_index
            ))
            .of_kind(ErrorKind::Output));
        }
        let (x, y, width, height) = rectangle;
        let page = self.get_mut_page(page_index)?;
        let page_height = page.height;
        let reference = page.xobjects.add(image);

        // The image space is the unit square, scaled and moved onto the rectangle. The PDF
        // origin being the bottom left corner, the y axis is flipped
        let (width, height) = (millimeters_to_points(width), millimeters_to_points(height));
        let x = millimeters_to_points(x);
        let y = page_height - millimeters_to_points(y) - height;
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    x.into(),
                    y.into(),
                ],
            ),
            Operation::new("Do", vec![lopdf::Object::Name(reference.0.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ];
        self.add_operations_to_layer_in_page(layer_index, page_index, operations)?;

        Ok(reference)
    }

    /// Write the pages so far specified into the underlying PDF document and finalize it.
    ///
    /// # Arguments
    ///
    /// * `instance_id` - The second half of the `ID` tag, which identifies this revision of the document.
    /// * `metadata` - The title and the creation date of the document.
    pub fn write_all(&mut self, instance_id: String, metadata: &PdfMetadata) -> Result<(), ContextError> {
        use lopdf::Object::*;
        use lopdf::StringFormat::*;

        let timestamp = to_pdf_timestamp_format(&metadata.creation_date);
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Trapped", "False".into()),
            ("CreationDate", String(timestamp.clone().into_bytes(), Literal)),
            ("ModDate", String(timestamp.into_bytes(), Literal)),
            ("Title", text_string(&metadata.title)),
            (
                "Producer",
                String(
                    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")).into_bytes(),
                    Literal,
                ),
            ),
            ("Identifier", String(self.identifier.clone().into_bytes(), Literal)),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        // Construct the catalog, required by the PDF specification
        let pages_id = self.inner_document.new_object_id();
        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("PageLayout", "OneColumn".into()),
            ("PageMode", "UseNone".into()),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        self.inner_document.trailer.set("Root", Reference(catalog_id));
        self.inner_document.trailer.set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), Literal),
                String(instance_id.into_bytes(), Literal),
            ]),
        );

        let mut page_ids = Vec::<lopdf::Object>::new();
        for page in mem::take(&mut self.pages) {
            let (width, height) = (page.width, page.height);
            let mut page_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", "Page".into()),
                ("Rotate", Integer(0)),
                (
                    "MediaBox",
                    vec![0.into(), 0.into(), width.into(), height.into()].into(),
                ),
                (
                    "TrimBox",
                    vec![0.into(), 0.into(), width.into(), height.into()].into(),
                ),
                (
                    "CropBox",
                    vec![0.into(), 0.into(), width.into(), height.into()].into(),
                ),
                ("Parent", Reference(pages_id)),
            ]);

            let (resource_dictionary, content_stream) =
                page.collect_resources_and_content(&mut self.inner_document)?;
            let resources_id = self.inner_document.add_object(Dictionary(resource_dictionary));
            page_dictionary.set("Resources", Reference(resources_id));
            let content_id = self.inner_document.add_object(content_stream);
            page_dictionary.set("Contents", Reference(content_id));

            let page_id = self.inner_document.add_object(page_dictionary);
            page_ids.push(Reference(page_id));
        }

        // The pages dictionary is written last, once all the kids are known
        let pages = lopdf::Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Count", Integer(page_ids.len() as i64)),
            ("Kids", Array(page_ids)),
        ]);
        self.inner_document.objects.insert(pages_id, Dictionary(pages));

        Ok(())
    }

    /// Optimize the PDF document (only superficially) and compress its streams.
    pub fn optimize(&mut self) {
        self.inner_document.prune_objects();
        self.inner_document.delete_zero_length_streams();
        self.inner_document.renumber_objects();
        self.inner_document.compress();
    }

    /// Save the `PdfDocument` to bytes in order for it to be written to a file or archived.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, ContextError> {
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            ContextError::with_error("Error while saving the PDF document to bytes", &error)
                .of_kind(ErrorKind::Output)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    fn add_operations_to_layer_in_page(
        &mut self,
        layer_index: usize,
        page_index: usize,
        operations: Vec<Operation>,
    ) -> Result<(), ContextError> {
        let pdf_layer = self
            .get_mut_page(page_index)?
            .layers
            .get_mut(layer_index)
            .ok_or(ContextError::with_context(format!(
                "Failed to find the layer with index {}",
                layer_index
            )))?;
        pdf_layer.operations.extend(operations);

        Ok(())
    }

    fn get_mut_page(&mut self, page_index: usize) -> Result<&mut PdfPage, ContextError> {
        self.pages
            .get_mut(page_index)
            .ok_or(ContextError::with_context(format!(
                "Failed to find the page with index {}",
                page_index
            )))
    }
}

/// Encodes a text string of the information dictionary. ASCII text is written as is,
/// anything else as UTF-16BE preceded by its byte order mark.
fn text_string(text: &str) -> lopdf::Object {
    if text.is_ascii() {
        return lopdf::Object::String(text.as_bytes().to_vec(), lopdf::StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));

    lopdf::Object::String(bytes, lopdf::StringFormat::Hexadecimal)
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

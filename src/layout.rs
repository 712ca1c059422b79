//! The layout of the report fragments on a fixed-width virtual page.
//!
//! A fragment is parsed into a tree of elements, styled with the shared stylesheet and
//! laid out top to bottom: block elements stack vertically, inline content is wrapped
//! into lines measured with the glyph metrics of the fonts, and tables are laid out row
//! by row. The result is the list of drawing commands the rasterizer executes, the
//! total height of the content, and the bottom edge of every table row, which is what
//! the paginator uses to avoid cutting rows in half.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{ContextError, ErrorKind};
use crate::fonts::FontSet;
use crate::stylesheet::{Color, ComputedStyle, Stylesheet};

/// The bottom edge of a table row, measured in CSS pixels from the top of the content.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RowBoundary {
    pub offset_from_top: f32,
}

/// The geometry of a laid out fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub width: f32,
    pub height: f32,
    /// Sorted, strictly positive.
    pub row_boundaries: Vec<RowBoundary>,
}

/// A drawing operation, in CSS pixels relative to the top left corner of the content.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Text {
        x: f32,
        baseline: f32,
        text: String,
        font_size: f32,
        bold: bool,
        color: Color,
    },
}

/// A fragment once laid out, ready to be rasterized.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutFragment {
    pub measurement: Measurement,
    pub commands: Vec<DrawCommand>,
}

/// Lays out fragments and extracts their geometry. There is one implementation per
/// rendering environment; the one of this crate measures text with real glyph metrics.
pub trait LayoutMeasurer {
    fn lay_out(&self, fragment: &str, stylesheet: &Stylesheet) -> Result<LaidOutFragment, ContextError>;

    fn measure(&self, fragment: &str, stylesheet: &Stylesheet) -> Result<Measurement, ContextError> {
        Ok(self.lay_out(fragment, stylesheet)?.measurement)
    }
}

/// The isolated context a single document is laid out in. It is opened for one
/// document and dropped once the document has been rasterized, nothing it holds is
/// shared with the layout of any other document.
pub struct RenderingContext<'f> {
    fonts: &'f FontSet,
    viewport_width: f32,
    label: String,
}

impl<'f> RenderingContext<'f> {
    pub fn open<S: Into<String>>(fonts: &'f FontSet, viewport_width: f32, label: S) -> Self {
        let label = label.into();
        log::trace!("Opened the rendering context of {:?}", label);
        RenderingContext {
            fonts,
            viewport_width,
            label,
        }
    }

    pub fn fonts(&self) -> &'f FontSet {
        self.fonts
    }
}

impl Drop for RenderingContext<'_> {
    fn drop(&mut self) {
        log::trace!("Disposed the rendering context of {:?}", self.label);
    }
}

impl LayoutMeasurer for RenderingContext<'_> {
    fn lay_out(&self, fragment: &str, stylesheet: &Stylesheet) -> Result<LaidOutFragment, ContextError> {
        let nodes = parse_fragment(fragment)?;
        let root_style = stylesheet.root_style();
        let mut engine = LayoutEngine {
            fonts: self.fonts,
            stylesheet,
            commands: Vec::new(),
            row_boundaries: Vec::new(),
        };
        let height = engine.lay_out_children(&nodes, &root_style, 0.0, 0.0, self.viewport_width);

        let mut row_boundaries = engine.row_boundaries;
        row_boundaries.retain(|offset| *offset > 0.0);
        row_boundaries.sort_by(|a, b| a.total_cmp(b));
        row_boundaries.dedup();
        log::debug!(
            "Laid out {:?}: {} commands, {:.1}px high, {} rows",
            self.label,
            engine.commands.len(),
            height,
            row_boundaries.len()
        );

        Ok(LaidOutFragment {
            measurement: Measurement {
                width: self.viewport_width,
                height,
                row_boundaries: row_boundaries
                    .into_iter()
                    .map(|offset_from_top| RowBoundary { offset_from_top })
                    .collect(),
            },
            commands: engine.commands,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    tag: String,
    classes: Vec<String>,
    /// The `width` attribute of table cells, as a percentage of the table.
    width_percent: Option<f32>,
    children: Vec<Node>,
}

impl Element {
    fn class_names(&self) -> Vec<&str> {
        self.classes.iter().map(String::as_str).collect()
    }

    fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }
}

const INLINE_TAGS: [&str; 5] = ["strong", "em", "span", "b", "br"];
const LIST_INDENT: f32 = 18.0;
const BULLET: &str = "•";

fn is_inline(node: &Node) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Element(element) => INLINE_TAGS.contains(&element.tag.as_str()),
    }
}

fn layout_error(context: String, error: &dyn std::error::Error) -> ContextError {
    ContextError::with_error(context, error).of_kind(ErrorKind::Layout)
}

fn parse_element(start: &BytesStart) -> Result<Element, ContextError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_lowercase();
    let mut element = Element {
        tag,
        classes: Vec::new(),
        width_percent: None,
        children: Vec::new(),
    };

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|error| {
            layout_error(format!("Invalid attribute on <{}>", element.tag), &error)
        })?;
        let value = attribute.unescape_value().map_err(|error| {
            layout_error(format!("Invalid attribute value on <{}>", element.tag), &error)
        })?;
        match attribute.key.as_ref() {
            b"class" => {
                element.classes = value.split_whitespace().map(str::to_string).collect();
            }
            b"width" => {
                element.width_percent = value.trim().trim_end_matches('%').parse::<f32>().ok();
            }
            _ => {}
        }
    }

    Ok(element)
}

/// Parse a fragment into its top-level nodes. Fragments must be well-formed.
fn parse_fragment(fragment: &str) -> Result<Vec<Node>, ContextError> {
    let mut reader = Reader::from_str(fragment);
    // The bottom of the stack collects the top-level nodes
    let mut stack: Vec<Element> = vec![Element {
        tag: "body".into(),
        classes: Vec::new(),
        width_percent: None,
        children: Vec::new(),
    }];

    loop {
        let event = reader.read_event().map_err(|error| {
            layout_error(
                format!(
                    "Unable to parse the fragment at position {}",
                    reader.buffer_position()
                ),
                &error,
            )
        })?;
        match event {
            Event::Start(start) => stack.push(parse_element(&start)?),
            Event::Empty(start) => {
                let element = parse_element(&start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Element(element));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(ContextError::with_context(
                        "The fragment closes an element which was never opened",
                    )
                    .of_kind(ErrorKind::Layout));
                }
                if let (Some(element), Some(parent)) = (stack.pop(), stack.last_mut()) {
                    parent.children.push(Node::Element(element));
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|error| {
                    layout_error("Unable to unescape the text of the fragment".into(), &error)
                })?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            // Comments, declarations and processing instructions have no layout
            _ => {}
        }
    }

    match stack.pop() {
        Some(root) if stack.is_empty() => Ok(root.children),
        Some(unclosed) => Err(ContextError::with_context(format!(
            "The element <{}> of the fragment is never closed",
            unclosed.tag
        ))
        .of_kind(ErrorKind::Layout)),
        None => Ok(Vec::new()),
    }
}

/// A word, or a forced line break, of the inline content of a block.
#[derive(Debug, Clone)]
enum InlineToken {
    Word {
        text: String,
        space_before: bool,
        font_size: f32,
        bold: bool,
        color: Color,
    },
    LineBreak,
}

/// A word placed on a line, the offset is relative to the start of the line.
struct PlacedWord {
    offset: f32,
    text: String,
    font_size: f32,
    bold: bool,
    color: Color,
}

struct LayoutEngine<'a> {
    fonts: &'a FontSet,
    stylesheet: &'a Stylesheet,
    commands: Vec<DrawCommand>,
    row_boundaries: Vec<f32>,
}

impl LayoutEngine<'_> {
    /// Lay out a sequence of sibling nodes and return the vertical position after them.
    fn lay_out_children(
        &mut self,
        children: &[Node],
        style: &ComputedStyle,
        x: f32,
        y: f32,
        width: f32,
    ) -> f32 {
        let mut cursor = y;
        let mut inline_run: Vec<&Node> = Vec::new();

        for child in children {
            if is_inline(child) {
                inline_run.push(child);
                continue;
            }
            cursor = self.lay_out_inline(&inline_run, style, x, cursor, width);
            inline_run.clear();
            if let Node::Element(element) = child {
                cursor = self.lay_out_block(element, style, x, cursor, width);
            }
        }

        self.lay_out_inline(&inline_run, style, x, cursor, width)
    }

    /// Lay out a block element, its margins included.
    fn lay_out_block(
        &mut self,
        element: &Element,
        parent_style: &ComputedStyle,
        x: f32,
        y: f32,
        width: f32,
    ) -> f32 {
        let style = self
            .stylesheet
            .compute(&element.tag, &element.class_names(), parent_style);
        let top = y + style.margin_top;
        let decoration_index = self.commands.len();
        let inner_x = x + style.padding;
        let inner_width = (width - 2.0 * style.padding).max(0.0);
        let inner_top = top + style.padding;

        let inner_bottom = match element.tag.as_str() {
            "table" => self.lay_out_table(element, &style, inner_x, inner_top, inner_width),
            "ul" | "ol" => self.lay_out_list(element, &style, inner_x, inner_top, inner_width),
            _ => self.lay_out_children(&element.children, &style, inner_x, inner_top, inner_width),
        };
        let bottom = inner_bottom + style.padding;
        self.decorate(decoration_index, &style, x, top, width, bottom - top);

        bottom + style.margin_bottom
    }

    /// Draw the background below the content emitted since `index`, and the border above it.
    fn decorate(&mut self, index: usize, style: &ComputedStyle, x: f32, y: f32, width: f32, height: f32) {
        if height <= 0.0 {
            return;
        }
        if let Some(color) = style.background {
            self.commands.insert(
                index,
                DrawCommand::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                },
            );
        }
        if let Some(color) = style.border {
            self.commands.push(DrawCommand::StrokeRect {
                x,
                y,
                width,
                height,
                color,
            });
        }
    }

    fn lay_out_list(
        &mut self,
        list: &Element,
        style: &ComputedStyle,
        x: f32,
        y: f32,
        width: f32,
    ) -> f32 {
        let mut cursor = y;
        for item in list.child_elements() {
            let first_command = self.commands.len();
            cursor = self.lay_out_block(
                item,
                style,
                x + LIST_INDENT,
                cursor,
                (width - LIST_INDENT).max(0.0),
            );
            // The bullet sits on the baseline of the first line of the item
            let first_line = self.commands[first_command..].iter().find_map(|command| match command {
                DrawCommand::Text {
                    baseline,
                    font_size,
                    color,
                    ..
                } => Some((*baseline, *font_size, *color)),
                _ => None,
            });
            if let Some((baseline, font_size, color)) = first_line {
                self.commands.push(DrawCommand::Text {
                    x: x + LIST_INDENT / 3.0,
                    baseline,
                    text: BULLET.into(),
                    font_size,
                    bold: false,
                    color,
                });
            }
        }

        cursor
    }

    /// The widths of the columns: cells of the first row may claim a percentage of the
    /// table, the other columns share what is left equally.
    fn column_widths(rows: &[&Element], column_count: usize, width: f32) -> Vec<f32> {
        let first_row: Vec<Option<f32>> = rows
            .first()
            .map(|row| {
                row.child_elements()
                    .filter(|cell| cell.tag == "td" || cell.tag == "th")
                    .map(|cell| cell.width_percent.filter(|percent| *percent > 0.0))
                    .collect()
            })
            .unwrap_or_default();
        let percents: Vec<Option<f32>> = (0..column_count)
            .map(|column| first_row.get(column).copied().flatten())
            .collect();
        let claimed: f32 = percents.iter().flatten().sum();
        let unclaimed_count = percents.iter().filter(|percent| percent.is_none()).count();

        let resolved: Vec<f32> = if unclaimed_count > 0 {
            let share = (100.0 - claimed).max(0.0) / unclaimed_count as f32;
            percents
                .iter()
                .map(|percent| percent.unwrap_or(share))
                .collect()
        } else {
            percents.iter().flatten().map(|percent| percent * 100.0 / claimed).collect()
        };
        let total: f32 = resolved.iter().sum();

        resolved
            .into_iter()
            .map(|percent| {
                if total > 100.0 {
                    percent * width / total
                } else {
                    percent * width / 100.0
                }
            })
            .collect()
    }

    fn lay_out_table(
        &mut self,
        table: &Element,
        table_style: &ComputedStyle,
        x: f32,
        y: f32,
        width: f32,
    ) -> f32 {
        let mut rows: Vec<&Element> = Vec::new();
        for child in table.child_elements() {
            match child.tag.as_str() {
                "tr" => rows.push(child),
                "thead" | "tbody" | "tfoot" => {
                    rows.extend(child.child_elements().filter(|row| row.tag == "tr"))
                }
                _ => {}
            }
        }
        let cells_of = |row: &Element| -> Vec<Element> {
            row.child_elements()
                .filter(|cell| cell.tag == "td" || cell.tag == "th")
                .cloned()
                .collect()
        };
        let column_count = rows.iter().map(|row| cells_of(*row).len()).max().unwrap_or(0);
        if column_count == 0 {
            return y;
        }
        let column_widths = Self::column_widths(&rows, column_count, width);

        let mut cursor = y;
        for row in rows {
            let row_style = self
                .stylesheet
                .compute(&row.tag, &row.class_names(), table_style);
            let row_top = cursor;
            let mut cell_x = x;
            let mut row_height: f32 = 0.0;
            let mut decorations = Vec::new();

            for (column, cell) in cells_of(row).iter().enumerate() {
                let cell_style = self
                    .stylesheet
                    .compute(&cell.tag, &cell.class_names(), &row_style);
                let cell_width = column_widths.get(column).copied().unwrap_or(0.0);
                let decoration_index = self.commands.len();
                let content_bottom = self.lay_out_children(
                    &cell.children,
                    &cell_style,
                    cell_x + cell_style.padding,
                    row_top + cell_style.padding,
                    (cell_width - 2.0 * cell_style.padding).max(0.0),
                );
                row_height = row_height.max(content_bottom + cell_style.padding - row_top);
                decorations.push((decoration_index, cell_style, cell_x, cell_width));
                cell_x += cell_width;
            }

            // Backgrounds are inserted from the last cell so the earlier indices stay valid
            for (decoration_index, cell_style, cell_x, cell_width) in decorations.into_iter().rev() {
                self.decorate(decoration_index, &cell_style, cell_x, row_top, cell_width, row_height);
            }
            cursor = row_top + row_height;
            self.row_boundaries.push(cursor);
        }

        cursor
    }

    fn collect_tokens(
        &self,
        nodes: &[&Node],
        style: &ComputedStyle,
        tokens: &mut Vec<InlineToken>,
        pending_space: &mut bool,
    ) {
        for node in nodes {
            match node {
                Node::Text(text) => {
                    if text.starts_with(char::is_whitespace) {
                        *pending_space = true;
                    }
                    for (index, word) in text.split_whitespace().enumerate() {
                        tokens.push(InlineToken::Word {
                            text: word.to_string(),
                            space_before: index > 0 || *pending_space,
                            font_size: style.font_size,
                            bold: style.bold,
                            color: style.color,
                        });
                        *pending_space = false;
                    }
                    if text.ends_with(char::is_whitespace) {
                        *pending_space = true;
                    }
                }
                Node::Element(element) if element.tag == "br" => {
                    tokens.push(InlineToken::LineBreak);
                    *pending_space = false;
                }
                Node::Element(element) => {
                    let child_style =
                        self.stylesheet
                            .compute(&element.tag, &element.class_names(), style);
                    let children: Vec<&Node> = element.children.iter().collect();
                    self.collect_tokens(&children, &child_style, tokens, pending_space);
                }
            }
        }
    }

    /// Wrap the inline content into lines and return the vertical position after the last line.
    fn lay_out_inline(
        &mut self,
        nodes: &[&Node],
        style: &ComputedStyle,
        x: f32,
        y: f32,
        width: f32,
    ) -> f32 {
        let mut tokens = Vec::new();
        let mut pending_space = false;
        self.collect_tokens(nodes, style, &mut tokens, &mut pending_space);
        if tokens.is_empty() {
            return y;
        }

        let mut cursor = y;
        let mut line: Vec<PlacedWord> = Vec::new();
        let mut line_width = 0.0;

        for token in tokens {
            match token {
                InlineToken::LineBreak => {
                    cursor = self.finish_line(&mut line, style, x, cursor);
                    line_width = 0.0;
                }
                InlineToken::Word {
                    text,
                    space_before,
                    font_size,
                    bold,
                    color,
                } => {
                    let word_width = self.fonts.text_width(&text, font_size, bold);
                    let mut space_width = if space_before && !line.is_empty() {
                        self.fonts.text_width(" ", font_size, bold)
                    } else {
                        0.0
                    };
                    if !line.is_empty() && line_width + space_width + word_width > width {
                        cursor = self.finish_line(&mut line, style, x, cursor);
                        line_width = 0.0;
                        space_width = 0.0;
                    }
                    line.push(PlacedWord {
                        offset: line_width + space_width,
                        text,
                        font_size,
                        bold,
                        color,
                    });
                    line_width += space_width + word_width;
                }
            }
        }
        if !line.is_empty() {
            cursor = self.finish_line(&mut line, style, x, cursor);
        }

        cursor
    }

    /// Emit the words of a line and return the top of the next line. An empty line,
    /// coming from a forced break, still takes the height of a line.
    fn finish_line(&mut self, line: &mut Vec<PlacedWord>, style: &ComputedStyle, x: f32, top: f32) -> f32 {
        let largest_font_size = line
            .iter()
            .map(|word| word.font_size)
            .fold(style.font_size, f32::max);
        let line_height = largest_font_size * style.line_height;
        let baseline = top
            + (line_height - largest_font_size) / 2.0
            + self.fonts.ascent(largest_font_size, false);

        for word in line.drain(..) {
            self.commands.push(DrawCommand::Text {
                x: x + word.offset,
                baseline,
                text: word.text,
                font_size: word.font_size,
                bold: word.bold,
                color: word.color,
            });
        }

        top + line_height
    }
}

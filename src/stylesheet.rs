//! The stylesheet shared by every report. It is a small typed cascade: a rule
//! targets a tag, a class, or both, and the properties which are inherited in CSS
//! (font size, weight, color and line height) are inherited here as well.

/// An RGB color.
pub type Color = [u8; 3];

pub const WHITE: Color = [255, 255, 255];

/// The style of one element once the cascade has been resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub font_size: f32,
    pub bold: bool,
    pub color: Color,
    /// Multiplier of the font size giving the height of a line of text.
    pub line_height: f32,
    pub background: Option<Color>,
    pub border: Option<Color>,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub padding: f32,
}

impl ComputedStyle {
    /// The style a child starts from before its own rules are applied.
    fn inherited(&self) -> ComputedStyle {
        ComputedStyle {
            font_size: self.font_size,
            bold: self.bold,
            color: self.color,
            line_height: self.line_height,
            background: None,
            border: None,
            margin_top: 0.0,
            margin_bottom: 0.0,
            padding: 0.0,
        }
    }
}

/// The properties set by one rule, `None` leaves the property untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub color: Option<Color>,
    pub line_height: Option<f32>,
    pub background: Option<Color>,
    pub border: Option<Color>,
    pub margin_top: Option<f32>,
    pub margin_bottom: Option<f32>,
    pub padding: Option<f32>,
}

impl Declarations {
    fn apply_to(&self, style: &mut ComputedStyle) {
        if let Some(font_size) = self.font_size {
            style.font_size = font_size;
        }
        if let Some(bold) = self.bold {
            style.bold = bold;
        }
        if let Some(color) = self.color {
            style.color = color;
        }
        if let Some(line_height) = self.line_height {
            style.line_height = line_height;
        }
        if self.background.is_some() {
            style.background = self.background;
        }
        if self.border.is_some() {
            style.border = self.border;
        }
        if let Some(margin_top) = self.margin_top {
            style.margin_top = margin_top;
        }
        if let Some(margin_bottom) = self.margin_bottom {
            style.margin_bottom = margin_bottom;
        }
        if let Some(padding) = self.padding {
            style.padding = padding;
        }
    }
}

/// A rule of the stylesheet. A `None` tag matches every tag.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    tag: Option<String>,
    class: Option<String>,
    declarations: Declarations,
}

impl StyleRule {
    pub fn tag(tag: &str) -> Self {
        StyleRule {
            tag: Some(tag.to_string()),
            class: None,
            declarations: Declarations::default(),
        }
    }

    pub fn class(class: &str) -> Self {
        StyleRule {
            tag: None,
            class: Some(class.to_string()),
            declarations: Declarations::default(),
        }
    }

    pub fn tag_with_class(tag: &str, class: &str) -> Self {
        StyleRule {
            tag: Some(tag.to_string()),
            class: Some(class.to_string()),
            declarations: Declarations::default(),
        }
    }

    pub fn font_size(mut self, font_size: f32) -> Self {
        self.declarations.font_size = Some(font_size);
        self
    }

    pub fn bold(mut self) -> Self {
        self.declarations.bold = Some(true);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.declarations.color = Some(color);
        self
    }

    pub fn background(mut self, background: Color) -> Self {
        self.declarations.background = Some(background);
        self
    }

    pub fn border(mut self, border: Color) -> Self {
        self.declarations.border = Some(border);
        self
    }

    pub fn margins(mut self, margin_top: f32, margin_bottom: f32) -> Self {
        self.declarations.margin_top = Some(margin_top);
        self.declarations.margin_bottom = Some(margin_bottom);
        self
    }

    pub fn padding(mut self, padding: f32) -> Self {
        self.declarations.padding = Some(padding);
        self
    }

    fn matches(&self, tag: &str, classes: &[&str]) -> bool {
        let tag_matches = self.tag.as_deref().map_or(true, |rule_tag| rule_tag == tag);
        let class_matches = self
            .class
            .as_deref()
            .map_or(true, |rule_class| classes.contains(&rule_class));
        tag_matches && class_matches
    }

    /// Rules naming more of the element are applied later, so that they win.
    fn specificity(&self) -> u8 {
        self.tag.is_some() as u8 + 2 * self.class.is_some() as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    root: ComputedStyle,
    rules: Vec<StyleRule>,
}

const INK: Color = [34, 34, 34];
const ACCENT: Color = [30, 58, 138];
const MUTED: Color = [120, 120, 120];
const RULE: Color = [200, 204, 212];

impl Stylesheet {
    pub fn new(root: ComputedStyle, rules: Vec<StyleRule>) -> Self {
        Stylesheet { root, rules }
    }

    /// The stylesheet every report is rendered with.
    pub fn report_default() -> Self {
        let root = ComputedStyle {
            font_size: 11.0,
            bold: false,
            color: INK,
            line_height: 1.4,
            background: None,
            border: None,
            margin_top: 0.0,
            margin_bottom: 0.0,
            padding: 0.0,
        };
        let rules = vec![
            StyleRule::tag_with_class("div", "report").padding(32.0),
            StyleRule::tag("header")
                .background(ACCENT)
                .color(WHITE)
                .padding(16.0)
                .margins(0.0, 16.0),
            StyleRule::tag("footer")
                .font_size(9.0)
                .color(MUTED)
                .margins(20.0, 0.0),
            StyleRule::tag("h1").font_size(22.0).bold().margins(0.0, 6.0),
            StyleRule::tag("h2")
                .font_size(15.0)
                .bold()
                .color(ACCENT)
                .margins(18.0, 8.0),
            StyleRule::tag("h3").font_size(12.5).bold().margins(10.0, 4.0),
            StyleRule::tag("p").margins(0.0, 6.0),
            StyleRule::tag("ul").margins(0.0, 6.0),
            StyleRule::tag("li").margins(0.0, 2.0),
            StyleRule::tag("table").margins(4.0, 10.0),
            StyleRule::tag("th")
                .bold()
                .background([232, 238, 252])
                .border(RULE)
                .padding(6.0),
            StyleRule::tag("td").border(RULE).padding(6.0),
            StyleRule::tag("strong").bold(),
            StyleRule::tag("em").color([70, 70, 70]),
            StyleRule::class("meta").font_size(10.0),
            StyleRule::class("placeholder").color(MUTED),
            StyleRule::tag_with_class("div", "summary")
                .background([245, 247, 250])
                .border(RULE)
                .padding(10.0)
                .margins(4.0, 10.0),
            StyleRule::class("level-acquired").color([21, 128, 61]),
            StyleRule::class("level-pending").color([180, 83, 9]),
            StyleRule::class("level-missing").color([185, 28, 28]),
        ];

        Stylesheet::new(root, rules)
    }

    pub fn root_style(&self) -> ComputedStyle {
        self.root
    }

    /// Resolve the style of an element from the style of its parent.
    pub fn compute(&self, tag: &str, classes: &[&str], parent: &ComputedStyle) -> ComputedStyle {
        let mut style = parent.inherited();
        let mut matching_rules: Vec<&StyleRule> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(tag, classes))
            .collect();
        // The sort is stable, so rules of equal specificity keep their declaration order
        matching_rules.sort_by_key(|rule| rule.specificity());
        for rule in matching_rules {
            rule.declarations.apply_to(&mut style);
        }

        style
    }
}

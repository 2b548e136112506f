//! Style resolver – maps tag defaults and inline `style` attributes to the
//! flat [`BlockStyle`] consumed by the text-metrics measurer and the
//! allocator's break hints.
//!
//! Tag defaults mirror the notice document stylesheet (12 px body text at
//! 1.6 line height, 8 px paragraph spacing, padded table cells).

use crate::dom::{ElementNode, Tag};

/// Resolved box and typography properties for a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStyle {
    pub display: Display,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,

    // Spacing (px)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub font_family: String,
    /// Multiple of `font_size`.
    pub line_height: f32,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl Default for BlockStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            width: Dimension::Auto,
            height: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            font_size: 12.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            font_family: "Helvetica".to_string(),
            line_height: 1.6,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
        }
    }
}

impl BlockStyle {
    /// Root style for a document body with the given base typography.
    pub fn root(font_size: f32, line_height: f32) -> Self {
        Self {
            font_size,
            line_height,
            ..Self::default()
        }
    }

    /// Vertical space taken by margins, padding and borders.
    pub fn vertical_chrome(&self) -> f32 {
        self.margin_top
            + self.margin_bottom
            + self.padding_top
            + self.padding_bottom
            + 2.0 * self.border_width
    }

    /// Horizontal space taken by margins, padding and borders.
    pub fn horizontal_chrome(&self) -> f32 {
        self.margin_left
            + self.margin_right
            + self.padding_left
            + self.padding_right
            + 2.0 * self.border_width
    }

    /// Line box height in px.
    pub fn line_height_px(&self) -> f32 {
        self.font_size * self.line_height
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    ListItem,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

impl Dimension {
    /// Resolve against a containing length; `None` for `auto`.
    pub fn resolve(self, container: f32) -> Option<f32> {
        match self {
            Dimension::Auto => None,
            Dimension::Px(v) => Some(v),
            Dimension::Percent(p) => Some(container * p / 100.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: &BlockStyle) -> BlockStyle {
    let mut style = BlockStyle {
        font_size: parent.font_size,
        font_weight: parent.font_weight,
        font_style: parent.font_style,
        font_family: parent.font_family.clone(),
        line_height: parent.line_height,
        ..BlockStyle::default()
    };
    apply_tag_defaults(&mut style, &element.tag);

    for class in element.classes() {
        apply_break_class(&mut style, class);
    }

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }

    style
}

/// Default styles based on tag semantics. Heading sizes are relative to the
/// inherited font size, like the user-agent stylesheet.
fn apply_tag_defaults(s: &mut BlockStyle, tag: &Tag) {
    let base = s.font_size;
    let heading = |s: &mut BlockStyle, scale: f32, margin: f32| {
        s.font_size = base * scale;
        s.font_weight = FontWeight::Bold;
        s.line_height = 1.2;
        s.margin_top = s.font_size * margin;
        s.margin_bottom = s.font_size * margin;
    };
    match tag {
        Tag::H1 => heading(s, 2.0, 0.67),
        Tag::H2 => heading(s, 1.5, 0.83),
        Tag::H3 => heading(s, 1.17, 1.0),
        Tag::H4 => heading(s, 1.0, 1.33),
        Tag::H5 => heading(s, 0.83, 1.67),
        Tag::H6 => heading(s, 0.67, 2.33),
        Tag::P => {
            s.margin_bottom = 8.0;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_top = 0.0;
            s.margin_bottom = 8.0;
            s.padding_left = 24.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 2.0;
        }
        Tag::Table => {
            s.margin_top = 12.0;
            s.margin_bottom = 12.0;
        }
        Tag::Td | Tag::Th => {
            s.padding_top = 8.0;
            s.padding_right = 8.0;
            s.padding_bottom = 8.0;
            s.padding_left = 8.0;
            s.border_width = 1.0;
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
            }
        }
        Tag::Hr => {
            s.margin_top = 8.0;
            s.margin_bottom = 8.0;
            s.border_width = 0.5;
        }
        Tag::Figure => {
            s.margin_top = 16.0;
            s.margin_bottom = 16.0;
        }
        Tag::Span | Tag::Br => {
            s.display = Display::Inline;
        }
        Tag::Head => {
            s.display = Display::None;
        }
        Tag::Unknown(name) if name == "b" || name == "strong" => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::Unknown(name) if name == "i" || name == "em" => {
            s.display = Display::Inline;
            s.font_style = FontStyle::Italic;
        }
        Tag::Unknown(name) if name == "script" || name == "style" || name == "template" => {
            s.display = Display::None;
        }
        other if other.is_inline() => {
            s.display = Display::Inline;
        }
        _ => {}
    }
}

/// Page-break utility classes emitted by the editor's "insert page break"
/// component.
fn apply_break_class(s: &mut BlockStyle, class: &str) {
    match class {
        "page-break" | "break-before" | "page-break-before" => s.page_break_before = true,
        "break-after" | "page-break-after" => s.page_break_after = true,
        "break-inside-avoid" | "avoid-break" => s.page_break_inside_avoid = true,
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Inline style parsing (limited subset)
// ---------------------------------------------------------------------------

/// Iterate the `property: value` declarations of a `style` attribute.
pub fn declarations(style_str: &str) -> impl Iterator<Item = (&str, &str)> {
    style_str.split(';').filter_map(|decl| {
        let mut parts = decl.splitn(2, ':');
        let prop = parts.next()?.trim();
        let val = parts.next()?.trim();
        if prop.is_empty() {
            None
        } else {
            Some((prop, val))
        }
    })
}

/// Look up a single property in a `style` attribute.
pub fn inline_property<'a>(style_str: &'a str, name: &str) -> Option<&'a str> {
    declarations(style_str)
        .filter(|(prop, _)| prop.eq_ignore_ascii_case(name))
        .map(|(_, val)| val)
        .last()
}

/// Return `style_str` with the given properties replaced (or appended).
pub fn with_properties(style_str: &str, updates: &[(&str, String)]) -> String {
    let mut decls: Vec<(String, String)> = declarations(style_str)
        .filter(|(prop, _)| !updates.iter().any(|(u, _)| prop.eq_ignore_ascii_case(u)))
        .map(|(p, v)| (p.to_string(), v.to_string()))
        .collect();
    decls.extend(updates.iter().map(|(p, v)| (p.to_string(), v.clone())));
    decls
        .iter()
        .map(|(p, v)| format!("{p}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn apply_inline_style(s: &mut BlockStyle, style_str: &str) {
    for (prop, val) in declarations(style_str) {
        apply_css_property(s, &prop.to_ascii_lowercase(), val);
    }
}

fn apply_css_property(s: &mut BlockStyle, prop: &str, val: &str) {
    match prop {
        "display" => {
            s.display = match val {
                "none" => Display::None,
                "inline" | "inline-block" => Display::Inline,
                "list-item" => Display::ListItem,
                "block" | "flex" | "grid" => Display::Block,
                _ => s.display,
            }
        }
        "font-size" => {
            if let Some(px) = parse_length(val, s.font_size) {
                s.font_size = px;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => {
            if let Some(first) = val.split(',').next() {
                let family = first.trim().trim_matches(|c| c == '\'' || c == '"');
                if !family.is_empty() {
                    s.font_family = family.to_string();
                }
            }
        }
        "width" => {
            s.width = parse_dimension(val, s.font_size);
        }
        "height" => {
            s.height = parse_dimension(val, s.font_size);
        }
        "margin" => {
            let [t, r, b, l] = apply_shorthand_spacing(
                val,
                [s.margin_top, s.margin_right, s.margin_bottom, s.margin_left],
                s.font_size,
            );
            s.margin_top = t;
            s.margin_right = r;
            s.margin_bottom = b;
            s.margin_left = l;
        }
        "margin-top" => set_length(&mut s.margin_top, val, s.font_size),
        "margin-right" => set_length(&mut s.margin_right, val, s.font_size),
        "margin-bottom" => set_length(&mut s.margin_bottom, val, s.font_size),
        "margin-left" => set_length(&mut s.margin_left, val, s.font_size),
        "padding" => {
            let [t, r, b, l] = apply_shorthand_spacing(
                val,
                [s.padding_top, s.padding_right, s.padding_bottom, s.padding_left],
                s.font_size,
            );
            s.padding_top = t;
            s.padding_right = r;
            s.padding_bottom = b;
            s.padding_left = l;
        }
        "padding-top" => set_length(&mut s.padding_top, val, s.font_size),
        "padding-right" => set_length(&mut s.padding_right, val, s.font_size),
        "padding-bottom" => set_length(&mut s.padding_bottom, val, s.font_size),
        "padding-left" => set_length(&mut s.padding_left, val, s.font_size),
        "border-width" => set_length(&mut s.border_width, val, s.font_size),
        "border" => {
            if let Some(px) = val
                .split_whitespace()
                .find_map(|part| parse_length(part, s.font_size))
            {
                s.border_width = px;
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(px) = parse_length(val, s.font_size) {
                if s.font_size > 0.0 {
                    s.line_height = px / s.font_size;
                }
            }
        }
        "break-after" | "page-break-after" => {
            s.page_break_after = val == "always" || val == "page";
        }
        "break-before" | "page-break-before" => {
            s.page_break_before = val == "always" || val == "page";
        }
        "break-inside" | "page-break-inside" => {
            s.page_break_inside_avoid = val == "avoid" || val == "avoid-page";
        }
        _ => {}
    }
}

fn set_length(slot: &mut f32, val: &str, font_size: f32) {
    if let Some(px) = parse_length(val, font_size) {
        *slot = px;
    }
}

/// Parse an absolute or font-relative length into px.
pub fn parse_length(s: &str, font_size: f32) -> Option<f32> {
    let s = s.trim().trim_end_matches("!important").trim();
    if s == "0" {
        return Some(0.0);
    }
    if let Some(v) = s.strip_suffix("px") {
        return v.trim().parse().ok();
    }
    if let Some(v) = s.strip_suffix("rem") {
        return v.trim().parse::<f32>().ok().map(|v| v * 16.0);
    }
    if let Some(v) = s.strip_suffix("em") {
        return v.trim().parse::<f32>().ok().map(|v| v * font_size);
    }
    if let Some(v) = s.strip_suffix("pt") {
        return v.trim().parse::<f32>().ok().map(|v| v * 96.0 / 72.0);
    }
    if let Some(v) = s.strip_suffix("mm") {
        return v.trim().parse::<f32>().ok().map(|v| v * 96.0 / 25.4);
    }
    s.parse().ok()
}

fn parse_dimension(s: &str, font_size: f32) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(p) = s.strip_suffix('%') {
        p.trim()
            .parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s, font_size)
            .map(Dimension::Px)
            .unwrap_or(Dimension::Auto)
    }
}

fn apply_shorthand_spacing(val: &str, current: [f32; 4], font_size: f32) -> [f32; 4] {
    let parts: Vec<f32> = val
        .split_whitespace()
        .filter_map(|p| parse_length(p, font_size))
        .collect();
    match parts.len() {
        1 => [parts[0]; 4],
        2 => [parts[0], parts[1], parts[0], parts[1]],
        3 => [parts[0], parts[1], parts[2], parts[1]],
        4 => [parts[0], parts[1], parts[2], parts[3]],
        _ => current,
    }
}

//! Font faces and line wrapping for the text-metrics measurer.
//!
//! With a TTF loaded, widths are summed glyph advances from `ttf-parser`.
//! Without one, every character counts as half an em (slightly more for
//! bold). The numbers only feed [`crate::measure::TextMetricsMeasurer`];
//! hosts with a live layout engine annotate heights instead.

use std::path::Path;

use crate::error::{PaginationError, Result};

/// Advance assumed for a glyph the face lacks, in em.
const MISSING_GLYPH_EM: f32 = 0.5;

/// Which face a run of text asks for. `family` may be a CSS font-family
/// list; the first loaded family in it wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSpec<'a> {
    pub family: &'a str,
    pub bold: bool,
    pub italic: bool,
}

struct LoadedFace {
    family: String,
    bold: bool,
    italic: bool,
    bytes: Vec<u8>,
    units_per_em: f32,
}

/// Registry of loaded faces. Empty by default, which selects the heuristic
/// widths.
#[derive(Default)]
pub struct FontManager {
    faces: Vec<LoadedFace>,
}

impl FontManager {
    /// Register a TTF/OTF face.
    pub fn load_font(&mut self, family: &str, bold: bool, italic: bool, bytes: Vec<u8>) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| PaginationError::Font(format!("failed to parse font '{family}': {e}")))?;
        let units_per_em = f32::from(face.units_per_em());
        log::debug!("Loaded font '{family}' (bold={bold}, italic={italic}, {units_per_em} units/em)");
        self.faces.retain(|f| !(f.family.eq_ignore_ascii_case(family) && f.bold == bold && f.italic == italic));
        self.faces.push(LoadedFace {
            family: family.to_string(),
            bold,
            italic,
            bytes,
            units_per_em,
        });
        Ok(())
    }

    /// Register a regular face from a file under its file stem.
    pub fn load_font_file(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let family = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Custom");
        self.load_font(family, false, false, bytes)
    }

    pub fn has_real_fonts(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Exact style match in the first listed family that is loaded, then any
    /// style of that family, then the first face loaded.
    fn select(&self, spec: &FontSpec<'_>) -> Option<&LoadedFace> {
        for name in spec.family.split(',') {
            let name = name.trim().trim_matches(|c| c == '"' || c == '\'');
            let mut family = self.faces.iter().filter(|f| f.family.eq_ignore_ascii_case(name)).peekable();
            if family.peek().is_none() {
                continue;
            }
            let candidates: Vec<&LoadedFace> = family.collect();
            return candidates
                .iter()
                .find(|f| f.bold == spec.bold && f.italic == spec.italic)
                .or_else(|| candidates.iter().find(|f| f.bold == spec.bold))
                .or(candidates.first())
                .copied();
        }
        self.faces.first()
    }

    /// Width of `text` in px.
    pub fn text_width(&self, text: &str, spec: &FontSpec<'_>, font_size: f32) -> f32 {
        let mut widths = self.width_fn(spec, font_size);
        text.chars().map(&mut widths).sum()
    }

    /// Per-character width function for one face and size. The face is
    /// parsed once per call rather than once per glyph.
    fn width_fn(&self, spec: &FontSpec<'_>, font_size: f32) -> impl FnMut(char) -> f32 + '_ {
        let face = self
            .select(spec)
            .and_then(|f| ttf_parser::Face::parse(&f.bytes, 0).ok().map(|parsed| (parsed, f.units_per_em)));
        let heuristic = font_size * if spec.bold { 0.55 } else { 0.5 };
        move |c| match &face {
            Some((face, upem)) => face
                .glyph_index(c)
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map_or(font_size * MISSING_GLYPH_EM, |adv| f32::from(adv) * font_size / upem),
            None => heuristic,
        }
    }

    /// Greedy word wrap of `text` at `max_width` px. A `\n` always starts a
    /// new line; a word wider than the line gets a line of its own.
    pub fn wrap_lines(&self, text: &str, spec: &FontSpec<'_>, font_size: f32, max_width: f32) -> Vec<String> {
        if max_width <= 0.0 || text.is_empty() {
            return vec![text.to_string()];
        }
        let mut width_of = self.width_fn(spec, font_size);
        let space = width_of(' ');

        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            let mut line_width = 0.0f32;
            for word in paragraph.split_whitespace() {
                let word_width: f32 = word.chars().map(&mut width_of).sum();
                if line.is_empty() {
                    line.push_str(word);
                    line_width = word_width;
                } else if line_width + space + word_width > max_width {
                    lines.push(std::mem::take(&mut line));
                    line.push_str(word);
                    line_width = word_width;
                } else {
                    line.push(' ');
                    line.push_str(word);
                    line_width += space + word_width;
                }
            }
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGULAR: FontSpec<'static> = FontSpec {
        family: "Helvetica",
        bold: false,
        italic: false,
    };

    #[test]
    fn heuristic_widths_without_fonts() {
        let mgr = FontManager::default();
        assert!(!mgr.has_real_fonts());
        assert!((mgr.text_width("Hello", &REGULAR, 16.0) - 40.0).abs() < 0.1);
        let bold = FontSpec { bold: true, ..REGULAR };
        assert!((mgr.text_width("Hello", &bold, 16.0) - 44.0).abs() < 0.1);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let mgr = FontManager::default();
        // 8px per char: "Hello world" is 88px.
        let lines = mgr.wrap_lines("Hello world foo bar", &REGULAR, 16.0, 90.0);
        assert_eq!(lines, vec!["Hello world", "foo bar"]);
    }

    #[test]
    fn long_word_gets_own_line() {
        let mgr = FontManager::default();
        let lines = mgr.wrap_lines("a Supercalifragilistic b", &REGULAR, 16.0, 50.0);
        assert_eq!(lines, vec!["a", "Supercalifragilistic", "b"]);
    }

    #[test]
    fn explicit_newlines_start_new_lines() {
        let mgr = FontManager::default();
        let lines = mgr.wrap_lines("Dear Sir\nRegards", &REGULAR, 12.0, 500.0);
        assert_eq!(lines, vec!["Dear Sir", "Regards"]);
        let blank = mgr.wrap_lines("Above\n\nBelow", &REGULAR, 12.0, 500.0);
        assert_eq!(blank.len(), 3);
    }

    #[test]
    fn garbage_font_bytes_rejected() {
        let mut mgr = FontManager::default();
        let err = mgr.load_font("Broken", false, false, vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, PaginationError::Font(_)));
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn missing_font_file_is_io_error() {
        let mut mgr = FontManager::default();
        let err = mgr.load_font_file(Path::new("/nonexistent/body.ttf")).unwrap_err();
        assert!(matches!(err, PaginationError::Io(_)));
    }
}

//! XML formatting utilities for package documents.
//!
//! Provides escaping and an indenting element writer.

/// XML declaration every document starts with.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Escape text for use in element content or a double-quoted attribute.
#[must_use]
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            c => result.push(c),
        }
    }
    result
}

/// `1` or `0`, the way package documents spell booleans.
#[must_use]
pub fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn attributes(attrs: &[(&str, &str)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_xml(value)))
        .collect()
}

/// A writer that manages indentation for XML output.
pub struct XmlWriter {
    buffer: String,
    indent_str: &'static str,
    current_indent: usize,
}

impl XmlWriter {
    /// Create a writer with two-space indentation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_str: "  ",
            current_indent: 0,
        }
    }

    /// Create a writer that has already emitted the XML declaration.
    #[must_use]
    pub fn document() -> Self {
        let mut w = Self::new();
        w.write_line(XML_DECLARATION);
        w
    }

    pub fn indent(&mut self) {
        self.current_indent += 1;
    }

    pub fn dedent(&mut self) {
        self.current_indent = self.current_indent.saturating_sub(1);
    }

    /// Write a complete line at the current indentation.
    pub fn write_line(&mut self, s: &str) {
        for _ in 0..self.current_indent {
            self.buffer.push_str(self.indent_str);
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// `<tag a="v">` and indent.
    pub fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.write_line(&format!("<{}{}>", tag, attributes(attrs)));
        self.indent();
    }

    /// Dedent and `</tag>`.
    pub fn close(&mut self, tag: &str) {
        self.dedent();
        self.write_line(&format!("</{}>", tag));
    }

    /// `<tag>text</tag>` with the text escaped.
    pub fn element(&mut self, tag: &str, text: &str) {
        self.write_line(&format!("<{}>{}</{}>", tag, escape_xml(text), tag));
    }

    /// `<tag a="v">text</tag>`.
    pub fn element_with(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) {
        self.write_line(&format!(
            "<{}{}>{}</{}>",
            tag,
            attributes(attrs),
            escape_xml(text),
            tag
        ));
    }

    /// `<tag a="v" />`.
    pub fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.write_line(&format!("<{}{} />", tag, attributes(attrs)));
    }

    /// `<tag xsi:nil="true"></tag>`.
    pub fn nil(&mut self, tag: &str) {
        self.write_line(&format!("<{} xsi:nil=\"true\"></{}>", tag, tag));
    }

    /// Consume the writer and return the final string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

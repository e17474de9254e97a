// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Minimal streaming XML writer.

use std::borrow::Cow;
use std::fmt::Write as _;

use askama_escape::{Html, escape as escape_xml};

/// Appends escaped XML to a string buffer.
///
/// Element and attribute names are written as given; text and attribute
/// values are escaped, and characters XML 1.0 cannot carry are dropped.
#[derive(Debug, Default)]
pub struct XmlWriter {
    out: String,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declaration(&mut self) {
        self.out
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }

    pub fn start(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.out.push('<');
        self.out.push_str(name);
        self.attributes(attributes);
        self.out.push('>');
    }

    pub fn end(&mut self, name: &str) {
        let _ = write!(self.out, "</{name}>");
    }

    pub fn text(&mut self, text: &str) {
        let _ = write!(self.out, "{}", escape_xml(&xml_chars(text), Html));
    }

    /// `<name>text</name>`
    pub fn element(&mut self, name: &str, text: &str) {
        self.start(name, &[]);
        self.text(text);
        self.end(name);
    }

    pub fn element_with(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) {
        self.start(name, attributes);
        self.text(text);
        self.end(name);
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn attributes(&mut self, attributes: &[(&str, &str)]) {
        for (name, value) in attributes {
            let _ = write!(
                self.out,
                " {name}=\"{}\"",
                escape_xml(&xml_chars(value), Html)
            );
        }
    }
}

/// The XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t'
            | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

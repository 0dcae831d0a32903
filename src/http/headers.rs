// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Ordered, case-insensitive header list
//!
//! One list serves a request twice: it stages outgoing headers until
//! `send()`, is cleared when they are handed to the engine, and then
//! collects the response headers as they arrive.

use std::fmt::Write as _;

/// A single header name/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Header name, original case preserved
    pub name: String,
    /// Header value
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Insertion-ordered header list with unique names
///
/// Setting a name that is already present removes the old entry and appends
/// the new one, so an updated header moves to the end of iteration order.
/// Callers may observe that ordering; do not switch to in-place update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<Header>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove any entry matching `name`, then append the new entry at the tail
    pub fn set_or_replace(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let header = Header::new(name, value);
        self.entries.retain(|h| !h.name_matches(&header.name));
        self.entries.push(header);
    }

    /// Value for `name`, case-insensitive
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name_matches(name))
            .map(|h| h.value.as_str())
    }

    /// Entry at position `index`
    pub fn get_index(&self, index: usize) -> Option<&Header> {
        self.entries.get(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|h| h.name_matches(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    /// Move every entry out, leaving the list empty
    pub fn drain(&mut self) -> std::vec::Drain<'_, Header> {
        self.entries.drain(..)
    }

    /// Every entry as `name: value\r\n`, followed by a blank line
    pub fn render_all(&self) -> String {
        let mut out = String::new();
        for header in &self.entries {
            // Writing to a String cannot fail
            let _ = write!(out, "{}: {}\r\n", header.name, header.value);
        }
        out.push_str("\r\n");
        out
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

//! Splitting PlantUML documents into diagram units.
//!
//! A document may hold any number of `@startuml` ... `@enduml` blocks. Each
//! block becomes a [`DiagramUnit`] carrying a filesystem-safe name and the
//! verbatim block text. Text outside blocks is ignored.
//!
//! # Example
//!
//! ```
//! # use plantbatch_core::source::diagrams;
//! let document = "\
//! @startuml Login
//! Alice -> Bob
//! @enduml
//! some notes
//! @startuml
//! Bob -> Alice
//! @enduml
//! ";
//!
//! let names: Vec<_> = diagrams(document).map(|unit| unit.name().to_owned()).collect();
//! assert_eq!(names, ["Login", "diagram_02"]);
//! ```

use std::{str::Lines, sync::LazyLock};

use log::debug;
use regex::Regex;

static START_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^@startuml(?:\s+(\S+))?").expect("start directive pattern is valid")
});

const END_DIRECTIVE: &str = "@enduml";

/// A single diagram extracted from a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramUnit {
    name: String,
    text: String,
}

impl DiagramUnit {
    /// Create a unit from a name and diagram text.
    ///
    /// The name is sanitized with [`sanitize_name`].
    pub fn new(name: &str, text: impl Into<String>) -> Self {
        Self {
            name: sanitize_name(name),
            text: text.into(),
        }
    }

    /// Returns the sanitized, filesystem-safe name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the diagram text, including both directives.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Iterate over the diagrams in `document`, in source order.
pub fn diagrams(document: &str) -> Diagrams<'_> {
    Diagrams {
        lines: document.lines(),
        sequence: 0,
    }
}

/// Lazy iterator over the [`DiagramUnit`]s of a document.
///
/// Created by [`diagrams`]. The iterator makes a single forward pass over
/// the document lines.
#[derive(Debug)]
pub struct Diagrams<'a> {
    lines: Lines<'a>,
    /// Number of units opened so far, used for generated names.
    sequence: usize,
}

impl Iterator for Diagrams<'_> {
    type Item = DiagramUnit;

    fn next(&mut self) -> Option<Self::Item> {
        let (start_line, explicit_name) = self.lines.by_ref().find_map(|line| {
            START_DIRECTIVE
                .captures(line.trim())
                .map(|caps| (line, caps.get(1).map(|m| m.as_str())))
        })?;

        self.sequence += 1;
        let name = explicit_name
            .map(str::to_owned)
            .unwrap_or_else(|| format!("diagram_{:02}", self.sequence));

        let mut text = String::from(start_line);
        text.push('\n');

        let mut terminated = false;
        for line in self.lines.by_ref() {
            text.push_str(line);
            text.push('\n');
            if line.contains(END_DIRECTIVE) {
                terminated = true;
                break;
            }
        }

        if !terminated {
            debug!(name; "Diagram is not terminated by @enduml");
        }

        Some(DiagramUnit::new(&name, text))
    }
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

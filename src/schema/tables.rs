//! Tabular projections of the resolved model
//!
//! Tables have a fixed column order. They render as aligned plain-text grids
//! or serialize as a list of `column -> value` records.

use super::model::{Enumerator, GlobalElement, SchemaAttribute, SchemaChange, SchemaType};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A table of string cells
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; missing cells are left empty and extra cells dropped
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Column headers
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of one column
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let i = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[i].as_str()).collect())
    }

    /// Rows as `column -> value` maps
    pub fn records(&self) -> Vec<IndexMap<&str, &str>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| c.as_str())
                    .zip(row.iter().map(|v| v.as_str()))
                    .collect()
            })
            .collect()
    }

    /// Render as an aligned grid
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let rule = |fill: char| {
            let mut line = String::from("+");
            for width in &widths {
                line.extend(std::iter::repeat(fill).take(width + 2));
                line.push('+');
            }
            line.push('\n');
            line
        };
        let line = |cells: &[String]| {
            let mut line = String::from("|");
            for (cell, width) in cells.iter().zip(&widths) {
                let pad = width - cell.chars().count();
                line.push(' ');
                line.push_str(cell);
                line.extend(std::iter::repeat(' ').take(pad + 1));
                line.push('|');
            }
            line.push('\n');
            line
        };

        let mut out = rule('-');
        out.push_str(&line(&self.columns));
        out.push_str(&rule('='));
        for row in &self.rows {
            out.push_str(&line(row));
        }
        if !self.rows.is_empty() {
            out.push_str(&rule('-'));
        }
        out
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records())
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Properties of a global element as a one-row table
pub fn properties_table(element: &GlobalElement) -> Table {
    let props = element.properties();
    let mut table = Table::new(["Name", "Type", "Use", "Cardinality", "Description"]);
    table.push_row([props.name, props.type_of, props.use_, props.cardinality, props.description]);
    table
}

/// Attribute, Type, Use, Default, Fixed, Description
pub fn attribute_table(element: &GlobalElement) -> Table {
    let mut table = Table::new(["Attribute", "Type", "Use", "Default", "Fixed", "Description"]);
    for a in &element.attributes {
        table.push_row([
            a.name.clone(),
            opt(&a.type_of),
            a.use_.clone(),
            opt(&a.default),
            opt(&a.fixed),
            a.description.clone(),
        ]);
    }
    table
}

/// Child, Type, Use, Cardinality, Choice, Global, Description; sorted by
/// child name
pub fn child_table(element: &GlobalElement) -> Table {
    let mut children: Vec<_> = element.children.iter().collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table = Table::new(["Child", "Type", "Use", "Cardinality", "Choice", "Global", "Description"]);
    for c in children {
        table.push_row([
            c.prefixed_name(),
            opt(&c.type_of),
            c.use_.clone(),
            c.cardinality.to_string(),
            c.is_choice.to_string(),
            c.is_global.to_string(),
            c.description.clone(),
        ]);
    }
    table
}

/// Value, Description
pub fn enumerator_table(enumerator: &Enumerator) -> Table {
    let mut table = Table::new(["Value", "Description"]);
    for (value, description) in enumerator.iter() {
        table.push_row([value, description]);
    }
    table
}

/// Name, Prefix, Tag of each enumerator
pub fn enumerator_types<'a>(enumerators: impl IntoIterator<Item = &'a Enumerator>) -> Table {
    let mut table = Table::new(["Name", "Prefix", "Tag"]);
    for e in enumerators {
        table.push_row([e.name.clone(), e.prefix.clone(), e.tag.to_string()]);
    }
    table
}

/// Prefix, Name, Tag, Line
pub fn schema_type_table<'a>(types: impl IntoIterator<Item = &'a SchemaType>) -> Table {
    let mut table = Table::new(["Prefix", "Name", "Tag", "Line"]);
    for t in types {
        table.push_row([
            t.prefix.clone(),
            t.name.clone(),
            t.tag.to_string(),
            t.source_line.to_string(),
        ]);
    }
    table
}

/// Name, Prefix, Type, Restriction, Description
pub fn schema_attribute_table<'a>(attributes: impl IntoIterator<Item = &'a SchemaAttribute>) -> Table {
    let mut table = Table::new(["Name", "Prefix", "Type", "Restriction", "Description"]);
    for a in attributes {
        table.push_row([
            a.name.clone(),
            a.prefix.clone(),
            opt(&a.type_of),
            a.restriction.clone(),
            a.description.clone(),
        ]);
    }
    table
}

/// Version, Author, Date, Description
pub fn schema_change_table<'a>(changes: impl IntoIterator<Item = &'a SchemaChange>) -> Table {
    let mut table = Table::new(["Version", "Author", "Date", "Description"]);
    for c in changes {
        table.push_row([opt(&c.version), opt(&c.author), opt(&c.date), c.description.clone()]);
    }
    table
}

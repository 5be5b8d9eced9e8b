// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Column-aligned plain text tables for `jw list`.

use std::io::{self, Write};

pub enum Align {
    Left,
    Right,
}

pub struct Column {
    pub name: &'static str,
    pub align: Align,
    /// Longer cells are cut and end in `...`
    pub max_width: Option<usize>,
}

impl Column {
    pub fn left(name: &'static str) -> Self {
        Self {
            name,
            align: Align::Left,
            max_width: None,
        }
    }

    pub fn right(name: &'static str) -> Self {
        Self {
            name,
            align: Align::Right,
            max_width: None,
        }
    }

    pub fn with_max(mut self, max: usize) -> Self {
        self.max_width = Some(max);
        self
    }
}

pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

const SEP: &str = "  ";

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        let cells = cells
            .into_iter()
            .zip(&self.columns)
            .map(|(cell, col)| truncate(cell, col.max_width))
            .collect();
        self.rows.push(cells);
    }

    /// Write the header and every row. A left-aligned last column is not padded.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .fold(col.name.len(), usize::max)
            })
            .collect();

        let header: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        self.write_line(out, &header, &widths)?;
        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            self.write_line(out, &cells, &widths)?;
        }
        Ok(())
    }

    fn write_line(&self, out: &mut impl Write, cells: &[&str], widths: &[usize]) -> io::Result<()> {
        let last = self.columns.len().saturating_sub(1);
        let line: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let text = cells.get(i).copied().unwrap_or("");
                let width = widths[i];
                match col.align {
                    Align::Left if i == last => text.to_string(),
                    Align::Left => format!("{:<width$}", text),
                    Align::Right => format!("{:>width$}", text),
                }
            })
            .collect();
        writeln!(out, "{}", line.join(SEP))
    }
}

fn truncate(cell: String, max: Option<usize>) -> String {
    match max {
        Some(max) if cell.chars().count() > max => {
            let keep = max.saturating_sub(3);
            let mut cut: String = cell.chars().take(keep).collect();
            cut.push_str("...");
            cut
        }
        _ => cell,
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;

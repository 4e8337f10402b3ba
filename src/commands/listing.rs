//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Rendering of flamegraph rows for `db flamegraphs`

use std::io::Write;

use anyhow::Result;
use itertools::Itertools;

use crate::db::models::FlamegraphRow;
use crate::flamegraph::validate::format_timestamp;

const HEADERS: [&str; 8] = ["id", "name", "run id", "reason", "timestamp", "hardware", "commit", "file"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingFormat {
    /// ascii table limited to `max_width` columns
    Table { max_width: usize },

    /// CSV with a header record
    Csv,

    /// One tab separated line per row, for consumption by other tools
    Plain,
}

impl ListingFormat {
    /// CSV if requested, a table on a terminal, plain lines into a pipe
    pub fn for_stdout(csv: bool) -> Self {
        if csv {
            ListingFormat::Csv
        } else if crate::util::stdout_is_pipe() {
            ListingFormat::Plain
        } else {
            let max_width = terminal_size::terminal_size()
                .map(|(width, _)| width.0 as usize)
                .unwrap_or(80);
            ListingFormat::Table { max_width }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingRow {
    pub id: i32,
    pub name: String,
    pub run_id: String,
    pub run_reason: String,
    pub timestamp: String,
    pub hardware: String,
    pub commit: String,
    pub file: String,
}

impl From<FlamegraphRow> for ListingRow {
    fn from((flamegraph, hardware, commit): FlamegraphRow) -> Self {
        ListingRow {
            id: flamegraph.id,
            name: flamegraph.name,
            run_id: flamegraph.run_id,
            run_reason: flamegraph.run_reason.unwrap_or_default(),
            timestamp: format_timestamp(&flamegraph.timestamp),
            hardware: format!("{} ({})", hardware.name, hardware.kind),
            commit: commit.map(|c| c.sha).unwrap_or_default(),
            file: flamegraph.file_path.unwrap_or_default(),
        }
    }
}

impl ListingRow {
    fn cells(&self) -> [String; 8] {
        [
            self.id.to_string(),
            self.name.clone(),
            self.run_id.clone(),
            self.run_reason.clone(),
            self.timestamp.clone(),
            self.hardware.clone(),
            self.commit.clone(),
            self.file.clone(),
        ]
    }
}

pub fn write_listing<W: Write>(out: &mut W, rows: &[ListingRow], format: ListingFormat) -> Result<()> {
    match format {
        ListingFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record(HEADERS)?;
            for row in rows {
                wtr.write_record(row.cells())?;
            }
            wtr.flush()?;
        }

        ListingFormat::Plain => {
            for row in rows {
                writeln!(out, "{}", row.cells().iter().join("\t"))?;
            }
        }

        ListingFormat::Table { max_width } => {
            let mut table = ascii_table::AsciiTable::default();
            table.set_max_width(max_width);
            for (i, header) in HEADERS.iter().enumerate() {
                table.column(i).set_header(*header).set_align(ascii_table::Align::Left);
            }
            write!(out, "{}", table.format(rows.iter().map(ListingRow::cells)))?;
        }
    }

    Ok(())
}

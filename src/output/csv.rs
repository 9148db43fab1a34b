//! CSV output format.

use crate::cam::{Frame, FrameTotal};
use crate::table::DataTable;
use std::fmt::Display;
use std::io::{self, Write};

/// Write a row-major grid, one CSV line per row.
fn write_grid<W: Write, T: Display>(values: &[T], width: usize, mut writer: W) -> io::Result<()> {
    if width == 0 {
        return Ok(());
    }
    for row in values.chunks(width) {
        let mut first = true;
        for value in row {
            if !first {
                write!(writer, ",")?;
            }
            write!(writer, "{}", value)?;
            first = false;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write a frame as CSV: `height` lines of `width` pixel values.
pub fn write_csv_frame<W: Write>(frame: &Frame, writer: W) -> io::Result<()> {
    write_grid(frame.pixels(), frame.width() as usize, writer)
}

/// Write an accumulated (summed or averaged) frame as CSV.
pub fn write_csv_total<W: Write>(total: &FrameTotal, writer: W) -> io::Result<()> {
    write_grid(&total.values, total.width as usize, writer)
}

/// Write a table as CSV with a header row of column names.
pub fn write_csv_table<W: Write>(table: &DataTable, mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", table.column_names().join(","))?;

    for i in 0..table.len() {
        let row = table.row(i).unwrap_or_default();
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{}", line.join(","))?;
    }

    Ok(())
}

/// Write a table as CSV string.
pub fn to_csv_string_table(table: &DataTable) -> io::Result<String> {
    let mut buf = Vec::new();
    write_csv_table(table, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

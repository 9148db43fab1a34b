//! Plot output format - PNG frame images and sweep plots.

use crate::cam::Frame;
use crate::error::DataError;
use crate::table::DataTable;
use std::fmt::Debug;
use std::io;
use std::path::Path;

use plotters::backend::BitMapBackend;
use plotters::prelude::*;

fn draw_err<E: Debug>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{:?}", e))
}

/// Render a frame as a grayscale PNG, one image pixel per frame pixel.
///
/// Intensities are stretched so the frame's minimum is black and its
/// maximum white.
pub fn write_frame_png<P: AsRef<Path>>(frame: &Frame, output_path: P) -> io::Result<()> {
    let (min, max) = frame.min_max().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "cannot render an empty frame")
    })?;
    let span = (max - min).max(1) as f64;

    let root = BitMapBackend::new(output_path.as_ref(), frame.shape()).into_drawing_area();
    for (y, row) in frame.rows().enumerate() {
        for (x, &p) in row.iter().enumerate() {
            let level = ((p - min) as f64 / span * 255.0).round() as u8;
            root.draw_pixel((x as i32, y as i32), &RGBColor(level, level, level))
                .map_err(draw_err)?;
        }
    }
    root.present().map_err(draw_err)?;
    Ok(())
}

/// Plot `y_columns` of a table against `x_column` as a PNG line chart.
pub fn write_table_plot<P: AsRef<Path>>(
    table: &DataTable,
    x_column: &str,
    y_columns: &[&str],
    output_path: P,
    width: u32,
    height: u32,
) -> io::Result<()> {
    let invalid = |e: DataError| io::Error::new(io::ErrorKind::InvalidInput, e.to_string());
    let xs = table.column(x_column).map_err(invalid)?;
    let series: Vec<(&str, &[f64])> = y_columns
        .iter()
        .map(|&name| table.column(name).map(|ys| (name, ys)))
        .collect::<Result<_, _>>()
        .map_err(invalid)?;

    let finite = |v: &&f64| v.is_finite();
    let x_min = xs.iter().filter(finite).cloned().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().filter(finite).cloned().fold(f64::NEG_INFINITY, f64::max);
    let ys = series.iter().flat_map(|(_, ys)| ys.iter()).filter(finite);
    let y_min = ys.clone().cloned().fold(f64::INFINITY, f64::min);
    let y_max = ys.cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(x_min < x_max) || !(y_min <= y_max) {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not enough data to plot"));
    }

    // Add padding to y-axis
    let y_padding = ((y_max - y_min) * 0.05).max(f64::EPSILON);
    let y_min = y_min - y_padding;
    let y_max = y_max + y_padding;

    let root = BitMapBackend::new(output_path.as_ref(), (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Sweep", ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(x_column)
        .y_desc("Signal")
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 12))
        .draw()
        .map_err(draw_err)?;

    for (i, (name, ys)) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let points: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        chart
            .draw_series(LineSeries::new(points, &color))
            .map_err(draw_err)?
            .label(*name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Plot with default dimensions (1200x600).
pub fn write_table_plot_default<P: AsRef<Path>>(
    table: &DataTable,
    x_column: &str,
    y_columns: &[&str],
    output_path: P,
) -> io::Result<()> {
    write_table_plot(table, x_column, y_columns, output_path, 1200, 600)
}

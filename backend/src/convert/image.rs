//! Raster exports: the dataset drawn as a table grid, encoded as PNG or JPG.

use std::io::Cursor;

use ::image::{DynamicImage, ImageFormat};

use super::{row_window, TargetFormat};
use crate::error::{ConvertError, ConvertResult};
use crate::models::Dataset;
use crate::render::{Align, Canvas, BLACK, LIGHT_GRAY};

/// Cell width: 2 inches at 100 dpi.
pub const CELL_WIDTH: u32 = 200;

/// Row height: half an inch at 100 dpi.
pub const ROW_HEIGHT: u32 = 50;

/// Glyph scale for cell text (16 px characters).
const TEXT_SCALE: u32 = 2;

/// Hard cap on rows drawn, whatever the preview limit.
pub const MAX_IMAGE_ROWS: usize = 1000;

/// A rendered table and what it contains.
pub struct TableImage {
    pub canvas: Canvas,
    pub rows_rendered: usize,
    pub truncated: bool,
}

/// Draw the header and up to `limit` rows (never more than
/// [`MAX_IMAGE_ROWS`]) as a grid of centred cells.
///
/// The image is `columns × 200` px wide and `(rows + 1) × 50` px tall.
pub fn table_image(dataset: &Dataset, limit: Option<usize>) -> TableImage {
    let limit = Some(limit.unwrap_or(MAX_IMAGE_ROWS).min(MAX_IMAGE_ROWS));
    let (rows, truncated) = row_window(dataset.row_count(), limit);

    let cols = dataset.column_count() as u32;
    let width = cols * CELL_WIDTH;
    let height = (rows as u32 + 1) * ROW_HEIGHT;
    let mut canvas = Canvas::new(width, height);

    // Header
    for (c, name) in dataset.column_names().into_iter().enumerate() {
        let x = (c as u32 * CELL_WIDTH) as i64;
        canvas.fill_rect(x, 0, CELL_WIDTH, ROW_HEIGHT, LIGHT_GRAY);
        canvas.draw_text_in_box(x, 0, CELL_WIDTH, ROW_HEIGHT, name, TEXT_SCALE, Align::Center, BLACK);
        // Second pass one pixel right for a bold header.
        canvas.draw_text_in_box(x + 1, 0, CELL_WIDTH, ROW_HEIGHT, name, TEXT_SCALE, Align::Center, BLACK);
    }

    for (r, row) in dataset.rows().take(rows).enumerate() {
        let y = ((r as u32 + 1) * ROW_HEIGHT) as i64;
        for (c, cell) in row.into_iter().enumerate() {
            let x = (c as u32 * CELL_WIDTH) as i64;
            let text = cell.to_string();
            canvas.draw_text_in_box(x, y, CELL_WIDTH, ROW_HEIGHT, &text, TEXT_SCALE, Align::Center, BLACK);
        }
    }

    // Grid lines
    for c in 0..cols {
        for r in 0..=rows as u32 {
            canvas.stroke_rect(
                (c * CELL_WIDTH) as i64,
                (r * ROW_HEIGHT) as i64,
                CELL_WIDTH,
                ROW_HEIGHT,
                BLACK,
            );
        }
    }

    TableImage {
        canvas,
        rows_rendered: rows,
        truncated,
    }
}

/// Encode a canvas as PNG or JPG.
pub fn encode(canvas: &Canvas, target: TargetFormat) -> ConvertResult<Vec<u8>> {
    let format = match target {
        TargetFormat::Png => ImageFormat::Png,
        TargetFormat::Jpg => ImageFormat::Jpeg,
        other => return Err(ConvertError::UnsupportedTarget(other.to_string())),
    };

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(canvas.image().clone())
        .write_to(&mut buffer, format)
        .map_err(|e| ConvertError::render(target.to_string(), e))?;
    Ok(buffer.into_inner())
}

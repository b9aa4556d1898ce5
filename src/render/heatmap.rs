use std::path::Path;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::model::matrix::VizMatrix;
use crate::render::palette::ColorScale;
use crate::render::{RenderError, draw_error, text_width};

const TITLE_PX: i32 = 56;
const LABEL_FONT: f64 = 13.0;
const LEGEND_WIDTH: i32 = 110;
const PAD: i32 = 16;

/// Pixel boxes for the cell grid and its labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapLayout {
    pub grid_left: i32,
    pub grid_top: i32,
    pub cell_w: f64,
    pub cell_h: f64,
}

pub fn layout(matrix: &VizMatrix, width: u32, height: u32) -> HeatmapLayout {
    let row_label_w = matrix
        .row_names
        .iter()
        .map(|s| text_width(s, LABEL_FONT))
        .max()
        .unwrap_or(0);
    let col_label_h = matrix
        .col_names
        .iter()
        .map(|s| text_width(s, LABEL_FONT))
        .max()
        .unwrap_or(0);
    let grid_left = PAD + row_label_w + 8;
    let grid_top = TITLE_PX;
    let grid_w = (width as i32 - grid_left - LEGEND_WIDTH - PAD).max(matrix.n_cols() as i32);
    let grid_h = (height as i32 - grid_top - col_label_h - PAD - 8).max(matrix.n_rows() as i32);
    HeatmapLayout {
        grid_left,
        grid_top,
        cell_w: grid_w as f64 / matrix.n_cols().max(1) as f64,
        cell_h: grid_h as f64 / matrix.n_rows().max(1) as f64,
    }
}

/// Draws `matrix` as a heatmap with row labels on the left, rotated column
/// labels underneath and a color bar for `scale` on the right.
pub fn render_heatmap(
    path: &Path,
    matrix: &VizMatrix,
    scale: &ColorScale,
    legend_title: &str,
    width: u32,
    height: u32,
) -> Result<(), RenderError> {
    if matrix.is_empty() {
        return Err(RenderError::Empty(matrix.title.clone()));
    }
    let err = draw_error(path);
    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(&err)?;

    let geo = layout(matrix, width, height);
    let label_style = ("sans-serif", LABEL_FONT).into_font().color(&BLACK);

    root.draw(&Text::new(
        matrix.title.clone(),
        (width as i32 / 2, TITLE_PX / 2),
        ("sans-serif", 20.0)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center)),
    ))
    .map_err(&err)?;

    for (r, row) in matrix.values.iter().enumerate() {
        let y0 = geo.grid_top as f64 + r as f64 * geo.cell_h;
        for (c, &value) in row.iter().enumerate() {
            let x0 = geo.grid_left as f64 + c as f64 * geo.cell_w;
            root.draw(&Rectangle::new(
                [
                    (x0 as i32, y0 as i32),
                    ((x0 + geo.cell_w).ceil() as i32, (y0 + geo.cell_h).ceil() as i32),
                ],
                scale.color(value).filled(),
            ))
            .map_err(&err)?;
        }
        root.draw(&Text::new(
            matrix.row_names[r].clone(),
            (geo.grid_left - 6, (y0 + geo.cell_h / 2.0) as i32),
            label_style.clone().pos(Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(&err)?;
    }

    let grid_bottom = geo.grid_top + (geo.cell_h * matrix.n_rows() as f64) as i32;
    let col_style = ("sans-serif", LABEL_FONT)
        .into_font()
        .transform(FontTransform::Rotate270)
        .color(&BLACK)
        .pos(Pos::new(HPos::Right, VPos::Center));
    for (c, name) in matrix.col_names.iter().enumerate() {
        let x = geo.grid_left as f64 + (c as f64 + 0.5) * geo.cell_w;
        root.draw(&Text::new(name.clone(), (x as i32, grid_bottom + 6), col_style.clone()))
            .map_err(&err)?;
    }

    draw_legend(&root, scale, legend_title, geo.grid_top, width).map_err(&err)?;
    root.present().map_err(&err)?;
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scale: &ColorScale,
    title: &str,
    top: i32,
    width: u32,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let x0 = width as i32 - LEGEND_WIDTH + 10;
    let bar_h = 160;
    let steps = 40;
    root.draw(&Text::new(
        title.to_string(),
        (x0, top),
        ("sans-serif", 12.0).into_font().color(&BLACK),
    ))?;
    let bar_top = top + 20;
    for i in 0..steps {
        let t = 1.0 - i as f64 / (steps - 1) as f64;
        let value = scale.min + t * (scale.max - scale.min);
        let y = bar_top + i * bar_h / steps;
        root.draw(&Rectangle::new(
            [(x0, y), (x0 + 18, y + bar_h / steps + 1)],
            scale.color(value).filled(),
        ))?;
    }
    let tick_style = ("sans-serif", 11.0).into_font().color(&BLACK);
    root.draw(&Text::new(
        format!("{:.3}", scale.max),
        (x0 + 24, bar_top),
        tick_style.clone(),
    ))?;
    root.draw(&Text::new(
        format!("{:.3}", scale.min),
        (x0 + 24, bar_top + bar_h - 10),
        tick_style,
    ))?;
    Ok(())
}

pub mod chord;
pub mod heatmap;
pub mod palette;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("drawing {path} failed: {message}")]
    Draw { path: String, message: String },
    #[error("nothing to draw for {0}")]
    Empty(String),
}

/// Wraps a plotters drawing error with the output path.
pub(crate) fn draw_error<E: std::fmt::Display>(path: &std::path::Path) -> impl Fn(E) -> RenderError + '_ {
    move |err| RenderError::Draw {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Rough pixel width of `text` at `font_px`, for margin sizing.
pub(crate) fn text_width(text: &str, font_px: f64) -> i32 {
    (text.chars().count() as f64 * font_px * 0.6).ceil() as i32
}

use crate::report::RunSummary;

pub fn render_summary_json(summary: &RunSummary) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(summary)?;
    json.push('\n');
    Ok(json)
}

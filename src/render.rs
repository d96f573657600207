use crate::domain::ComicRecord;

/// Renders one comic record through the configured template. Placeholders:
/// `$image$`, `$url$` (canonical page, `<base_url>/<id>`), `$title$`,
/// `$index$`.
pub fn render_record(template: &str, base_url: &str, record: &ComicRecord) -> String {
    template
        .replace("$image$", &record.image)
        .replace("$url$", &format!("{}/{}", base_url, record.id))
        .replace("$title$", &record.title)
        .replace("$index$", &record.id.to_string())
}

/// Substitutes the four record slots of the summary template.
pub fn render_summary(template: &str, latest: &str, picks: &[String; 3]) -> String {
    template
        .replace("$new$", latest)
        .replace("$random1$", &picks[0])
        .replace("$random2$", &picks[1])
        .replace("$random3$", &picks[2])
}

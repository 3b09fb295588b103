/// Clean HTML content using the ammonia library.
///
/// Question stems, options and explanations are rendered as rich text by
/// clients, so ingestion keeps safe formatting tags (<b>, <code>, <p>) and
/// strips scripts, iframes and event-handler attributes.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input).trim().to_string()
}

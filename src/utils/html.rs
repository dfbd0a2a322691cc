use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Lesson text is pasted or uploaded by an admin and later rendered to every
/// user, so it goes through whitelist-based sanitization: safe tags survive,
/// <script>/<iframe> and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Keywords that mark an event as shared across courses and uploads
pub const COMMON_KEYWORDS: [&str; 3] = ["holiday", "break", "no class"];

/// Check whether an event description marks it as a common event.
///
/// Plain substring match on the lower-cased description, so "breakfast"
/// also counts as a break.
pub fn is_common(description: Option<&str>) -> bool {
    let description = description.unwrap_or_default().to_lowercase();
    COMMON_KEYWORDS
        .iter()
        .any(|keyword| description.contains(keyword))
}

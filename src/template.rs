//! Placeholder substitution for service log messages.
//!
//! Recognized tokens:
//!
//! | Token       | Replaced with                          |
//! |-------------|----------------------------------------|
//! | `$service$` | the service's display form             |
//! | `$objects$` | the display form of its current objects |
//! | `$result$`  | same as `$objects$`                    |
//!
//! Replacement is literal. The template is scanned once, so text inserted
//! for one token is never scanned for further tokens.

/// Token replaced with the service.
pub const SERVICE_TOKEN: &str = "$service$";
/// Token replaced with the service's objects.
pub const OBJECTS_TOKEN: &str = "$objects$";
/// Older spelling of [`OBJECTS_TOKEN`].
pub const RESULT_TOKEN: &str = "$result$";

/// Something a log message can describe.
pub trait LogSubject {
    /// Text for `$service$`.
    fn subject(&self) -> String;

    /// Text for `$objects$` and `$result$`.
    fn objects(&self) -> String;
}

/// Substitutes placeholders in `template`.
///
/// Without a subject the template is returned unchanged, placeholders
/// included.
///
/// ```
/// use heaven::template::{format_log_message, LogSubject};
///
/// struct Article;
///
/// impl LogSubject for Article {
///     fn subject(&self) -> String {
///         "{ArticleService <Manager: Article>}".to_string()
///     }
///     fn objects(&self) -> String {
///         "<Manager: Article>".to_string()
///     }
/// }
///
/// assert_eq!(
///     format_log_message("hello $service$", Some(&Article)),
///     "hello {ArticleService <Manager: Article>}"
/// );
/// assert_eq!(format_log_message("hello $service$", None), "hello $service$");
/// ```
pub fn format_log_message(template: &str, subject: Option<&dyn LogSubject>) -> String {
    let Some(subject) = subject else {
        return template.to_string();
    };

    let mut service: Option<String> = None;
    let mut objects: Option<String> = None;
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        if let Some(after) = tail.strip_prefix(SERVICE_TOKEN) {
            out.push_str(service.get_or_insert_with(|| subject.subject()));
            rest = after;
        } else if let Some(after) = tail
            .strip_prefix(OBJECTS_TOKEN)
            .or_else(|| tail.strip_prefix(RESULT_TOKEN))
        {
            out.push_str(objects.get_or_insert_with(|| subject.objects()));
            rest = after;
        } else {
            out.push('$');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

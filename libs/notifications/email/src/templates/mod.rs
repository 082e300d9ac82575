//! Bundled HTML email templates rendered with Handlebars
//!
//! - `TemplateSource`: read-only `path -> contents` lookup
//! - `EmbeddedTemplates`: the templates compiled into the binary
//! - `TemplateRegistry`: parsed templates, immutable after [`TemplateRegistry::load`]
//!
//! Missing keys render as empty strings and values are HTML-escaped.

use crate::error::{NotificationError, NotificationResult};
use handlebars::Handlebars;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};

/// Template variables, keyed by the names used in the HTML (`{{UserName}}`).
pub type TemplateData = Map<String, Value>;

/// A parsed template.
pub type TemplateDefinition = handlebars::Template;

/// Templates loaded at startup, in load order.
pub const TEMPLATE_MANIFEST: &[&str] = &[
    "password_reset",
    "movie_suggestion",
    "welcome",
    "recommendation",
];

/// Where a template's source lives inside a [`TemplateSource`].
pub fn template_path(name: &str) -> String {
    format!("templates/{}.html", name)
}

pub trait TemplateSource: Send + Sync {
    fn read(&self, path: &str) -> Option<&str>;
}

impl TemplateSource for HashMap<String, String> {
    fn read(&self, path: &str) -> Option<&str> {
        self.get(path).map(String::as_str)
    }
}

/// Templates bundled with `include_str!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplates;

impl TemplateSource for EmbeddedTemplates {
    fn read(&self, path: &str) -> Option<&str> {
        match path {
            "templates/password_reset.html" => {
                Some(include_str!("../../templates/password_reset.html"))
            }
            "templates/movie_suggestion.html" => {
                Some(include_str!("../../templates/movie_suggestion.html"))
            }
            "templates/welcome.html" => Some(include_str!("../../templates/welcome.html")),
            _ => None,
        }
    }
}

/// HTML-escape a rendered value.
///
/// Only `& < > " '` are replaced, so URLs keep their `=` and `/` intact.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub struct TemplateRegistry {
    handlebars: Handlebars<'static>,
}

impl TemplateRegistry {
    /// Parse every template in `names` that `source` provides.
    ///
    /// Returns the registry and the names that had no source. A template that
    /// fails to parse aborts the whole load.
    pub fn load(
        names: &[&str],
        source: &dyn TemplateSource,
    ) -> NotificationResult<(Self, Vec<String>)> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(escape_html);

        let mut skipped = Vec::new();

        for &name in names {
            let path = template_path(name);
            let Some(content) = source.read(&path) else {
                warn!(template = name, path = %path, "Template not found, skipping");
                skipped.push(name.to_string());
                continue;
            };

            handlebars
                .register_template_string(name, content)
                .map_err(|e| NotificationError::TemplateParse {
                    name: name.to_string(),
                    source: Box::new(e),
                })?;

            info!(template = name, "Loaded email template");
        }

        Ok((Self { handlebars }, skipped))
    }

    /// Load [`TEMPLATE_MANIFEST`] from [`EmbeddedTemplates`].
    pub fn embedded() -> NotificationResult<(Self, Vec<String>)> {
        Self::load(TEMPLATE_MANIFEST, &EmbeddedTemplates)
    }

    pub fn lookup(&self, name: &str) -> NotificationResult<&TemplateDefinition> {
        self.handlebars
            .get_template(name)
            .ok_or_else(|| NotificationError::TemplateNotFound(name.to_string()))
    }

    pub fn render(&self, name: &str, data: &TemplateData) -> NotificationResult<String> {
        self.lookup(name)?;

        self.handlebars
            .render(name, data)
            .map_err(|e| NotificationError::Render {
                name: name.to_string(),
                source: Box::new(e),
            })
    }

    /// Loaded template names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlebars
            .get_templates()
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> TemplateData {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn source(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(name, body)| (template_path(name), body.to_string()))
            .collect()
    }

    #[test]
    fn test_embedded_load_skips_recommendation() {
        let (registry, skipped) = TemplateRegistry::embedded().unwrap();

        for name in ["password_reset", "movie_suggestion", "welcome"] {
            assert!(registry.lookup(name).is_ok(), "{} should be loaded", name);
        }
        assert_eq!(skipped, vec!["recommendation".to_string()]);
        assert!(matches!(
            registry.lookup("recommendation"),
            Err(NotificationError::TemplateNotFound(ref n)) if n == "recommendation"
        ));
        assert_eq!(registry.names().len(), 3);
    }

    #[test]
    fn test_names_sorted() {
        let (registry, _) = TemplateRegistry::embedded().unwrap();
        assert_eq!(
            registry.names(),
            vec!["movie_suggestion", "password_reset", "welcome"]
        );
    }

    #[test]
    fn test_render_password_reset() {
        let (registry, _) = TemplateRegistry::embedded().unwrap();
        let link = "https://example.com/reset?token=abc123";

        let html = registry
            .render(
                "password_reset",
                &data(json!({
                    "Subject": "Reset Your Password",
                    "UserName": "John Doe",
                    "ResetLink": link
                })),
            )
            .unwrap();

        assert!(html.contains("John Doe"));
        assert!(html.contains(link));
        assert!(html.contains("CineCore"));
    }

    #[test]
    fn test_render_movie_suggestion() {
        let (registry, _) = TemplateRegistry::embedded().unwrap();

        let html = registry
            .render(
                "movie_suggestion",
                &data(json!({
                    "Subject": "New Movie Available!",
                    "UserName": "Jane Smith",
                    "MovieTitle": "Inception",
                    "MovieGenre": "Sci-Fi",
                    "MovieDuration": "148 minutes",
                    "ShowingDate": "January 15, 2026",
                    "BookingLink": "https://example.com/book/inception"
                })),
            )
            .unwrap();

        for expected in [
            "Jane Smith",
            "Inception",
            "Sci-Fi",
            "148 minutes",
            "January 15, 2026",
            "CineCore",
        ] {
            assert!(html.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_missing_keys_render_empty() {
        let templates = source(&[("greeting", "<p>Hi {{UserName}}!</p>")]);
        let (registry, _) = TemplateRegistry::load(&["greeting"], &templates).unwrap();

        let html = registry.render("greeting", &TemplateData::new()).unwrap();
        assert_eq!(html, "<p>Hi !</p>");
    }

    #[test]
    fn test_values_are_escaped() {
        let templates = source(&[("greeting", "<p>{{UserName}}</p>")]);
        let (registry, _) = TemplateRegistry::load(&["greeting"], &templates).unwrap();

        let html = registry
            .render("greeting", &data(json!({ "UserName": "<script>" })))
            .unwrap();
        assert_eq!(html, "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_link_query_survives_escaping() {
        let templates = source(&[("link", r#"<a href="{{Link}}">{{Label}}</a>"#)]);
        let (registry, _) = TemplateRegistry::load(&["link"], &templates).unwrap();

        let html = registry
            .render(
                "link",
                &data(json!({
                    "Link": "https://cinecore.test/a?b=1&c=2",
                    "Label": "Tom's \"pick\""
                })),
            )
            .unwrap();
        assert_eq!(
            html,
            r#"<a href="https://cinecore.test/a?b=1&amp;c=2">Tom&#39;s &#34;pick&#34;</a>"#
        );
    }

    #[test]
    fn test_escape_html_leaves_url_characters() {
        assert_eq!(escape_html("a=b/c?d`e"), "a=b/c?d`e");
        assert_eq!(escape_html("<&>"), "&lt;&amp;&gt;");
    }

    #[test]
    fn test_render_is_deterministic() {
        let (registry, _) = TemplateRegistry::embedded().unwrap();
        let input = data(json!({
            "Subject": "Welcome",
            "UserName": "Jane",
            "AppLink": "https://cinecore.test/app"
        }));

        let first = registry.render("welcome", &input).unwrap();
        let second = registry.render("welcome", &input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_unknown_template() {
        let (registry, _) = TemplateRegistry::embedded().unwrap();

        let err = registry.render("nonexistent", &TemplateData::new()).unwrap_err();
        assert_eq!(err.to_string(), "template nonexistent not found");
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let result = TemplateRegistry::load(&["broken"], &source(&[("broken", "<p>{{#if}}</p>")]));

        assert!(matches!(
            result,
            Err(NotificationError::TemplateParse { ref name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn test_helper_misuse_is_render_error() {
        let templates = source(&[("lookup", "{{lookup UserName}}")]);
        let (registry, _) = TemplateRegistry::load(&["lookup"], &templates).unwrap();

        let err = registry.render("lookup", &TemplateData::new()).unwrap_err();
        assert!(matches!(err, NotificationError::Render { .. }));
    }
}

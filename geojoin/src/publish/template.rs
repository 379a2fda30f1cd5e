//! Popup templates with `{FIELD}` placeholders.

use std::fmt::Write;

use serde::Serialize;

use crate::feature::Attributes;

pub const DEFAULT_POPUP_TITLE: &str = "{FLD_ZONE}";
pub const DEFAULT_POPUP_CONTENT: &str = "Esri Symbology: {ESRI_SYMBOLOGY}";

/// Title and content templates rendered per element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupTemplate {
    pub title: String,
    pub content: String,
}

impl PopupTemplate {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn render_title(&self, attributes: &Attributes) -> String {
        render(&self.title, attributes)
    }

    pub fn render_content(&self, attributes: &Attributes) -> String {
        render(&self.content, attributes)
    }
}

impl Default for PopupTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_POPUP_TITLE, DEFAULT_POPUP_CONTENT)
    }
}

/// Substitute `{FIELD}` with the attribute's display text.
///
/// Missing fields render empty. `{{` and `}}` produce literal braces; an
/// unterminated `{` is copied through.
pub fn render(template: &str, attributes: &Attributes) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(|c| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
        } else if let Some(after) = tail.strip_prefix('{') {
            match after.find('}') {
                Some(end) => {
                    if let Some(value) = attributes.get(after[..end].trim()) {
                        let _ = write!(out, "{}", value);
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            // Lone '}'
            out.push('}');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::AttributeValue;

    fn attributes() -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("FLD_ZONE".into(), AttributeValue::from("AE"));
        attributes.insert("ESRI_SYMBOLOGY".into(), AttributeValue::from("1% Annual Chance"));
        attributes.insert("STATIC_BFE".into(), AttributeValue::from(9.0));
        attributes
    }

    #[test]
    fn test_default_template() {
        let popup = PopupTemplate::default();
        assert_eq!(popup.render_title(&attributes()), "AE");
        assert_eq!(
            popup.render_content(&attributes()),
            "Esri Symbology: 1% Annual Chance"
        );
    }

    #[test]
    fn test_missing_field_renders_empty() {
        assert_eq!(render("Zone {NOPE}!", &attributes()), "Zone !");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(render("{{FLD_ZONE}} = {FLD_ZONE}", &attributes()), "{FLD_ZONE} = AE");
    }

    #[test]
    fn test_unterminated_placeholder_copied() {
        assert_eq!(render("BFE {STATIC_BFE", &attributes()), "BFE {STATIC_BFE");
        assert_eq!(render("a } b", &attributes()), "a } b");
    }

    #[test]
    fn test_numeric_field() {
        assert_eq!(render("BFE {STATIC_BFE} ft", &attributes()), "BFE 9 ft");
    }
}

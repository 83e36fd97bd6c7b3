use once_cell::sync::Lazy;
use regex::Regex;

use super::markup::{self, Attributes};
use super::{FieldRef, FormRef};
use crate::error::{ReplayError, Result};

static FORM_TAG: Lazy<Regex> = Lazy::new(|| markup::start_tag_regex(&["form"]));
static FIELD_TAG: Lazy<Regex> = Lazy::new(|| markup::start_tag_regex(&["input", "textarea"]));

/// A `<form>` located in the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    /// 1-based ordinal in document order.
    pub index: usize,
    pub attrs: Attributes,
    /// Markup between the start tag and `</form>` (or the next form / end of page).
    pub body: String,
}

impl Form {
    /// The declared `action`, or empty (submit to the current page).
    pub fn action(&self) -> &str {
        self.attrs.get("action").unwrap_or("")
    }

    /// The declared method, uppercased; `GET` when absent or blank.
    pub fn method(&self) -> String {
        match self.attrs.get("method").map(str::trim) {
            Some(m) if !m.is_empty() => m.to_ascii_uppercase(),
            _ => "GET".to_string(),
        }
    }

    pub fn fields(&self) -> Vec<FormField> {
        form_fields(&self.body)
    }
}

/// One `<input>` or `<textarea>` inside a form body.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub tag: String,
    pub name: String,
    pub id: Option<String>,
    /// Markup-declared default: `value=` for inputs, the element text for textareas.
    pub value: String,
}

/// Every `<form>` in the page, comments excluded.
pub fn find_forms(html: &str) -> Vec<Form> {
    let html = markup::strip_comments(html);
    let tags = markup::find_tags(&html, &FORM_TAG);
    tags.iter()
        .enumerate()
        .map(|(i, tag)| {
            let limit = tags.get(i + 1).map_or(html.len(), |next| next.start);
            let end = markup::find_close_tag(&html, "form", tag.end)
                .filter(|&close| close <= limit)
                .unwrap_or(limit);
            Form {
                index: i + 1,
                attrs: tag.attrs.clone(),
                body: html[tag.end..end].to_string(),
            }
        })
        .collect()
}

/// Resolve a form reference against the page.
pub fn find_form(html: &str, form_ref: &FormRef) -> Result<Form> {
    let mut forms = find_forms(html);
    let found = match form_ref {
        FormRef::Position(n) => {
            if *n == 0 || *n > forms.len() {
                None
            } else {
                Some(forms.swap_remove(n - 1))
            }
        }
        FormRef::Name(name) => forms
            .into_iter()
            .find(|f| f.attrs.is("name", name) || f.attrs.is("id", name)),
    };
    found.ok_or_else(|| ReplayError::selector(format!("{} not found in page", form_ref)))
}

/// All `<input>`/`<textarea>` tags of a form body in document order.
pub fn form_fields(body: &str) -> Vec<FormField> {
    markup::find_tags(body, &FIELD_TAG)
        .into_iter()
        .map(|tag| {
            let value = if tag.name == "textarea" {
                let close = markup::find_close_tag(body, "textarea", tag.end).unwrap_or(body.len());
                body[tag.end..close].to_string()
            } else {
                tag.attrs.get("value").unwrap_or("").to_string()
            };
            FormField {
                name: tag.attrs.get("name").unwrap_or("").to_string(),
                id: tag.attrs.get("id").map(str::to_string),
                tag: tag.name,
                value,
            }
        })
        .collect()
}

/// Find the field a selector points at. The returned field always has a name, since
/// that is what the fill buffer and the submitted payload are keyed by.
pub fn find_field(form: &Form, field_ref: &FieldRef) -> Result<FormField> {
    let mut fields = form.fields();
    let found = match field_ref {
        FieldRef::Position(n) => {
            if *n == 0 || *n > fields.len() {
                None
            } else {
                Some(fields.swap_remove(n - 1))
            }
        }
        FieldRef::Id(id) => fields.into_iter().find(|f| f.id.as_deref() == Some(id.as_str())),
        FieldRef::Name(name) => fields.into_iter().find(|f| &f.name == name),
    };
    let field = found.ok_or_else(|| {
        ReplayError::selector(format!("{} not found in form {}", field_ref, form.index))
    })?;
    if field.name.is_empty() {
        return Err(ReplayError::selector(format!(
            "{} in form {} has no name attribute",
            field_ref, form.index
        )));
    }
    Ok(field)
}

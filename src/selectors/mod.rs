//! The selector dialect recorded scripts use to address forms, fields, links and frames.
//!
//! Selectors look like XPath (`/HTML/BODY/FORM[@NAME="login"]/INPUT[@NAME="user"]`) but
//! only a handful of shapes are recognized, and they are evaluated against raw markup
//! text rather than a document tree.

pub mod form;
pub mod frame;
pub mod link;
pub mod markup;

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ReplayError;

/// Which form a selector addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormRef {
    /// 1-based ordinal in document order.
    Position(usize),
    /// Matches the form's `name` or `id` attribute.
    Name(String),
}

/// Which field inside a form a selector addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Id(String),
    Name(String),
    /// 1-based ordinal among the form's `<input>`/`<textarea>` tags.
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRef {
    /// Visible text of the anchor.
    Text(String),
    /// Substring of the anchor's `href`.
    Href(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The form itself (clicking it submits).
    Form,
    Field(FieldRef),
    Link(LinkRef),
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub form: Option<FormRef>,
    pub target: Target,
}

static FORM_POSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|/)FORM\[\s*(\d+)\s*\]").expect("form position regex"));
static FORM_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|/)FORM\[\s*@(?:NAME|ID)\s*=\s*["']?([^"'\]]*)["']?\s*\]"#)
        .expect("form name regex")
});
static FIELD_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|/)(?:INPUT|TEXTAREA)\[\s*@(ID|NAME)\s*=\s*["']?([^"'\]]*)["']?\s*\]"#)
        .expect("field attribute regex")
});
static FIELD_POSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|/)(?:INPUT|TEXTAREA)\[\s*(\d+)\s*\]").expect("field position regex")
});
static LINK_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)(?:^|/)A\[\s*@CDATA\s*=\s*(?:"(.*)"|'(.*)')\s*\]"#).expect("link text regex")
});
static LINK_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)(?:^|/)A\[\s*@HREF\s*=\s*(?:"(.*)"|'(.*)')\s*\]"#).expect("link href regex")
});

fn quoted(caps: &regex::Captures<'_>) -> String {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn ordinal(digits: &str, selector: &str) -> Result<usize, ReplayError> {
    match digits.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ReplayError::selector(format!(
            "positions are 1-based, got [{}] in '{}'",
            digits, selector
        ))),
    }
}

impl FromStr for Selector {
    type Err = ReplayError;

    fn from_str(selector: &str) -> Result<Self, Self::Err> {
        let trimmed = selector.trim();

        // Links first: an anchor inside a form is still a link.
        if let Some(caps) = LINK_TEXT.captures(trimmed) {
            return Ok(Self {
                form: None,
                target: Target::Link(LinkRef::Text(quoted(&caps))),
            });
        }
        if let Some(caps) = LINK_HREF.captures(trimmed) {
            return Ok(Self {
                form: None,
                target: Target::Link(LinkRef::Href(quoted(&caps))),
            });
        }

        let form = if let Some(caps) = FORM_POSITION.captures(trimmed) {
            Some(FormRef::Position(ordinal(&caps[1], trimmed)?))
        } else {
            FORM_NAME
                .captures(trimmed)
                .map(|caps| FormRef::Name(caps[1].to_string()))
        };

        let field = if let Some(caps) = FIELD_ATTR.captures(trimmed) {
            let value = caps[2].to_string();
            Some(if caps[1].eq_ignore_ascii_case("id") {
                FieldRef::Id(value)
            } else {
                FieldRef::Name(value)
            })
        } else if let Some(caps) = FIELD_POSITION.captures(trimmed) {
            Some(FieldRef::Position(ordinal(&caps[1], trimmed)?))
        } else {
            None
        };

        match (form, field) {
            (Some(form), Some(field)) => Ok(Self {
                form: Some(form),
                target: Target::Field(field),
            }),
            (Some(form), None) => Ok(Self {
                form: Some(form),
                target: Target::Form,
            }),
            (None, Some(_)) => Err(ReplayError::selector(format!(
                "field selector '{}' does not name a FORM",
                trimmed
            ))),
            (None, None) => Err(ReplayError::selector(format!(
                "unrecognized selector '{}'",
                trimmed
            ))),
        }
    }
}

impl fmt::Display for FormRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(n) => write!(f, "FORM[{}]", n),
            Self::Name(name) => write!(f, "FORM[@NAME=\"{}\"]", name),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "INPUT[@ID=\"{}\"]", id),
            Self::Name(name) => write!(f, "INPUT[@NAME=\"{}\"]", name),
            Self::Position(n) => write!(f, "INPUT[{}]", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Selector {
        s.parse().expect("selector should parse")
    }

    #[test]
    fn test_form_by_position_with_named_field() {
        let sel = parse(r#"/HTML/BODY/FORM[1]/INPUT[@NAME="user"]"#);
        assert_eq!(sel.form, Some(FormRef::Position(1)));
        assert_eq!(sel.target, Target::Field(FieldRef::Name("user".into())));
    }

    #[test]
    fn test_form_by_name_with_field_id_lowercase() {
        let sel = parse(r#"/html/body/form[@name='login']/input[@id=pw]"#);
        assert_eq!(sel.form, Some(FormRef::Name("login".into())));
        assert_eq!(sel.target, Target::Field(FieldRef::Id("pw".into())));
    }

    #[test]
    fn test_positional_textarea() {
        let sel = parse("/HTML/BODY/FORM[2]/TABLE/TR/TD/TEXTAREA[3]");
        assert_eq!(sel.form, Some(FormRef::Position(2)));
        assert_eq!(sel.target, Target::Field(FieldRef::Position(3)));
    }

    #[test]
    fn test_bare_form_targets_form() {
        let sel = parse(r#"/HTML/BODY/FORM[@ID="search"]"#);
        assert_eq!(sel.form, Some(FormRef::Name("search".into())));
        assert_eq!(sel.target, Target::Form);
    }

    #[test]
    fn test_link_by_text() {
        let sel = parse(r#"/HTML/BODY/A[@CDATA="Sign in"]"#);
        assert_eq!(sel.target, Target::Link(LinkRef::Text("Sign in".into())));
        assert!(sel.form.is_none());
    }

    #[test]
    fn test_link_inside_form_is_link() {
        let sel = parse(r#"/HTML/BODY/FORM[1]/A[@HREF="help.html"]"#);
        assert_eq!(sel.target, Target::Link(LinkRef::Href("help.html".into())));
    }

    #[test]
    fn test_link_text_may_contain_quotes_and_brackets() {
        let sel = parse(r#"/HTML/BODY/A[@CDATA="Say "hi" [now]"]"#);
        assert_eq!(sel.target, Target::Link(LinkRef::Text(r#"Say "hi" [now]"#.into())));
    }

    #[test]
    fn test_textarea_is_not_an_anchor() {
        let sel = parse(r#"/HTML/BODY/FORM[1]/TEXTAREA[@NAME="a"]"#);
        assert_eq!(sel.target, Target::Field(FieldRef::Name("a".into())));
    }

    #[test]
    fn test_zero_position_rejected() {
        let err = "/HTML/BODY/FORM[0]".parse::<Selector>().unwrap_err();
        assert!(err.to_string().contains("1-based"));
    }

    #[test]
    fn test_field_without_form_rejected() {
        let err = r#"/HTML/BODY/INPUT[@NAME="q"]"#.parse::<Selector>().unwrap_err();
        assert!(matches!(err, ReplayError::Selector(_)));
    }

    #[test]
    fn test_unrecognized_selector() {
        let err = "#login-form".parse::<Selector>().unwrap_err();
        assert!(err.to_string().contains("unrecognized selector"));
    }
}

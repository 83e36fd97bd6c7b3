use std::collections::HashMap;

/// Field values typed by `fill` steps, waiting for the `click` that submits their form.
///
/// Keyed by the form's 1-based ordinal, then by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFillBuffer {
    forms: HashMap<usize, HashMap<String, String>>,
}

impl FormFillBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, form: usize, field: impl Into<String>, value: impl Into<String>) {
        self.forms
            .entry(form)
            .or_default()
            .insert(field.into(), value.into());
    }

    pub fn get(&self, form: usize, field: &str) -> Option<&str> {
        self.forms
            .get(&form)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    pub fn fields(&self, form: usize) -> Option<&HashMap<String, String>> {
        self.forms.get(&form)
    }

    pub fn clear(&mut self) {
        self.forms.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_per_form() {
        let mut buffer = FormFillBuffer::new();
        buffer.set(1, "user", "alice");
        buffer.set(2, "user", "bob");
        buffer.set(1, "user", "carol");
        assert_eq!(buffer.get(1, "user"), Some("carol"));
        assert_eq!(buffer.get(2, "user"), Some("bob"));
        assert_eq!(buffer.get(3, "user"), None);
        assert_eq!(buffer.fields(1).map(HashMap::len), Some(1));
    }

    #[test]
    fn test_clear_drops_every_form() {
        let mut buffer = FormFillBuffer::new();
        buffer.set(1, "a", "1");
        buffer.set(2, "b", "2");
        buffer.clear();
        assert!(buffer.is_empty());
    }
}

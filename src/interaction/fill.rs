use super::context::SessionContext;
use crate::error::{ReplayError, Result};
use crate::selectors::form::{find_field, find_form};
use crate::selectors::{Selector, Target};

/// Stage a field value for the next submission of its form. Performs no I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct FillStep {
    pub selector: Selector,
    pub value: String,
}

impl FillStep {
    pub async fn execute(&self, ctx: &mut SessionContext) -> Result<()> {
        let (Some(form_ref), Target::Field(field_ref)) = (&self.selector.form, &self.selector.target)
        else {
            return Err(ReplayError::selector(
                "fill needs a FORM[...]/INPUT[...] or TEXTAREA[...] selector",
            ));
        };

        let page = ctx.current_page()?;
        let form = find_form(&page.body, form_ref)?;
        let field = find_field(&form, field_ref)?;

        tracing::debug!("Form {} field '{}' <- '{}'", form.index, field.name, self.value);
        ctx.fill_buffer.set(form.index, field.name, self.value.clone());
        Ok(())
    }
}

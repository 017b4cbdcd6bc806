use std::sync::Arc;

use crate::host::{ConstraintViolation, FieldKind, FieldNode, FormNode};

use super::clean::generic_cleaner;
use super::controller::{FormController, FormError, FormResult, write_lock};

pub const DEFAULT_RULE_MESSAGE: &str = "This field is invalid.";

pub type CleanerFn = Arc<dyn Fn(&str) -> String + Send + Sync>;
pub type ValidatorFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct FieldRule {
    cleaner: Option<CleanerFn>,
    validator: Option<ValidatorFn>,
    message: String,
}

impl FieldRule {
    pub fn new() -> Self {
        Self {
            cleaner: None,
            validator: None,
            message: DEFAULT_RULE_MESSAGE.into(),
        }
    }

    pub fn cleaner(mut self, value: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.cleaner = Some(Arc::new(value));
        self
    }

    pub fn validator(mut self, value: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(value));
        self
    }

    pub fn message(mut self, value: impl Into<String>) -> Self {
        self.message = value.into();
        self
    }

    pub(super) fn cleaner_fn(&self) -> Option<&CleanerFn> {
        self.cleaner.as_ref()
    }

    pub(super) fn validator_fn(&self) -> Option<&ValidatorFn> {
        self.validator.as_ref()
    }

    pub(super) fn message_text(&self) -> &str {
        &self.message
    }
}

impl Default for FieldRule {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    pub fn add_rule(&self, name: impl Into<String>, rule: FieldRule) -> &Self {
        let name = name.into();
        let mut rules = match self.rules.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if rules.insert(name.clone(), rule).is_some() {
            log::debug!("rule for field '{name}' replaced");
        }
        self
    }

    pub fn input(&self, name: &str, value: impl Into<String>) -> FormResult<()> {
        {
            let mut form = write_lock(&self.form, "writing field value")?;
            let field = form
                .field_by_name_mut(name)
                .ok_or_else(|| FormError::FieldNotFound(name.to_string()))?;
            field.set_value(value);
        }
        if self.options.validate_on_input {
            let _ = self.validate_field(name, false)?;
        }
        Ok(())
    }

    pub fn blur(&self, name: &str) -> FormResult<()> {
        if self.options.validate_on_blur {
            let _ = self.validate_field(name, true)?;
        }
        Ok(())
    }

    pub fn validate_field(&self, name: &str, perform_clean: bool) -> FormResult<bool> {
        let rule = {
            let rules = match self.rules.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            rules.get(name).cloned()
        };
        let mut form = write_lock(&self.form, "validating field")?;
        validate_field_node(
            &mut form,
            name,
            rule.as_ref(),
            perform_clean,
            self.options.show_messages,
        )
        .ok_or_else(|| FormError::FieldNotFound(name.to_string()))
    }

    pub fn validate_form(&self) -> FormResult<bool> {
        let rules = {
            let rules = match self.rules.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            rules.clone()
        };
        let mut first_invalid = None;
        let all_valid = {
            let mut form = write_lock(&self.form, "validating form")?;
            let names = form.field_names();
            let mut all = true;
            // Every field is visited; an early failure must not hide
            // later fields' outcomes.
            for name in names {
                let valid = validate_field_node(
                    &mut form,
                    &name,
                    rules.get(&name),
                    true,
                    self.options.show_messages,
                )
                .unwrap_or(true);
                if !valid {
                    all = false;
                    if first_invalid.is_none() {
                        first_invalid = Some(name);
                    }
                }
            }
            all
        };
        write_lock(&self.state, "recording first invalid field")?.first_invalid = first_invalid;
        Ok(all_valid)
    }
}

fn validate_field_node(
    form: &mut FormNode,
    name: &str,
    rule: Option<&FieldRule>,
    perform_clean: bool,
    show_messages: bool,
) -> Option<bool> {
    let field_id = form.ensure_identity(name)?;
    let message = {
        let field = form.field_by_name_mut(name)?;
        if perform_clean {
            let cleaned = match rule.and_then(FieldRule::cleaner_fn) {
                Some(cleaner) => cleaner(field.current_value()),
                None => generic_cleaner(field.kind())(field.current_value()),
            };
            field.set_value(cleaned);
        }

        // Built-in constraints take precedence over the custom rule.
        let message = if let Some(violation) = field.violation() {
            Some(constraint_message(field, violation))
        } else {
            rule.and_then(|rule| match rule.validator_fn() {
                Some(validator) if !validator(field.current_value()) => {
                    Some(rule.message_text().to_string())
                }
                _ => None,
            })
        };
        field.set_invalid(message.is_some());
        message
    };

    let slot = form.slot_mut(&field_id)?;
    match &message {
        Some(text) if show_messages => slot.show(text.clone()),
        _ => slot.hide(),
    }
    Some(message.is_none())
}

fn constraint_message(field: &FieldNode, violation: ConstraintViolation) -> String {
    let constraints = field.constraints();
    match violation {
        ConstraintViolation::ValueMissing => "This field is required.".into(),
        ConstraintViolation::TypeMismatch => match field.kind() {
            FieldKind::Email => "Enter a valid email address.".into(),
            FieldKind::Url => "Enter a valid URL.".into(),
            _ => "Enter a valid value.".into(),
        },
        ConstraintViolation::TooShort => match constraints.min_length {
            Some(min) => format!("Use at least {min} characters."),
            None => "Enter a valid value.".into(),
        },
        ConstraintViolation::TooLong => match constraints.max_length {
            Some(max) => format!("Use no more than {max} characters."),
            None => "Enter a valid value.".into(),
        },
        ConstraintViolation::RangeUnderflow => match constraints.min {
            Some(min) => format!("Value must be at least {min}."),
            None => "Enter a valid value.".into(),
        },
        ConstraintViolation::RangeOverflow => match constraints.max {
            Some(max) => format!("Value must be at most {max}."),
            None => "Enter a valid value.".into(),
        },
        ConstraintViolation::PatternMismatch => "Match the requested format.".into(),
        ConstraintViolation::BadInput => "Enter a valid value.".into(),
    }
}

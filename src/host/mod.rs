use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, RwLock};

use regex::Regex;
use rust_decimal::Decimal;

use crate::feedback::FormNotice;
use crate::id::{error_slot_id, stable_field_id};

pub type FormHandle = Arc<RwLock<FormNode>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FieldKind {
    Email,
    Tel,
    Number,
    Url,
    Text,
    Textarea,
    Other,
}

impl FieldKind {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "tel" => Self::Tel,
            "number" => Self::Number,
            "url" => Self::Url,
            "text" => Self::Text,
            "textarea" => Self::Textarea,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConstraintViolation {
    ValueMissing,
    TypeMismatch,
    TooShort,
    TooLong,
    RangeUnderflow,
    RangeOverflow,
    PatternMismatch,
    BadInput,
}

#[derive(Clone, Debug, Default)]
pub struct FieldConstraints {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub pattern: Option<Regex>,
}

#[derive(Clone, Debug)]
pub struct FieldNode {
    name: String,
    id: Option<String>,
    kind: FieldKind,
    value: String,
    default_value: String,
    constraints: FieldConstraints,
    invalid: bool,
}

impl FieldNode {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            id: None,
            kind,
            value: String::new(),
            default_value: String::new(),
            constraints: FieldConstraints::default(),
            invalid: false,
        }
    }

    pub fn id(mut self, value: impl Into<String>) -> Self {
        self.id = Some(value.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.default_value = value.clone();
        self.value = value;
        self
    }

    pub fn required(mut self, value: bool) -> Self {
        self.constraints.required = value;
        self
    }

    pub fn min_length(mut self, value: usize) -> Self {
        self.constraints.min_length = Some(value);
        if let Some(max) = self.constraints.max_length
            && max < value
        {
            self.constraints.max_length = Some(value);
        }
        self
    }

    pub fn max_length(mut self, value: usize) -> Self {
        self.constraints.max_length = Some(value);
        if let Some(min) = self.constraints.min_length
            && min > value
        {
            self.constraints.min_length = Some(value);
        }
        self
    }

    pub fn min(mut self, value: Decimal) -> Self {
        self.constraints.min = Some(value);
        self
    }

    pub fn max(mut self, value: Decimal) -> Self {
        self.constraints.max = Some(value);
        self
    }

    pub fn pattern(mut self, value: Regex) -> Self {
        self.constraints.pattern = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn current_value(&self) -> &str {
        &self.value
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    pub fn constraints(&self) -> &FieldConstraints {
        &self.constraints
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn set_invalid(&mut self, value: bool) {
        self.invalid = value;
    }

    pub fn is_marked_invalid(&self) -> bool {
        self.invalid
    }

    pub(crate) fn assign_id(&mut self, value: String) {
        self.id = Some(value);
    }

    // Priority order: missing, type mismatch, too short, too long,
    // underflow, overflow, pattern mismatch, bad input.
    pub fn violation(&self) -> Option<ConstraintViolation> {
        let value = self.value.as_str();
        if value.is_empty() {
            return self
                .constraints
                .required
                .then_some(ConstraintViolation::ValueMissing);
        }

        let mut parsed = None;
        let mut bad_input = false;
        if self.kind == FieldKind::Number {
            match Decimal::from_str(value) {
                Ok(number) => parsed = Some(number),
                Err(_) => bad_input = true,
            }
        }

        if self.kind == FieldKind::Email && !is_email(value) {
            return Some(ConstraintViolation::TypeMismatch);
        }
        if self.kind == FieldKind::Url && !is_url(value) {
            return Some(ConstraintViolation::TypeMismatch);
        }

        let length = value.chars().count();
        if let Some(min) = self.constraints.min_length
            && length < min
        {
            return Some(ConstraintViolation::TooShort);
        }
        if let Some(max) = self.constraints.max_length
            && length > max
        {
            return Some(ConstraintViolation::TooLong);
        }

        if let Some(number) = parsed {
            if let Some(min) = self.constraints.min
                && number < min
            {
                return Some(ConstraintViolation::RangeUnderflow);
            }
            if let Some(max) = self.constraints.max
                && number > max
            {
                return Some(ConstraintViolation::RangeOverflow);
            }
        }

        if let Some(pattern) = &self.constraints.pattern
            && !pattern.is_match(value)
        {
            return Some(ConstraintViolation::PatternMismatch);
        }

        if bad_input {
            return Some(ConstraintViolation::BadInput);
        }
        None
    }
}

fn is_email(value: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let pattern = EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email pattern compiles")
    });
    pattern.is_match(value)
}

fn is_url(value: &str) -> bool {
    match value.split_once("://") {
        Some((scheme, rest)) => {
            !rest.is_empty()
                && !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorSlot {
    id: String,
    message: String,
    visible: bool,
}

impl ErrorSlot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: String::new(),
            visible: false,
        }
    }

    pub fn slot_id(&self) -> &str {
        &self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.message.clear();
        self.visible = false;
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmitControl {
    label: String,
    busy_label: String,
    disabled: bool,
    rest_label: Option<String>,
}

impl SubmitControl {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            busy_label: "Submitting...".into(),
            disabled: false,
            rest_label: None,
        }
    }

    pub fn busy_label(mut self, value: impl Into<String>) -> Self {
        self.busy_label = value.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_busy(&self) -> bool {
        self.rest_label.is_some()
    }

    pub fn begin_busy(&mut self) {
        if self.rest_label.is_none() {
            self.rest_label = Some(std::mem::replace(&mut self.label, self.busy_label.clone()));
        }
        self.disabled = true;
    }

    pub fn end_busy(&mut self) {
        if let Some(original) = self.rest_label.take() {
            self.label = original;
        }
        self.disabled = false;
    }
}

#[derive(Clone, Debug)]
pub struct FormNode {
    id: String,
    novalidate: bool,
    fields: Vec<FieldNode>,
    slots: BTreeMap<String, ErrorSlot>,
    submit: SubmitControl,
    notice: Option<FormNotice>,
    focused: Option<String>,
}

impl FormNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            novalidate: false,
            fields: Vec::new(),
            slots: BTreeMap::new(),
            submit: SubmitControl::new("Submit"),
            notice: None,
            focused: None,
        }
    }

    pub fn field(mut self, field: FieldNode) -> Self {
        self.fields.push(field);
        self
    }

    pub fn submit(mut self, control: SubmitControl) -> Self {
        self.submit = control;
        self
    }

    pub fn form_id(&self) -> &str {
        &self.id
    }

    pub fn novalidate(&self) -> bool {
        self.novalidate
    }

    pub fn set_novalidate(&mut self, value: bool) {
        self.novalidate = value;
    }

    pub fn fields(&self) -> &[FieldNode] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|field| field.name().to_string())
            .collect()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|field| field.name() == name)
    }

    pub fn field_by_name_mut(&mut self, name: &str) -> Option<&mut FieldNode> {
        self.fields.iter_mut().find(|field| field.name() == name)
    }

    pub fn push_field(&mut self, field: FieldNode) {
        self.fields.push(field);
    }

    // A field always resolves to exactly one slot; both the generated id
    // and the slot are created here, before first validation.
    pub fn ensure_identity(&mut self, name: &str) -> Option<String> {
        let form_id = self.id.clone();
        let field = self.field_by_name_mut(name)?;
        let field_id = match field.field_id() {
            Some(id) => id.to_string(),
            None => {
                let generated = stable_field_id(&form_id, name);
                field.assign_id(generated.clone());
                generated
            }
        };
        self.slots
            .entry(field_id.clone())
            .or_insert_with(|| ErrorSlot::new(error_slot_id(&field_id)));
        Some(field_id)
    }

    pub fn slot(&self, field_id: &str) -> Option<&ErrorSlot> {
        self.slots.get(field_id)
    }

    pub fn slot_mut(&mut self, field_id: &str) -> Option<&mut ErrorSlot> {
        self.slots.get_mut(field_id)
    }

    pub fn slot_for_field(&self, name: &str) -> Option<&ErrorSlot> {
        let field_id = self.field_by_name(name)?.field_id()?;
        self.slots.get(field_id)
    }

    pub fn submit_control(&self) -> &SubmitControl {
        &self.submit
    }

    pub fn submit_control_mut(&mut self) -> &mut SubmitControl {
        &mut self.submit
    }

    pub fn notice(&self) -> Option<&FormNotice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: FormNotice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn set_focus(&mut self, field_id: Option<String>) {
        self.focused = field_id;
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            let default = field.default_value().to_string();
            field.set_value(default);
            field.set_invalid(false);
        }
        for slot in self.slots.values_mut() {
            slot.hide();
        }
        self.focused = None;
    }
}

#[derive(Clone, Default)]
pub struct Document {
    forms: Arc<RwLock<BTreeMap<String, FormHandle>>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_form(&self, form: FormNode) -> FormHandle {
        let id = form.form_id().to_string();
        let handle = Arc::new(RwLock::new(form));
        let mut forms = match self.forms.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        forms.insert(id, handle.clone());
        handle
    }

    pub fn form(&self, id: &str) -> Option<FormHandle> {
        let forms = match self.forms.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        forms.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_field() -> FieldNode {
        FieldNode::new("price", FieldKind::Number)
            .min(Decimal::ZERO)
            .max(Decimal::from(100))
    }

    #[test]
    fn required_empty_value_is_missing_before_anything_else() {
        let field = FieldNode::new("email", FieldKind::Email)
            .required(true)
            .min_length(5);
        assert_eq!(field.violation(), Some(ConstraintViolation::ValueMissing));
    }

    #[test]
    fn optional_empty_value_is_valid() {
        let field = FieldNode::new("email", FieldKind::Email);
        assert_eq!(field.violation(), None);
    }

    #[test]
    fn type_mismatch_outranks_length_bounds() {
        let mut field = FieldNode::new("email", FieldKind::Email).min_length(50);
        field.set_value("not-an-email");
        assert_eq!(field.violation(), Some(ConstraintViolation::TypeMismatch));
    }

    #[test]
    fn length_bounds_report_short_and_long() {
        let mut field = FieldNode::new("title", FieldKind::Text)
            .min_length(3)
            .max_length(5);
        field.set_value("ab");
        assert_eq!(field.violation(), Some(ConstraintViolation::TooShort));
        field.set_value("abcdef");
        assert_eq!(field.violation(), Some(ConstraintViolation::TooLong));
        field.set_value("abcd");
        assert_eq!(field.violation(), None);
    }

    #[test]
    fn numeric_range_bounds_are_checked_as_decimals() {
        let mut field = number_field();
        field.set_value("-0.01");
        assert_eq!(field.violation(), Some(ConstraintViolation::RangeUnderflow));
        field.set_value("100.01");
        assert_eq!(field.violation(), Some(ConstraintViolation::RangeOverflow));
        field.set_value("19.99");
        assert_eq!(field.violation(), None);
    }

    #[test]
    fn unparseable_number_is_the_last_resort_category() {
        let mut field = number_field().max_length(3);
        field.set_value("abcd");
        assert_eq!(field.violation(), Some(ConstraintViolation::TooLong));
        field.set_value("abc");
        assert_eq!(field.violation(), Some(ConstraintViolation::BadInput));
    }

    #[test]
    fn pattern_mismatch_applies_after_bounds() {
        let mut field = FieldNode::new("code", FieldKind::Text)
            .pattern(Regex::new(r"^[A-Z]{2,4}-?\d+$").expect("pattern compiles"));
        field.set_value("abc123");
        assert_eq!(field.violation(), Some(ConstraintViolation::PatternMismatch));
        field.set_value("ABC-123");
        assert_eq!(field.violation(), None);
    }

    #[test]
    fn url_kind_accepts_scheme_prefixed_values() {
        let mut field = FieldNode::new("site", FieldKind::Url);
        field.set_value("https://example.com");
        assert_eq!(field.violation(), None);
        field.set_value("example.com");
        assert_eq!(field.violation(), Some(ConstraintViolation::TypeMismatch));
    }

    #[test]
    fn field_kind_parses_known_types_with_fallback() {
        assert_eq!(FieldKind::parse("EMAIL"), FieldKind::Email);
        assert_eq!(FieldKind::parse("textarea"), FieldKind::Textarea);
        assert_eq!(FieldKind::parse("checkbox"), FieldKind::Other);
    }

    #[test]
    fn submit_control_busy_swap_preserves_original_label() {
        let mut control = SubmitControl::new("Save product").busy_label("Saving...");
        control.begin_busy();
        control.begin_busy();
        assert!(control.is_disabled());
        assert_eq!(control.label(), "Saving...");
        control.end_busy();
        assert!(!control.is_disabled());
        assert_eq!(control.label(), "Save product");
    }

    #[test]
    fn ensure_identity_generates_id_and_slot_once() {
        let mut form = FormNode::new("product-form").field(FieldNode::new("price", FieldKind::Number));
        let first = form.ensure_identity("price").expect("field exists");
        let second = form.ensure_identity("price").expect("field exists");
        assert_eq!(first, second);
        let slot = form.slot(&first).expect("slot exists");
        assert_eq!(slot.slot_id(), format!("{first}-error"));
        assert!(!slot.is_visible());
    }

    #[test]
    fn reset_restores_defaults_and_hides_slots() {
        let mut form = FormNode::new("product-form")
            .field(FieldNode::new("price", FieldKind::Number).value("10"));
        let field_id = form.ensure_identity("price").expect("field exists");
        form.field_by_name_mut("price")
            .expect("field exists")
            .set_value("-5");
        form.field_by_name_mut("price")
            .expect("field exists")
            .set_invalid(true);
        form.slot_mut(&field_id)
            .expect("slot exists")
            .show("Value must be at least 0.");
        form.set_focus(Some(field_id.clone()));

        form.reset();

        let field = form.field_by_name("price").expect("field exists");
        assert_eq!(field.current_value(), "10");
        assert!(!field.is_marked_invalid());
        assert!(!form.slot(&field_id).expect("slot exists").is_visible());
        assert_eq!(form.focused(), None);
    }

    #[test]
    fn document_resolves_forms_by_identifier() {
        let document = Document::new();
        document.insert_form(FormNode::new("product-form"));
        assert!(document.form("product-form").is_some());
        assert!(document.form("missing-form").is_none());
    }
}

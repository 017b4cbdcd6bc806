use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures_timer::Delay;

use crate::feedback::FormNotice;
use crate::host::{Document, FormHandle};

use super::validation::FieldRule;

pub const SUBMIT_SUCCESS_MESSAGE: &str = "Submitted successfully.";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub validate_on_blur: bool,
    pub validate_on_input: bool,
    pub show_messages: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_blur: true,
            validate_on_input: true,
            show_messages: true,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    FormNotFound(String),
    MissingSubmitHandler,
    FieldNotFound(String),
    StatePoisoned(&'static str),
    InvalidStateTransition { from: SubmitState, to: SubmitState },
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::FormNotFound(form_id) => {
                write!(f, "form '{form_id}' was not found in the document")
            }
            FormError::MissingSubmitHandler => {
                f.write_str("a submit handler is required to bind a form")
            }
            FormError::FieldNotFound(name) => {
                write!(f, "field '{name}' was not found in the bound form")
            }
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::InvalidStateTransition { from, to } => {
                write!(f, "invalid submit state transition: {from:?} -> {to:?}")
            }
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub type FormData = BTreeMap<String, String>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmitError {
    message: String,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SubmitError {}

impl From<&str> for SubmitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for SubmitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

pub type BoxedSubmitFuture = Pin<Box<dyn Future<Output = Result<(), SubmitError>> + Send + 'static>>;

pub trait SubmitHandler: Send + Sync {
    fn submit(&self, data: FormData) -> BoxedSubmitFuture;
}

impl<F> SubmitHandler for F
where
    F: Fn(FormData) -> BoxedSubmitFuture + Send + Sync,
{
    fn submit(&self, data: FormData) -> BoxedSubmitFuture {
        (self)(data)
    }
}

pub(super) struct ControllerState {
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) first_invalid: Option<String>,
}

#[derive(Clone)]
pub struct FormController {
    pub(super) options: FormOptions,
    pub(super) form: FormHandle,
    pub(super) handler: Arc<dyn SubmitHandler>,
    pub(super) rules: Arc<RwLock<BTreeMap<String, FieldRule>>>,
    pub(super) state: Arc<RwLock<ControllerState>>,
}

impl std::fmt::Debug for FormController {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

pub struct FormControllerBuilder {
    form_id: String,
    options: FormOptions,
    handler: Option<Arc<dyn SubmitHandler>>,
}

impl FormControllerBuilder {
    pub fn options(mut self, value: FormOptions) -> Self {
        self.options = value;
        self
    }

    pub fn on_submit<H>(mut self, handler: H) -> Self
    where
        H: SubmitHandler + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn bind(self, document: &Document) -> FormResult<FormController> {
        let handler = self.handler.ok_or(FormError::MissingSubmitHandler)?;
        let form = document
            .form(&self.form_id)
            .ok_or_else(|| FormError::FormNotFound(self.form_id.clone()))?;
        {
            let mut node = write_lock(&form, "binding form")?;
            node.set_novalidate(true);
            let names = node.field_names();
            for name in &names {
                node.ensure_identity(name);
            }
            log::debug!("bound form '{}' with {} fields", node.form_id(), names.len());
        }
        Ok(FormController {
            options: self.options,
            form,
            handler,
            rules: Arc::new(RwLock::new(BTreeMap::new())),
            state: Arc::new(RwLock::new(ControllerState {
                submit_state: SubmitState::Idle,
                submit_count: 0,
                first_invalid: None,
            })),
        })
    }
}

impl FormController {
    pub fn builder(form_id: impl Into<String>) -> FormControllerBuilder {
        FormControllerBuilder {
            form_id: form_id.into(),
            options: FormOptions::default(),
            handler: None,
        }
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn form_handle(&self) -> FormHandle {
        self.form.clone()
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state)
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(self.submit_state()? == SubmitState::Submitting)
    }

    pub fn submit_count(&self) -> FormResult<u32> {
        Ok(read_lock(&self.state, "reading submit count")?.submit_count)
    }

    pub async fn submit(&self) -> FormResult<bool> {
        {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if state.submit_state == SubmitState::Submitting {
                log::debug!("submit skipped; a submission is already in flight");
                return Ok(false);
            }
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
        }

        if !self.validate_form()? {
            self.focus_first_invalid()?;
            let mut state = write_lock(&self.state, "handling submit validation failure")?;
            transition_submit_state(&mut state, SubmitState::Failed)?;
            return Ok(false);
        }

        let data = self.form_data()?;
        {
            let mut state = write_lock(&self.state, "moving submit state to submitting")?;
            transition_submit_state(&mut state, SubmitState::Submitting)?;
        }
        {
            let mut form = write_lock(&self.form, "marking submit control busy")?;
            form.submit_control_mut().begin_busy();
        }

        let cleanup = SubmitCleanup {
            form: self.form.clone(),
            state: self.state.clone(),
        };
        let result = self.handler.submit(data).await;

        let submitted = match result {
            Ok(()) => {
                {
                    let mut form = write_lock(&self.form, "applying submit success")?;
                    form.reset();
                    form.set_notice(FormNotice::success(SUBMIT_SUCCESS_MESSAGE));
                }
                let mut state = write_lock(&self.state, "completing submit")?;
                transition_submit_state(&mut state, SubmitState::Succeeded)?;
                true
            }
            Err(error) => {
                log::warn!("submit handler failed: {error}");
                {
                    let mut form = write_lock(&self.form, "applying submit failure")?;
                    form.set_notice(FormNotice::error(error.to_string()));
                }
                let mut state = write_lock(&self.state, "completing failed submit")?;
                transition_submit_state(&mut state, SubmitState::Failed)?;
                false
            }
        };
        drop(cleanup);
        Ok(submitted)
    }

    pub fn clear_form(&self) -> FormResult<()> {
        write_lock(&self.form, "clearing form")?.reset();
        Ok(())
    }

    pub fn reset(&self) -> FormResult<()> {
        let mut form = write_lock(&self.form, "resetting form")?;
        form.reset();
        form.clear_notice();
        Ok(())
    }

    pub fn form_data(&self) -> FormResult<FormData> {
        let form = read_lock(&self.form, "collecting form data")?;
        Ok(form
            .fields()
            .iter()
            .filter(|field| !field.name().is_empty())
            .map(|field| (field.name().to_string(), field.current_value().to_string()))
            .collect())
    }

    pub fn notice(&self) -> FormResult<Option<FormNotice>> {
        Ok(read_lock(&self.form, "reading form notice")?.notice().cloned())
    }

    pub fn dismiss_notice(&self) -> FormResult<()> {
        write_lock(&self.form, "dismissing form notice")?.clear_notice();
        Ok(())
    }

    pub async fn auto_dismiss_notice(&self) -> FormResult<bool> {
        let delay = read_lock(&self.form, "reading notice auto-close")?
            .notice()
            .and_then(FormNotice::auto_close_after);
        let Some(delay) = delay else {
            return Ok(false);
        };
        Delay::new(delay).await;
        // Not cancelled by a superseding notice; whatever is displayed
        // when the timer fires gets hidden.
        write_lock(&self.form, "auto-dismissing form notice")?.clear_notice();
        Ok(true)
    }

    pub(super) fn focus_first_invalid(&self) -> FormResult<bool> {
        let first = read_lock(&self.state, "reading first invalid field")?
            .first_invalid
            .clone();
        let Some(name) = first else {
            return Ok(false);
        };
        let mut form = write_lock(&self.form, "focusing first invalid field")?;
        let Some(field_id) = form.ensure_identity(&name) else {
            return Ok(false);
        };
        form.set_focus(Some(field_id));
        Ok(true)
    }
}

struct SubmitCleanup {
    form: FormHandle,
    state: Arc<RwLock<ControllerState>>,
}

impl Drop for SubmitCleanup {
    // Restoration must run on every exit path out of the in-flight
    // section, including unwinding.
    fn drop(&mut self) {
        if let Ok(mut form) = self.form.write() {
            form.submit_control_mut().end_busy();
        }
        if let Ok(mut state) = self.state.write()
            && state.submit_state == SubmitState::Submitting
        {
            state.submit_state = SubmitState::Failed;
        }
    }
}

pub(super) fn transition_submit_state(
    state: &mut ControllerState,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}

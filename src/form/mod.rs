mod clean;
mod controller;
mod validation;


pub use controller::{
    BoxedSubmitFuture, FormController, FormControllerBuilder, FormData, FormError, FormOptions,
    FormResult, SUBMIT_SUCCESS_MESSAGE, SubmitError, SubmitHandler, SubmitState,
};
pub use validation::{CleanerFn, DEFAULT_RULE_MESSAGE, FieldRule, ValidatorFn};

pub use crate::feedback::{FormNotice, NoticeKind, SUCCESS_AUTO_CLOSE};
pub use crate::form::{
    BoxedSubmitFuture, FieldRule, FormController, FormData, FormError, FormOptions, FormResult,
    SubmitError, SubmitHandler, SubmitState,
};
pub use crate::host::{
    ConstraintViolation, Document, ErrorSlot, FieldConstraints, FieldKind, FieldNode, FormNode,
    SubmitControl,
};

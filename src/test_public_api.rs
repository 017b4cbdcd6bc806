use rust_decimal::Decimal;

#[test]
fn prelude_builds_a_document_and_controller() {
    use crate::prelude::*;

    let document = Document::new();
    document.insert_form(
        FormNode::new("signup-form")
            .field(
                FieldNode::new("email", FieldKind::Email)
                    .required(true)
                    .max_length(120),
            )
            .field(FieldNode::new("amount", FieldKind::Number).min(Decimal::ZERO))
            .submit(SubmitControl::new("Sign up")),
    );

    let controller = FormController::builder("signup-form")
        .options(FormOptions::default())
        .on_submit(|_data: FormData| -> BoxedSubmitFuture { Box::pin(async { Ok(()) }) })
        .bind(&document)
        .expect("bind signup form");

    controller.add_rule(
        "email",
        FieldRule::new()
            .cleaner(|raw| raw.trim().to_ascii_lowercase())
            .validator(|value| value.ends_with(".com"))
            .message("Only .com addresses are accepted."),
    );

    assert_eq!(
        controller.submit_state().expect("submit state"),
        SubmitState::Idle
    );
    assert!(controller.options().validate_on_blur);
}

#[test]
fn prelude_exports_core_types() {
    let _ = crate::prelude::FormOptions::default();
    let _ = crate::prelude::NoticeKind::Success;
    let _ = crate::prelude::ConstraintViolation::ValueMissing;
    let _ = crate::prelude::FieldKind::parse("email");
    let _ = crate::prelude::SUCCESS_AUTO_CLOSE;
    let _ = crate::prelude::FormError::MissingSubmitHandler;
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! End-to-end tests for the [`Form`] public contract: registration lifecycle,
//! value/error stores, touched tracking, validation fan-out, and the two-phase
//! submit protocol, all driven through the public API with a scripted
//! [`MockRuleValidator`].

use std::{sync::{Arc,
                 Mutex,
                 atomic::{AtomicUsize, Ordering}},
          time::Duration};

use pretty_assertions::assert_eq;
use r3bl_form::{ErrorWrites, FieldDescriptor, FieldEntity, Form, FormCallbacks,
                MockOutcome, MockRuleValidator, NamePath, RuleSpec, SetValuesOptions,
                Stores};
use serde_json::json;
use tokio::time::sleep;

/// Enough time for every spawned fire-and-forget validation to settle.
const SETTLE: Duration = Duration::from_millis(50);

fn new_form() -> (Form, Arc<MockRuleValidator>) {
    let validator = Arc::new(MockRuleValidator::new());
    let form = Form::new(validator.clone(), || {});
    (form, validator)
}

fn values(pairs: &[(&str, serde_json::Value)]) -> Stores {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn test_read_after_write_observes_value_before_validation_settles() {
    let (form, validator) = new_form();
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("name")))
        .await;

    // The validation triggered by this write will take a while to settle.
    validator.script("name", MockOutcome::PassAfter(Duration::from_millis(100)));
    form.set_fields_value(values(&[("name", json!("tokio"))]), SetValuesOptions::default())
        .await;

    // Synchronous read-after-write, independent of the in-flight validation.
    assert_eq!(form.get_field_value("name").await, Some(json!("tokio")));
    assert_eq!(form.get_field_error("name").await, None);

    sleep(Duration::from_millis(150)).await;
    assert_eq!(form.get_field_error("name").await, None);
    assert_eq!(validator.calls_for("name"), 1);
}

#[tokio::test]
async fn test_duplicate_registration_first_wins() {
    let (form, validator) = new_form();

    let first = FieldEntity::silent(
        FieldDescriptor::named("email")
            .with_rules(vec![RuleSpec::required("Please enter the email")])
            .with_validate_first(true),
    );
    let second =
        FieldEntity::silent(FieldDescriptor::named("email").with_validate_first(false));

    form.sign_in_field(first).await;
    form.sign_in_field(second).await; // Silently dropped.

    assert_eq!(form.registered_names().await, vec!["email".to_string()]);

    // The surviving descriptor is the first one: its rules and validate_first flag
    // are what reach the validator.
    form.validate_field(&NamePath::from("email")).await.unwrap();
    let calls = validator.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].validate_first);
    assert_eq!(calls[0].rules.len(), 1);
}

#[tokio::test]
async fn test_is_field_touched_is_vacuously_true_for_empty_resolution() {
    let (form, _) = new_form();

    // Zero registered fields: AND over an empty set.
    assert!(form.is_field_touched(&NamePath::All).await);

    // A registered-but-untouched field flips the answer.
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("a")))
        .await;
    assert!(!form.is_field_touched(&NamePath::All).await);

    form.set_field_touched("a", true).await;
    assert!(form.is_field_touched(&NamePath::All).await);
}

#[tokio::test]
async fn test_initial_values_push_only_to_already_registered_fields() {
    let (form, validator) = new_form();
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("email")))
        .await;

    form.set_initial_values(
        values(&[("email", json!("a@b.c")), ("username", json!("alice"))]),
        false,
    )
    .await;

    // Pushed to the field registered before the call.
    assert_eq!(form.get_field_value("email").await, Some(json!("a@b.c")));

    // No retroactive push to a field that registers later.
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("username")))
        .await;
    assert_eq!(form.get_field_value("username").await, None);

    // Initial-value injection is excluded from touched, and triggers no validation.
    assert!(!form.is_field_touched(&NamePath::from("email")).await);
    sleep(SETTLE).await;
    assert!(validator.calls().is_empty());
}

#[tokio::test]
async fn test_initial_values_skipped_when_already_initialized() {
    let (form, _) = new_form();
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("email")))
        .await;

    form.set_initial_values(values(&[("email", json!("a@b.c"))]), true)
        .await;

    assert_eq!(form.get_field_value("email").await, None);
    assert!(form.get_initial_values().await.is_empty());
}

#[tokio::test]
async fn test_submit_with_failing_required_field_calls_on_finish_failed() {
    let validator = Arc::new(MockRuleValidator::new());
    let render_requests = Arc::new(AtomicUsize::new(0));
    let render_requests_clone = render_requests.clone();
    let form = Form::new(validator.clone(), move || {
        render_requests_clone.fetch_add(1, Ordering::SeqCst);
    });

    form.sign_in_field(FieldEntity::silent(
        FieldDescriptor::named("password")
            .with_rules(vec![RuleSpec::required("Please enter the password")]),
    ))
    .await;
    validator.script_failure("password", "Please enter the password");

    let finished = Arc::new(Mutex::new(Vec::<Stores>::new()));
    let failed = Arc::new(Mutex::new(Vec::<Vec<String>>::new()));
    let finished_clone = finished.clone();
    let failed_clone = failed.clone();
    form.set_callbacks(
        FormCallbacks::default()
            .with_on_finish(move |snapshot| {
                finished_clone.lock().unwrap().push(snapshot);
            })
            .with_on_finish_failed(move |errors| {
                failed_clone
                    .lock()
                    .unwrap()
                    .push(errors.keys().cloned().collect());
            }),
    )
    .await;

    form.submit(false).await.unwrap();

    assert!(finished.lock().unwrap().is_empty());
    assert_eq!(*failed.lock().unwrap(), vec![vec!["password".to_string()]]);
    assert_eq!(render_requests.load(Ordering::SeqCst), 1);

    // The failed pass also records the error in the store.
    assert!(form.get_field_error("password").await.is_some());
}

#[tokio::test]
async fn test_submit_skip_validate_always_calls_on_finish() {
    let (form, validator) = new_form();
    form.sign_in_field(FieldEntity::silent(
        FieldDescriptor::named("password")
            .with_rules(vec![RuleSpec::required("Please enter the password")]),
    ))
    .await;
    validator.script_failure("password", "Please enter the password");

    form.set_fields_value(
        values(&[("username", json!("alice"))]),
        SetValuesOptions {
            validate: false,
            notify: false,
        },
    )
    .await;

    let finished = Arc::new(Mutex::new(Vec::<Stores>::new()));
    let finished_clone = finished.clone();
    form.set_callbacks(FormCallbacks::default().with_on_finish(move |snapshot| {
        finished_clone.lock().unwrap().push(snapshot);
    }))
    .await;

    form.submit(true).await.unwrap();

    let finished = finished.lock().unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0], values(&[("username", json!("alice"))]));
    assert!(validator.calls().is_empty());
}

#[tokio::test]
async fn test_reset_field_clears_value_and_error_without_validating() {
    let (form, validator) = new_form();
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("code")))
        .await;

    form.set_fields_value(
        values(&[("code", json!("1234"))]),
        SetValuesOptions {
            validate: false,
            notify: true,
        },
    )
    .await;
    form.set_field_error(ErrorWrites::from([(
        "code".to_string(),
        Some(MockRuleValidator::failure("code", "Invalid code")),
    )]))
    .await;

    form.reset_field(&NamePath::from("code")).await;

    assert_eq!(form.get_field_value("code").await, None);
    assert_eq!(form.get_field_error("code").await, None);
    sleep(SETTLE).await;
    assert_eq!(validator.calls_for("code"), 0);
}

#[tokio::test]
async fn test_sign_in_sign_out_round_trip_restores_prior_state() {
    let (form, validator) = new_form();

    // Pre-existing state that must survive the round trip untouched.
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("other")))
        .await;
    form.set_fields_value(values(&[("other", json!(42))]), SetValuesOptions::default())
        .await;

    let handle = form
        .sign_in_field(FieldEntity::silent(FieldDescriptor::named("code")))
        .await;
    validator.script_failure("code", "Invalid code");
    form.set_fields_value(values(&[("code", json!("1234"))]), SetValuesOptions::default())
        .await;
    sleep(SETTLE).await;
    assert!(form.get_field_error("code").await.is_some());

    handle.sign_out().await;

    assert_eq!(form.registered_names().await, vec!["other".to_string()]);
    assert_eq!(form.get_field_value("code").await, None);
    assert_eq!(form.get_field_error("code").await, None);
    assert_eq!(form.get_field_value("other").await, Some(json!(42)));

    // Double-deregistration is a benign no-op.
    handle.sign_out().await;
    assert_eq!(form.registered_names().await, vec!["other".to_string()]);
}

#[tokio::test]
async fn test_stale_validation_result_overwrites_newer_value() {
    let (form, validator) = new_form();
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("pwd")))
        .await;

    // Slow verdict for the first value.
    validator.script(
        "pwd",
        MockOutcome::FailAfter(
            Duration::from_millis(100),
            MockRuleValidator::failure("pwd", "stale verdict"),
        ),
    );
    form.set_fields_value(values(&[("pwd", json!("v1"))]), SetValuesOptions::default())
        .await;
    sleep(Duration::from_millis(10)).await; // Let the slow validation launch.

    // The value changes while the prior validation is still in flight; the new
    // validation passes quickly and clears the slot.
    validator.script("pwd", MockOutcome::Pass);
    form.set_fields_value(values(&[("pwd", json!("v2"))]), SetValuesOptions::default())
        .await;
    sleep(Duration::from_millis(30)).await;
    assert_eq!(form.get_field_error("pwd").await, None);

    // No cancellation: the late result still lands, stamping a stale verdict over
    // the newer value.
    sleep(Duration::from_millis(120)).await;
    let recorded = form.get_field_error("pwd").await.unwrap();
    assert_eq!(recorded.errors[0].message, "stale verdict");
    assert_eq!(form.get_field_value("pwd").await, Some(json!("v2")));
}

#[tokio::test]
async fn test_on_values_change_fires_once_per_call() {
    let (form, _) = new_form();
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("a")))
        .await;
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("b")))
        .await;

    let observed = Arc::new(Mutex::new(Vec::<(usize, usize)>::new()));
    let observed_clone = observed.clone();
    form.set_callbacks(FormCallbacks::default().with_on_values_change(
        move |changed, all| {
            observed_clone.lock().unwrap().push((changed.len(), all.len()));
        },
    ))
    .await;

    // One call affecting two fields: exactly one callback invocation.
    form.set_fields_value(
        values(&[("a", json!(1)), ("b", json!(2))]),
        SetValuesOptions::default(),
    )
    .await;

    assert_eq!(*observed.lock().unwrap(), vec![(2, 2)]);
}

#[tokio::test]
async fn test_fatal_validator_failure_propagates_and_skips_callbacks() {
    let (form, validator) = new_form();
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("a")))
        .await;
    validator.script("a", MockOutcome::Fatal("rule engine broke".to_string()));

    let callback_count = Arc::new(AtomicUsize::new(0));
    let count_finish = callback_count.clone();
    let count_failed = callback_count.clone();
    form.set_callbacks(
        FormCallbacks::default()
            .with_on_finish(move |_| {
                count_finish.fetch_add(1, Ordering::SeqCst);
            })
            .with_on_finish_failed(move |_| {
                count_failed.fetch_add(1, Ordering::SeqCst);
            }),
    )
    .await;

    assert!(form.validate_field(&NamePath::All).await.is_err());
    assert!(form.submit(false).await.is_err());
    assert_eq!(callback_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_aggregation_keys_by_validator_reported_field_name() {
    let (form, validator) = new_form();
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("real")))
        .await;

    // A validator that breaks its echo-back contract misfiles the error under the
    // name it reports, not the name that was requested.
    validator.script(
        "real",
        MockOutcome::Fail(MockRuleValidator::failure("alias", "misreported")),
    );

    let errors = form.validate_field(&NamePath::All).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors.contains_key("alias"));
    assert!(!errors.contains_key("real"));
}

#[tokio::test]
async fn test_on_store_change_targets_affected_and_should_update_fields() {
    let (form, _) = new_form();
    let notified = Arc::new(Mutex::new(Vec::<String>::new()));

    let notified_a = notified.clone();
    form.sign_in_field(FieldEntity::new(FieldDescriptor::named("a"), move |name| {
        notified_a.lock().unwrap().push(format!("a saw {name}"));
    }))
    .await;

    let notified_b = notified.clone();
    form.sign_in_field(FieldEntity::new(FieldDescriptor::named("b"), move |name| {
        notified_b.lock().unwrap().push(format!("b saw {name}"));
    }))
    .await;

    let notified_w = notified.clone();
    form.sign_in_field(FieldEntity::new(
        FieldDescriptor::named("watcher").with_should_update(true),
        move |name| {
            notified_w.lock().unwrap().push(format!("watcher saw {name}"));
        },
    ))
    .await;

    form.set_fields_value(
        values(&[("a", json!(1))]),
        SetValuesOptions {
            validate: false,
            notify: true,
        },
    )
    .await;

    let notified = notified.lock().unwrap();
    assert!(notified.contains(&"a saw a".to_string()));
    assert!(notified.contains(&"watcher saw a".to_string()));
    assert!(!notified.iter().any(|entry| entry.starts_with("b saw")));
}

#[tokio::test]
async fn test_get_field_values_three_shapes() {
    let (form, _) = new_form();
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("a")))
        .await;
    form.sign_in_field(FieldEntity::silent(FieldDescriptor::named("b")))
        .await;
    form.set_fields_value(
        values(&[("a", json!(1)), ("b", json!(2)), ("ghost", json!(3))]),
        SetValuesOptions {
            validate: false,
            notify: false,
        },
    )
    .await;

    // Scalar: `None` for unknown keys, never an error.
    assert_eq!(form.get_field_value("a").await, Some(json!(1)));
    assert_eq!(form.get_field_value("missing").await, None);

    // Full snapshot includes keys merged for never-registered names.
    let all = form.get_field_values(&NamePath::All).await;
    assert_eq!(all.len(), 3);

    // List: restricted to names that resolve (registered), in input order.
    let sub = form
        .get_field_values(&NamePath::list(["b", "ghost", "a"]))
        .await;
    assert_eq!(sub, values(&[("b", json!(2)), ("a", json!(1))]));
}

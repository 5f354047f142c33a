mod common;

use std::{sync::Arc, time::Duration};

use common::{RecordingRecords, build_wizard, geography, init_tracing, labels};
use wizard_engine::{
    CloseReason, FieldOptions, FieldValue, FormState, ResolutionOutcome, Transition, ValidationReason, WizardError,
    WizardMode, WizardPhase, catalog,
};
use wizard_types::{FieldDescriptor, StepDefinition, WizardDefinition};

/// `departamento` on the first step, `municipio` on the second.
fn split_location_wizard() -> WizardDefinition {
    WizardDefinition::new("address")
        .with_step(
            StepDefinition::new("Departamento")
                .with_field(FieldDescriptor::select("departamento", "departamentos").label("Departamento").required()),
        )
        .with_step(
            StepDefinition::new("Municipio")
                .with_field(FieldDescriptor::dependent_select("municipio", "municipios", "departamento").required()),
        )
}

/// Three-level chain on a single step.
fn zone_wizard() -> WizardDefinition {
    WizardDefinition::new("zone").with_step(
        StepDefinition::new("Ubicación")
            .with_field(FieldDescriptor::select("departamento", "departamentos"))
            .with_field(FieldDescriptor::dependent_select("municipio", "municipios", "departamento"))
            .with_field(FieldDescriptor::dependent_select("zona", "zonas", "municipio")),
    )
}

#[tokio::test(start_paused = true)]
async fn rapid_parent_changes_apply_only_latest_options() {
    init_tracing();
    let options = Arc::new(geography().slow_for("LP", Duration::from_millis(200)));
    let records = Arc::new(RecordingRecords::new());
    let wizard = build_wizard(split_location_wizard(), &options, &records);
    wizard.start(WizardMode::Create, FormState::new()).await.expect("start");

    let (first, second) = tokio::join!(wizard.set_field_value("departamento", "LP"), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        wizard.set_field_value("departamento", "CO").await
    });
    first.expect("set LP");
    second.expect("set CO");

    assert_eq!(labels(&wizard, "municipio"), vec!["Sacaba", "Quillacollo"]);
    assert!(
        wizard
            .field_options("municipio")
            .is_some_and(|options| options.is_ready_for(Some("CO")))
    );

    let telemetry = wizard.telemetry();
    let outcomes: Vec<&ResolutionOutcome> = telemetry.resolutions_for("municipio").map(|event| &event.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            &ResolutionOutcome::Placeholder,
            &ResolutionOutcome::Applied {
                item_count: 2,
                retained_value: false
            },
            &ResolutionOutcome::Discarded,
        ]
    );
    let generations: Vec<Option<u64>> = telemetry.resolutions_for("municipio").map(|event| event.generation).collect();
    assert!(generations[2] < generations[1], "discarded load must be the older one");
}

#[tokio::test(start_paused = true)]
async fn edit_seed_value_missing_from_fetched_options_is_cleared() {
    init_tracing();
    let options = Arc::new(geography());
    let seed: FormState = [("departamento", "D1"), ("municipio", "M5"), ("calle", "Av. 6 de Agosto")]
        .into_iter()
        .collect();
    let records = Arc::new(RecordingRecords::new().with_seed("addr-7", seed));
    let wizard = build_wizard(catalog::address_wizard(), &options, &records);

    wizard.open_for_edit("addr-7").await.expect("open for edit");

    let form = wizard.form_state();
    assert_eq!(form.get("departamento").map(ToString::to_string).as_deref(), Some("D1"));
    assert_eq!(form.get("municipio"), None);
    assert_eq!(form.get("calle").map(ToString::to_string).as_deref(), Some("Av. 6 de Agosto"));
    assert_eq!(
        wizard.snapshot().mode,
        WizardMode::Edit {
            record_id: "addr-7".to_string()
        }
    );

    let telemetry = wizard.telemetry();
    let last = telemetry.resolutions_for("municipio").last().expect("municipio resolved");
    assert_eq!(
        last.outcome,
        ResolutionOutcome::Applied {
            item_count: 2,
            retained_value: false
        }
    );
}

#[tokio::test(start_paused = true)]
async fn edit_seed_value_present_in_fetched_options_is_kept() {
    let options = Arc::new(geography());
    let seed: FormState = [("departamento", "D1"), ("municipio", "M2")].into_iter().collect();
    let records = Arc::new(RecordingRecords::new().with_seed("addr-8", seed));
    let wizard = build_wizard(catalog::address_wizard(), &options, &records);

    wizard.open_for_edit("addr-8").await.expect("open for edit");

    assert_eq!(wizard.form_state().get("municipio").map(ToString::to_string).as_deref(), Some("M2"));
}

#[tokio::test(start_paused = true)]
async fn each_parent_change_reloads_each_dependent_once() {
    let options = Arc::new(geography());
    let records = Arc::new(RecordingRecords::new());
    let wizard = build_wizard(zone_wizard(), &options, &records);
    wizard.start(WizardMode::Create, FormState::new()).await.expect("start");
    assert_eq!(options.calls_for("municipios"), 0);
    assert_eq!(options.calls_for("zonas"), 0);

    wizard.set_field_value("departamento", "LP").await.expect("set departamento");
    assert_eq!(options.calls_for("municipios"), 1);
    assert_eq!(options.calls_for("zonas"), 0);
    assert_eq!(wizard.field_options("zona"), Some(FieldOptions::AwaitingParent));

    wizard.set_field_value("municipio", "M1").await.expect("set municipio");
    wizard.set_field_value("zona", "Z2").await.expect("set zona");
    assert_eq!(options.calls_for("municipios"), 1);
    assert_eq!(options.calls_for("zonas"), 1);

    wizard.set_field_value("departamento", "CO").await.expect("change departamento");
    assert_eq!(options.calls_for("municipios"), 2);
    let form = wizard.form_state();
    assert_eq!(form.get("municipio"), None, "M1 is not a Cochabamba municipio");
    assert_eq!(form.get("zona"), None, "zona follows its cleared parent");
    assert_eq!(wizard.field_options("zona"), Some(FieldOptions::AwaitingParent));
    assert_eq!(options.calls_for("zonas"), 1);
}

#[tokio::test(start_paused = true)]
async fn setting_the_same_value_does_not_reload() {
    let options = Arc::new(geography());
    let records = Arc::new(RecordingRecords::new());
    let wizard = build_wizard(zone_wizard(), &options, &records);
    wizard.start(WizardMode::Create, FormState::new()).await.expect("start");

    wizard.set_field_value("departamento", "LP").await.expect("set departamento");
    wizard.set_field_value("departamento", "LP").await.expect("set departamento again");

    assert_eq!(options.calls_for("municipios"), 1);
}

#[tokio::test(start_paused = true)]
async fn options_failure_clears_value_and_renders_error_entry() {
    init_tracing();
    let options = Arc::new(geography().fail_for("ERR"));
    let records = Arc::new(RecordingRecords::new());
    let wizard = build_wizard(zone_wizard(), &options, &records);
    wizard.start(WizardMode::Create, FormState::new()).await.expect("start");
    wizard.set_field_value("departamento", "LP").await.expect("set departamento");
    wizard.set_field_value("municipio", "M1").await.expect("set municipio");

    wizard.set_field_value("departamento", "ERR").await.expect("failure is recovered locally");

    assert_eq!(wizard.form_state().get("municipio"), None);
    assert_eq!(
        wizard.field_options("municipio"),
        Some(FieldOptions::Failed {
            message: "options backend unavailable".to_string()
        })
    );
    let rendered = wizard.select_options("municipio").expect("municipio options");
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].disabled);
    assert_eq!(rendered[0].label, "Could not load options");
    assert_eq!(wizard.field_options("zona"), Some(FieldOptions::AwaitingParent));
    assert_eq!(wizard.form_state().get("departamento").map(ToString::to_string).as_deref(), Some("ERR"));
}

#[tokio::test(start_paused = true)]
async fn loading_state_renders_disabled_entry_and_keeps_value() {
    let options = Arc::new(geography().slow_for("CO", Duration::from_millis(300)));
    let records = Arc::new(RecordingRecords::new());
    let wizard = build_wizard(zone_wizard(), &options, &records);
    wizard.start(WizardMode::Create, FormState::new()).await.expect("start");
    wizard.set_field_value("departamento", "LP").await.expect("set departamento");
    wizard.set_field_value("municipio", "M1").await.expect("set municipio");

    let (result, ()) = tokio::join!(wizard.set_field_value("departamento", "CO"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(labels(&wizard, "municipio"), vec!["Loading…"]);
        assert_eq!(
            wizard.form_state().get("municipio").map(ToString::to_string).as_deref(),
            Some("M1"),
            "value is kept until the new options arrive"
        );
    });
    result.expect("set departamento");

    assert_eq!(wizard.form_state().get("municipio"), None);
}

#[tokio::test(start_paused = true)]
async fn cancel_drops_late_option_responses() {
    let options = Arc::new(geography().slow_for("LP", Duration::from_millis(200)));
    let records = Arc::new(RecordingRecords::new());
    let wizard = build_wizard(split_location_wizard(), &options, &records);
    wizard.start(WizardMode::Create, FormState::new()).await.expect("start");

    let (result, ()) = tokio::join!(wizard.set_field_value("departamento", "LP"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        wizard.cancel().expect("cancel");
    });
    result.expect("set departamento");

    assert_eq!(wizard.phase(), WizardPhase::Closed(CloseReason::Cancelled));
    assert_eq!(wizard.field_options("municipio"), Some(FieldOptions::Loading));
    let last = wizard.telemetry().resolutions_for("municipio").last().cloned().expect("municipio event");
    assert_eq!(last.outcome, ResolutionOutcome::Discarded);
    assert!(matches!(wizard.go_next().await, Err(WizardError::Closed)));
}

#[tokio::test(start_paused = true)]
async fn back_then_forward_leaves_state_unchanged() {
    let options = Arc::new(geography());
    let records = Arc::new(RecordingRecords::new());
    let wizard = build_wizard(split_location_wizard(), &options, &records);
    wizard.start(WizardMode::Create, FormState::new()).await.expect("start");
    wizard.set_field_value("departamento", "LP").await.expect("set departamento");

    let advanced = wizard.go_next().await.expect("advance");
    assert_eq!(advanced, Transition::Advanced { step_index: 1 });
    wizard.set_field_value("municipio", "M2").await.expect("set municipio");
    let before = wizard.snapshot();

    assert_eq!(wizard.go_prev().expect("back"), 0);
    assert_eq!(wizard.go_next().await.expect("forward"), Transition::Advanced { step_index: 1 });

    assert_eq!(wizard.snapshot(), before);
    assert_eq!(options.calls_for("municipios"), 1);
    assert_eq!(options.calls_for("departamentos"), 1);
}

fn seeded_address() -> FormState {
    [("departamento", "LP"), ("municipio", "M1"), ("calle", "Av. Arce")]
        .into_iter()
        .collect()
}

#[tokio::test(start_paused = true)]
async fn submit_is_refused_while_dependent_options_revalidate() {
    init_tracing();
    let options = Arc::new(geography().slow_for("CO", Duration::from_millis(50)));
    let records = Arc::new(RecordingRecords::new());
    let wizard = build_wizard(catalog::address_wizard(), &options, &records);
    wizard.start(WizardMode::Create, seeded_address()).await.expect("start");
    assert_eq!(wizard.form_state().get("municipio"), Some(&FieldValue::from("M1")));

    let (changed, submitted) = tokio::join!(wizard.set_field_value("departamento", "CO"), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        wizard.submit().await
    });
    changed.expect("set departamento");

    let error = submitted.expect_err("municipio is still loading");
    assert!(matches!(
        error,
        WizardError::Validation(ref validation)
            if validation.field == "municipio" && validation.reason == ValidationReason::Resolving
    ));
    assert_eq!(error.to_string(), "Municipio is still loading");
    assert_eq!(records.attempts(), 0);
    assert_eq!(wizard.phase(), WizardPhase::Editing);

    assert_eq!(wizard.form_state().get("municipio"), None, "M1 is not a Cochabamba municipio");
    let error = wizard.submit().await.expect_err("municipio was cleared");
    assert!(matches!(error, WizardError::Validation(ref validation) if validation.reason == ValidationReason::Missing));

    wizard.set_field_value("municipio", "M3").await.expect("set municipio");
    let submitted = wizard.submit().await.expect("submit");
    assert!(matches!(submitted, Transition::Submitted(_)));
    let created = records.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].get("departamento"), Some(&FieldValue::from("CO")));
    assert_eq!(created[0].get("municipio"), Some(&FieldValue::from("M3")));
}

#[tokio::test(start_paused = true)]
async fn failed_submission_leaves_no_field_loading() {
    let options = Arc::new(geography().slow_for("CO", Duration::from_millis(50)));
    let records = Arc::new(RecordingRecords::new().with_latency(Duration::from_millis(100)).failing_times(1));
    let wizard = build_wizard(catalog::address_wizard(), &options, &records);
    wizard.start(WizardMode::Create, seeded_address()).await.expect("start");

    let (changed, submitted) = tokio::join!(wizard.set_field_value("departamento", "CO"), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        wizard.submit().await
    });
    changed.expect("set departamento");
    assert!(submitted.is_err());
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(
        wizard
            .field_options("municipio")
            .is_some_and(|options| options.is_ready_for(Some("CO")))
    );
    wizard.set_field_value("municipio", "M4").await.expect("set municipio");

    let error = wizard.submit().await.expect_err("record service fails once");
    assert!(matches!(error, WizardError::Submission(_)));
    assert_eq!(wizard.phase(), WizardPhase::Editing);
    assert!(
        wizard
            .snapshot()
            .field_options
            .values()
            .all(|options| !options.is_loading())
    );
    assert_eq!(wizard.form_state().get("municipio"), Some(&FieldValue::from("M4")));

    wizard.submit().await.expect("retry succeeds");
    assert_eq!(records.attempts(), 2);
    assert_eq!(records.created()[0].get("municipio"), Some(&FieldValue::from("M4")));
}

mod common;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::json;

use common::{FakePetStore, Faults};
use petcheck_core::factory::{PetOverrides, generate_with};
use petcheck_core::{FindingKind, Pet, PetStatus, RunReport, Severity, Stage, VerdictPolicy, VerdictStatus};
use petcheck_runner::{CleanupOutcome, Dispatcher, Scenario, ScenarioOptions};

fn rex() -> Pet {
    let overrides = PetOverrides::default()
        .with_id(12345)
        .with_name("Rex")
        .with_status(PetStatus::Available);
    generate_with(overrides, 1_700_000_000_000, &mut SmallRng::seed_from_u64(1))
}

fn run(store: &FakePetStore, options: ScenarioOptions) -> RunReport {
    let dispatcher = Dispatcher::new(store);
    Scenario::new(&dispatcher, options).run(rex())
}

fn kinds(report: &RunReport) -> Vec<FindingKind> {
    report.findings.iter().map(|f| f.kind).collect()
}

fn exit_code(report: &RunReport) -> i32 {
    report.verdict(&VerdictPolicy::default()).exit_code
}

#[test]
fn rex_end_to_end() {
    let store = FakePetStore::new();
    let report = run(&store, ScenarioOptions::default());

    assert!(report.findings.is_empty(), "{:?}", report.findings);
    assert_eq!(report.stage_reached, Stage::CleanedUp);
    assert_eq!(report.pet_id, 12345);

    let verdict = report.verdict(&VerdictPolicy::default());
    assert_eq!(verdict.status, VerdictStatus::Pass);
    assert_eq!(verdict.exit_code, 0);

    assert_eq!(
        store.calls(),
        vec![
            "POST /pet",
            "GET /pet/12345",
            "PUT /pet",
            "GET /pet/12345",
            "GET /pet/findByStatus?status=available",
            "GET /pet/findByStatus?status=pending",
            "GET /pet/findByStatus?status=sold",
            "DELETE /pet/12345",
        ]
    );
    assert!(store.is_empty());

    let update = report
        .steps
        .iter()
        .find(|s| s.title == "Update pet")
        .unwrap();
    assert_eq!(update.status, 200);
    assert!(update.body_excerpt.contains("Rex_Updated"));
    assert!(update.body_excerpt.contains("\"sold\""));
}

#[test]
fn every_step_is_logged() {
    let store = FakePetStore::new();
    let report = run(&store, ScenarioOptions::default());
    let titles: Vec<&str> = report.steps.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Create pet",
            "Get pet by id",
            "Update pet",
            "Verify update persisted",
            "Find pets by status available",
            "Find pets by status pending",
            "Find pets by status sold",
            "Delete pet (cleanup)",
        ]
    );
}

#[test]
fn fetched_pet_round_trips() {
    let store = FakePetStore::new();
    let report = run(&store, ScenarioOptions::default());
    let created = &report.steps[0].body_excerpt;
    let fetched = &report.steps[1].body_excerpt;
    let created: serde_json::Value = serde_json::from_str(created).unwrap();
    let fetched: serde_json::Value = serde_json::from_str(fetched).unwrap();
    assert_eq!(created, fetched);
    assert_eq!(fetched, rex().to_json());
}

#[test]
fn cleanup_is_idempotent() {
    let store = FakePetStore::new();
    let dispatcher = Dispatcher::new(&store);
    dispatcher.create(&rex()).unwrap();
    assert_eq!(dispatcher.cleanup(12345).0, CleanupOutcome::Deleted);
    assert_eq!(dispatcher.cleanup(12345).0, CleanupOutcome::AlreadyGone);
}

#[test]
fn lost_update_is_tolerated_by_default() {
    let store = FakePetStore::with_faults(Faults {
        lose_updates: true,
        ..Faults::default()
    });
    let report = run(&store, ScenarioOptions::default());

    assert_eq!(
        kinds(&report),
        vec![FindingKind::KnownAnomaly, FindingKind::Observation]
    );
    assert_eq!(report.findings[0].step, "Verify update persisted");
    assert_eq!(report.findings[1].step, "Find pets by status sold");
    assert_eq!(report.stage_reached, Stage::CleanedUp);
    assert_eq!(exit_code(&report), 0);
}

#[test]
fn lost_update_fails_when_not_tolerated() {
    let store = FakePetStore::with_faults(Faults {
        lose_updates: true,
        ..Faults::default()
    });
    let options = ScenarioOptions {
        tolerate_known_anomalies: false,
        ..ScenarioOptions::default()
    };
    let report = run(&store, options);

    assert_eq!(kinds(&report), vec![FindingKind::ContentMismatch]);
    assert_eq!(report.findings[0].severity, Severity::Error);
    assert_eq!(report.stage_reached, Stage::Updated);
    assert_eq!(exit_code(&report), 1);
    // no filter queries after the abort, but cleanup still ran
    let calls = store.calls();
    assert!(!calls.iter().any(|c| c.contains("findByStatus")));
    assert_eq!(calls.last().map(String::as_str), Some("DELETE /pet/12345"));
}

#[test]
fn missing_after_create_is_tolerated() {
    let store = FakePetStore::with_faults(Faults {
        missing_after_create: true,
        ..Faults::default()
    });
    let report = run(&store, ScenarioOptions::default());

    // the update upserts the pet, so the rest of the lifecycle holds
    assert_eq!(kinds(&report), vec![FindingKind::KnownAnomaly]);
    assert_eq!(report.findings[0].step, "Get pet by id");
    assert_eq!(report.stage_reached, Stage::CleanedUp);
    assert_eq!(exit_code(&report), 0);
}

#[test]
fn create_failure_aborts_but_cleans_up_generated_id() {
    let store = FakePetStore::with_faults(Faults {
        create_status: Some(500),
        ..Faults::default()
    });
    let report = run(&store, ScenarioOptions::default());

    assert_eq!(kinds(&report), vec![FindingKind::StatusMismatch]);
    assert_eq!(
        report.findings[0].message,
        "Create pet: status code should be 200, got 500"
    );
    assert_eq!(report.stage_reached, Stage::Init);
    assert_eq!(store.calls(), vec!["POST /pet", "DELETE /pet/12345"]);
    assert_eq!(exit_code(&report), 1);
}

#[test]
fn foreign_malformed_entries_are_only_observed() {
    let store = FakePetStore::with_faults(Faults {
        foreign: vec![
            json!({"id": 7, "name": 42, "status": "sold"}),
            json!({"id": 8, "name": "Doggie", "photoUrls": [], "status": "sold"}),
        ],
        ..Faults::default()
    });
    let report = run(&store, ScenarioOptions::default());

    assert_eq!(kinds(&report), vec![FindingKind::Observation]);
    assert!(report.findings[0].message.starts_with("1 of 3 returned entries"));
    assert_eq!(report.stage_reached, Stage::CleanedUp);
    assert_eq!(exit_code(&report), 0);
}

#[test]
fn filter_contamination_fails_the_run() {
    let store = FakePetStore::with_faults(Faults {
        wrong_filter_status: true,
        ..Faults::default()
    });
    let report = run(&store, ScenarioOptions::default());

    assert_eq!(kinds(&report), vec![FindingKind::ContentMismatch]);
    assert_eq!(report.findings[0].step, "Find pets by status available");
    assert!(report.findings[0].message.contains("has status \"sold\""));
    assert_eq!(report.stage_reached, Stage::PersistenceChecked);
    assert!(store.is_empty());
}

#[test]
fn unreachable_service_is_critical() {
    let store = FakePetStore::with_faults(Faults {
        unreachable: true,
        ..Faults::default()
    });
    let report = run(&store, ScenarioOptions::default());

    assert_eq!(
        kinds(&report),
        vec![FindingKind::Transport, FindingKind::CleanupFailure]
    );
    assert_eq!(report.findings[0].severity, Severity::Critical);
    assert!(report.steps.is_empty());
    assert_eq!(exit_code(&report), 2);
}

#[test]
fn latency_budget_is_enforced() {
    let store = FakePetStore::new();
    let options = ScenarioOptions {
        latency_budget_ms: 0.0,
        ..ScenarioOptions::default()
    };
    let report = run(&store, options);

    assert_eq!(kinds(&report), vec![FindingKind::LatencyExceeded]);
    assert_eq!(report.findings[0].step, "Create pet");
    assert_eq!(report.stage_reached, Stage::Init);
}

#[test]
fn non_conforming_echo_is_a_schema_violation() {
    let store = FakePetStore::with_faults(Faults {
        corrupt_echo: true,
        ..Faults::default()
    });
    let report = run(&store, ScenarioOptions::default());

    assert_eq!(kinds(&report), vec![FindingKind::SchemaViolation]);
    let finding = &report.findings[0];
    assert_eq!(finding.step, "Create pet");
    assert!(finding.message.contains("\"internalNote\" is not allowed"));
    assert!(finding.message.contains("\"status\" must be one of"));
    assert!(finding.message.contains("\"discontinued\""));
    assert_eq!(report.stage_reached, Stage::Init);
    assert_eq!(exit_code(&report), 1);

    assert_eq!(store.calls(), vec!["POST /pet", "DELETE /pet/12345"]);
    assert!(store.is_empty());
}

#[test]
fn stale_update_echo_is_a_content_mismatch() {
    let store = FakePetStore::with_faults(Faults {
        stale_update_echo: true,
        ..Faults::default()
    });
    let report = run(&store, ScenarioOptions::default());

    assert_eq!(kinds(&report), vec![FindingKind::ContentMismatch]);
    assert_eq!(report.findings[0].step, "Update pet");
    assert_eq!(
        report.findings[0].message,
        "name should match: expected \"Rex_Updated\", got \"Rex\""
    );
    assert_eq!(report.stage_reached, Stage::Fetched);

    let calls = store.calls();
    assert!(!calls.iter().any(|c| c.contains("findByStatus")));
    assert_eq!(calls.last().map(String::as_str), Some("DELETE /pet/12345"));
    assert!(store.is_empty());
}

//! Robustness checks outside the main lifecycle
//!
//! Each check is independent: a failure is recorded and the next check still
//! runs. Checks that create a pet always delete it again.

use serde_json::json;

use petcheck_core::assertion::{assert_matches, assert_status};
use petcheck_core::contract::api_response_contract;
use petcheck_core::factory::{self, PetOverrides};
use petcheck_core::{AssertionError, FindingKind, Pet, PetStatus, RunReport, validate};

use crate::dispatch::Dispatcher;
use crate::scenario::{Aborted, Recorder};
use crate::transport::Transport;

/// Id the service is not expected to know.
pub const UNKNOWN_PET_ID: i64 = 99_999_999_999;

/// Name length used by the field-limit check.
pub const LONG_NAME_LEN: usize = 500;

/// Name/status sequence applied by the consecutive-update check.
pub const UPDATE_SEQUENCE: [(&str, PetStatus); 3] = [
    ("Update1", PetStatus::Available),
    ("Update2", PetStatus::Pending),
    ("FinalName", PetStatus::Sold),
];

const UNKNOWN_ID: &str = "Get unknown pet id";
const INVALID_PAYLOAD: &str = "Create pet with invalid payload";
const CONSECUTIVE: &str = "Consecutive updates";
const FIELD_LIMITS: &str = "Update with long name";

pub struct Robustness<'a, T> {
    dispatcher: &'a Dispatcher<T>,
}

impl<'a, T: Transport> Robustness<'a, T> {
    #[must_use]
    pub fn new(dispatcher: &'a Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    /// Run every check with pets generated from `overrides`.
    #[must_use]
    pub fn run(&self, overrides: &PetOverrides) -> RunReport {
        self.run_with(|| factory::generate(overrides.clone()))
    }

    /// Run every check, drawing a fresh pet from `next_pet` for each check
    /// that needs one.
    pub fn run_with(&self, mut next_pet: impl FnMut() -> Pet) -> RunReport {
        let first = next_pet();
        let mut rec = Recorder::new("robustness", first.id);

        // Findings are already on the recorder; the outcomes only end a check early.
        let _ = self.unknown_id(&mut rec);
        let _ = self.invalid_payload(&mut rec);
        let _ = self.with_pet(&mut rec, first, CONSECUTIVE, Self::consecutive_updates);
        let _ = self.with_pet(&mut rec, next_pet(), FIELD_LIMITS, Self::field_limits);

        rec.report
    }

    fn unknown_id(&self, rec: &mut Recorder) -> Result<(), Aborted> {
        let env = rec.check(UNKNOWN_ID, self.dispatcher.get_by_id(UNKNOWN_PET_ID))?;
        rec.record(&env, UNKNOWN_ID);
        rec.check(UNKNOWN_ID, assert_status(UNKNOWN_ID, &env, 404))?;
        rec.check(
            UNKNOWN_ID,
            validate(&env.body, api_response_contract()).into_result(api_response_contract()),
        )?;
        let message = env.body.get("message").and_then(serde_json::Value::as_str);
        let message = rec.check(
            UNKNOWN_ID,
            message.ok_or_else(|| AssertionError::MissingField {
                field: "message".to_string(),
            }),
        )?;
        tracing::info!(step = UNKNOWN_ID, message, "unknown id rejected");
        Ok(())
    }

    fn invalid_payload(&self, rec: &mut Recorder) -> Result<(), Aborted> {
        let payload = json!({
            "id": "not_a_number",
            "name": 123,
            "status": "invalid_status",
        });
        let env = rec.check(INVALID_PAYLOAD, self.dispatcher.create_raw(&payload))?;
        rec.record(&env, INVALID_PAYLOAD);

        let message = match env.status {
            400 | 422 => {
                tracing::info!(status = env.status, "invalid payload rejected");
                None
            }
            status @ 200..=299 => Some(format!("service accepted invalid data ({status})")),
            status @ 500.. => Some(format!("service errored on invalid data ({status})")),
            status => Some(format!("service answered invalid data with {status}")),
        };
        if let Some(message) = message {
            rec.note(INVALID_PAYLOAD, FindingKind::LaxValidation, message);
        }

        // An accepted payload may have been stored under a service-assigned id.
        let assigned = env.body.get("id").and_then(serde_json::Value::as_i64);
        if let (true, Some(id)) = (env.is_success(), assigned) {
            rec.cleanup(self.dispatcher, id, &format!("{INVALID_PAYLOAD}: cleanup"));
        }
        Ok(())
    }

    /// Create `pet`, run `check` on it, then delete it whatever happened.
    fn with_pet(
        &self,
        rec: &mut Recorder,
        pet: Pet,
        step: &str,
        check: fn(&Self, &mut Recorder, Pet) -> Result<(), Aborted>,
    ) -> Result<(), Aborted> {
        let id = pet.id;
        let outcome = self.create(rec, &pet, step).and_then(|()| check(self, rec, pet));
        rec.cleanup(self.dispatcher, id, &format!("{step}: cleanup"));
        outcome
    }

    fn create(&self, rec: &mut Recorder, pet: &Pet, step: &str) -> Result<(), Aborted> {
        let title = format!("{step}: create");
        let env = rec.check(&title, self.dispatcher.create(pet))?;
        rec.record(&env, &title);
        rec.check(&title, assert_status(&title, &env, 200))
    }

    fn consecutive_updates(&self, rec: &mut Recorder, mut pet: Pet) -> Result<(), Aborted> {
        for (index, (name, status)) in UPDATE_SEQUENCE.into_iter().enumerate() {
            let title = format!("{CONSECUTIVE}: update {}", index + 1);
            pet.name = name.to_string();
            pet.status = status;

            let env = rec.check(&title, self.dispatcher.update(&pet))?;
            rec.record(&env, &title);
            rec.check(&title, assert_status(&title, &env, 200))?;
            rec.check(&title, assert_matches(&env.body, &pet))?;
        }
        Ok(())
    }

    fn field_limits(&self, rec: &mut Recorder, mut pet: Pet) -> Result<(), Aborted> {
        pet.name = "A".repeat(LONG_NAME_LEN);
        let env = rec.check(FIELD_LIMITS, self.dispatcher.update(&pet))?;
        rec.record(&env, FIELD_LIMITS);

        let message = if env.is_success() {
            format!("service accepted a {LONG_NAME_LEN}-character name")
        } else {
            format!(
                "service rejected a {LONG_NAME_LEN}-character name ({})",
                env.status
            )
        };
        rec.note(FIELD_LIMITS, FindingKind::Observation, message);
        Ok(())
    }
}

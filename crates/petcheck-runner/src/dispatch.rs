//! Request dispatch for the `/pet` endpoints
//!
//! Every call yields an [`Envelope`] whatever the status code. Deciding
//! whether a 404 or a 500 is acceptable is left to the caller.

use std::collections::HashMap;
use std::time::Instant;

use reqwest::Method;

use petcheck_core::{Envelope, Pet, PetStatus, StepRecord};

use crate::transport::{HttpRequest, Transport, TransportError};

const JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation}: {source}")]
pub struct DispatchError {
    pub operation: String,
    #[source]
    pub source: TransportError,
}

/// Result of a best-effort delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted,
    /// 404: nothing left to delete
    AlreadyGone,
    /// Any other status, or `None` when no response arrived
    Failed(Option<u16>),
}

pub struct Dispatcher<T> {
    transport: T,
    headers: Vec<(String, String)>,
}

impl<T: Transport> Dispatcher<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            headers: Vec::new(),
        }
    }

    /// Extra headers added to every request.
    #[must_use]
    pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Self {
        let mut sorted: Vec<_> = headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        sorted.sort();
        self.headers = sorted;
        self
    }

    /// `POST /pet`
    ///
    /// # Errors
    ///
    /// Only when no response was received.
    pub fn create(&self, pet: &Pet) -> Result<Envelope, DispatchError> {
        self.create_raw(&pet.to_json())
    }

    /// `POST /pet` with an arbitrary body, for malformed-payload checks.
    ///
    /// # Errors
    ///
    /// Only when no response was received.
    pub fn create_raw(&self, body: &serde_json::Value) -> Result<Envelope, DispatchError> {
        self.execute(Method::POST, "/pet".to_string(), Vec::new(), Some(body))
    }

    /// `GET /pet/{id}`
    ///
    /// # Errors
    ///
    /// Only when no response was received.
    pub fn get_by_id(&self, id: i64) -> Result<Envelope, DispatchError> {
        self.execute(Method::GET, format!("/pet/{id}"), Vec::new(), None)
    }

    /// `GET /pet/findByStatus?status=..`
    ///
    /// # Errors
    ///
    /// Only when no response was received.
    pub fn find_by_status(&self, status: PetStatus) -> Result<Envelope, DispatchError> {
        self.execute(
            Method::GET,
            "/pet/findByStatus".to_string(),
            vec![("status".to_string(), status.as_str().to_string())],
            None,
        )
    }

    /// `PUT /pet`
    ///
    /// # Errors
    ///
    /// Only when no response was received.
    pub fn update(&self, pet: &Pet) -> Result<Envelope, DispatchError> {
        self.execute(Method::PUT, "/pet".to_string(), Vec::new(), Some(&pet.to_json()))
    }

    /// `DELETE /pet/{id}`
    ///
    /// # Errors
    ///
    /// Only when no response was received.
    pub fn delete(&self, id: i64) -> Result<Envelope, DispatchError> {
        self.execute(Method::DELETE, format!("/pet/{id}"), Vec::new(), None)
    }

    /// Delete that never fails: a 404 counts as already cleaned up.
    pub fn cleanup(&self, id: i64) -> (CleanupOutcome, Option<Envelope>) {
        match self.delete(id) {
            Ok(env) => {
                let outcome = match env.status {
                    200 => CleanupOutcome::Deleted,
                    404 => CleanupOutcome::AlreadyGone,
                    other => CleanupOutcome::Failed(Some(other)),
                };
                match outcome {
                    CleanupOutcome::Deleted => tracing::info!(pet_id = id, "pet deleted"),
                    CleanupOutcome::AlreadyGone => {
                        tracing::info!(pet_id = id, "pet not found (already deleted)");
                    }
                    CleanupOutcome::Failed(status) => {
                        tracing::warn!(pet_id = id, ?status, "cleanup delete failed");
                    }
                }
                (outcome, Some(env))
            }
            Err(e) => {
                tracing::warn!(pet_id = id, error = %e, "cleanup delete got no response");
                (CleanupOutcome::Failed(None), None)
            }
        }
    }

    fn execute(
        &self,
        method: Method,
        path: String,
        query: Vec<(String, String)>,
        body: Option<&serde_json::Value>,
    ) -> Result<Envelope, DispatchError> {
        let mut request = HttpRequest::new(method, path);
        request.query = query;
        request.headers.push(("Accept".to_string(), JSON.to_string()));
        if body.is_some() {
            request
                .headers
                .push(("Content-Type".to_string(), JSON.to_string()));
        }
        request.headers.extend(self.headers.iter().cloned());
        request.body = body.cloned();

        let start = Instant::now();
        let reply = self.transport.send(&request).map_err(|source| DispatchError {
            operation: request.label(),
            source,
        })?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            operation = %request.label(),
            status = reply.status,
            duration_ms,
            "dispatched"
        );
        Ok(Envelope::from_text(reply.status, duration_ms, &reply.body))
    }
}

/// Emit the structured line for one step and return it for the report.
pub fn log_response(envelope: &Envelope, title: &str) -> StepRecord {
    let record = StepRecord::from_envelope(title, envelope);
    tracing::info!(
        step = %record.title,
        status = record.status,
        duration_ms = record.duration_ms,
        body = %record.body_excerpt,
        "api response"
    );
    record
}

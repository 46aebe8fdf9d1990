//! In-memory pet service for scenario tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::{Value, json};

use petcheck_runner::{HttpReply, HttpRequest, Transport, TransportError};

/// Misbehaviours the fake can be told to show.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Updates are echoed but the pet vanishes from the store
    pub lose_updates: bool,
    /// Creates are echoed but never stored
    pub missing_after_create: bool,
    /// Every create answers with this status instead
    pub create_status: Option<u16>,
    /// Status for a create whose id is not an integer (500 when unset)
    pub invalid_create_status: Option<u16>,
    /// Create echoes carry an undocumented status and an extra key
    pub corrupt_echo: bool,
    /// Update echoes repeat the record as it was before the update
    pub stale_update_echo: bool,
    /// Filter results include an entry with the wrong status
    pub wrong_filter_status: bool,
    /// Extra records returned by every filter query whose status matches
    pub foreign: Vec<Value>,
    /// Every request fails before a response exists
    pub unreachable: bool,
}

#[derive(Default)]
pub struct FakePetStore {
    pub faults: Faults,
    pets: RefCell<BTreeMap<i64, Value>>,
    calls: RefCell<Vec<String>>,
}

impl FakePetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            faults,
            ..Self::default()
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.pets.borrow().contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.pets.borrow().is_empty()
    }

    /// `METHOD /path[?k=v]` for every request received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn create(&self, body: Option<&Value>) -> HttpReply {
        if let Some(status) = self.faults.create_status {
            return api_response(status, "unknown", "something bad happened");
        }
        let Some(pet) = body.filter(|b| b.get("id").is_some_and(Value::is_i64)) else {
            let status = self.faults.invalid_create_status.unwrap_or(500);
            return api_response(status, "unknown", "something bad happened");
        };
        if !self.faults.missing_after_create {
            self.store(pet);
        }
        if self.faults.corrupt_echo {
            let mut echo = pet.clone();
            echo["status"] = json!("discontinued");
            echo["internalNote"] = json!("migrated");
            return reply(200, &echo);
        }
        reply(200, pet)
    }

    fn update(&self, body: Option<&Value>) -> HttpReply {
        let Some(pet) = body.filter(|b| b.get("id").is_some_and(Value::is_i64)) else {
            return api_response(400, "unknown", "bad input");
        };
        let before = pet["id"]
            .as_i64()
            .and_then(|id| self.pets.borrow().get(&id).cloned());
        if self.faults.lose_updates {
            if let Some(id) = pet["id"].as_i64() {
                self.pets.borrow_mut().remove(&id);
            }
        } else {
            self.store(pet);
        }
        match before {
            Some(old) if self.faults.stale_update_echo => reply(200, &old),
            _ => reply(200, pet),
        }
    }

    fn get(&self, id: Option<i64>) -> HttpReply {
        match id.and_then(|id| self.pets.borrow().get(&id).cloned()) {
            Some(pet) => reply(200, &pet),
            None => api_response(404, "error", "Pet not found"),
        }
    }

    fn find_by_status(&self, request: &HttpRequest) -> HttpReply {
        let status = request
            .query
            .iter()
            .find(|(k, _)| k == "status")
            .map(|(_, v)| v.as_str())
            .unwrap_or_default();
        let mut entries: Vec<Value> = self
            .pets
            .borrow()
            .values()
            .filter(|p| p["status"] == status)
            .cloned()
            .collect();
        entries.extend(
            self.faults
                .foreign
                .iter()
                .filter(|p| p["status"] == status)
                .cloned(),
        );
        if self.faults.wrong_filter_status {
            let other = if status == "available" { "sold" } else { "available" };
            entries.push(json!({"id": 1, "name": "stray", "photoUrls": [], "status": other}));
        }
        reply(200, &Value::Array(entries))
    }

    fn delete(&self, id: Option<i64>) -> HttpReply {
        match id.and_then(|id| self.pets.borrow_mut().remove(&id).map(|_| id)) {
            Some(id) => api_response(200, "unknown", &id.to_string()),
            None => HttpReply {
                status: 404,
                body: String::new(),
            },
        }
    }

    fn store(&self, pet: &Value) {
        if let Some(id) = pet["id"].as_i64() {
            self.pets.borrow_mut().insert(id, pet.clone());
        }
    }
}

impl Transport for FakePetStore {
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        let mut call = request.label();
        for (k, v) in &request.query {
            call.push_str(&format!("?{k}={v}"));
        }
        self.calls.borrow_mut().push(call);

        if self.faults.unreachable {
            return Err(TransportError::Connect("connection refused".into()));
        }

        let id = request
            .path
            .strip_prefix("/pet/")
            .and_then(|rest| rest.parse::<i64>().ok());
        let reply = match (&request.method, request.path.as_str()) {
            (&Method::POST, "/pet") => self.create(request.body.as_ref()),
            (&Method::PUT, "/pet") => self.update(request.body.as_ref()),
            (&Method::GET, "/pet/findByStatus") => self.find_by_status(request),
            (&Method::GET, _) => self.get(id),
            (&Method::DELETE, _) => self.delete(id),
            _ => api_response(405, "unknown", "method not allowed"),
        };
        Ok(reply)
    }
}

fn reply(status: u16, body: &Value) -> HttpReply {
    HttpReply {
        status,
        body: body.to_string(),
    }
}

fn api_response(code: u16, kind: &str, message: &str) -> HttpReply {
    reply(code, &json!({"code": code, "type": kind, "message": message}))
}

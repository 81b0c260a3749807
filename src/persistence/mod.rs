//! Fire-and-forget persistence of created dots
//!
//! The simulation never waits on a store. A request is handed off together
//! with a completion callback, and the callback only queues a claim update.
//! The next frame applies queued updates to cosmetic fields (slug, claimed).

mod memory;
#[cfg(target_arch = "wasm32")]
mod web;

pub use memory::{MemoryStore, slugify};
#[cfg(target_arch = "wasm32")]
pub use web::{FetchStore, fetch_galaxy};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::Dot;

/// Longest accepted dot name (characters)
pub const MAX_NAME_LEN: usize = 24;
/// Longest accepted status line (characters)
pub const MAX_LINE_LEN: usize = 80;

/// Store failures. None of these ever reach the frame loop as a panic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;

/// Body of a create-dot call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDotRequest {
    pub name: String,
    pub color: String,
    pub line: String,
    pub vibe: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub theme: String,
}

impl CreateDotRequest {
    pub fn from_dot(dot: &Dot) -> Self {
        Self {
            name: dot.name.clone(),
            color: dot.color.clone(),
            line: dot.line.clone(),
            vibe: dot.vibe.clone(),
            link: dot.link.clone(),
            theme: dot.theme.clone(),
        }
    }

    /// Reject what the server would reject
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(PersistError::Rejected(format!(
                "name required (max {} chars)",
                MAX_NAME_LEN
            )));
        }
        if self.color.trim().is_empty() {
            return Err(PersistError::Rejected("color required".to_string()));
        }
        Ok(())
    }
}

/// The stored record as echoed back by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDotResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub slug: String,
    #[serde(default, rename = "ownerId")]
    pub owner_id: Option<String>,
}

impl CreateDotResponse {
    pub fn claimed(&self) -> bool {
        self.owner_id.is_some()
    }
}

/// Cosmetic metadata to apply to a dot on the next frame
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimUpdate {
    pub index: usize,
    pub slug: String,
    pub claimed: bool,
}

/// Called exactly once when a store call settles
pub type Completion = Box<dyn FnOnce(Result<CreateDotResponse>)>;

/// Shared single-threaded queue between completions and the frame loop
#[derive(Debug, Clone, Default)]
pub struct ClaimQueue(Rc<RefCell<VecDeque<ClaimUpdate>>>);

impl ClaimQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, update: ClaimUpdate) {
        self.0.borrow_mut().push_back(update);
    }

    pub fn drain(&self) -> Vec<ClaimUpdate> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Completion for dot `index`: successes are queued, failures logged and dropped
    pub fn completion(&self, index: usize) -> Completion {
        let queue = self.clone();
        Box::new(move |result| match result {
            Ok(saved) => queue.push(ClaimUpdate {
                index,
                claimed: saved.claimed(),
                slug: saved.slug,
            }),
            Err(e) => log::warn!("Persisting dot {} failed: {}", index, e),
        })
    }
}

/// Anything that can persist a created dot
pub trait DotStore {
    /// Start persisting `request`; `done` runs once the call settles
    fn create_dot(&self, request: CreateDotRequest, done: Completion);
}

/// Store that drops every request (offline sessions)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl DotStore for NullStore {
    fn create_dot(&self, request: CreateDotRequest, _done: Completion) {
        log::debug!("Not persisting dot {} (offline)", request.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::DotSeed;
    use glam::Vec3;

    fn request(name: &str) -> CreateDotRequest {
        CreateDotRequest {
            name: name.to_string(),
            color: "#ff6b6b".to_string(),
            line: "hi".to_string(),
            vibe: "serene".to_string(),
            link: None,
            theme: "default".to_string(),
        }
    }

    #[test]
    fn test_request_from_dot_uses_defaults() {
        let dot = Dot::new(
            DotSeed {
                name: "kai".to_string(),
                color: "#00d2d3".to_string(),
                link: Some("  ".to_string()),
                ..Default::default()
            },
            Vec3::ZERO,
        );
        let req = CreateDotRequest::from_dot(&dot);
        assert_eq!(req.vibe, "serene");
        assert_eq!(req.theme, "default");
        assert_eq!(req.link, None);
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("link"));
    }

    #[test]
    fn test_validation() {
        assert!(request("kai").validate().is_ok());
        assert!(matches!(request("  ").validate(), Err(PersistError::Rejected(_))));
        assert!(request(&"x".repeat(25)).validate().is_err());
        let mut no_color = request("kai");
        no_color.color.clear();
        assert!(no_color.validate().is_err());
    }

    #[test]
    fn test_response_decodes_stored_row() {
        let json = r#"{"id":"abc123","slug":"kai-2","name":"kai","ownerId":"u1","posX":1.5}"#;
        let saved: CreateDotResponse = serde_json::from_str(json).unwrap();
        assert_eq!(saved.slug, "kai-2");
        assert!(saved.claimed());

        let unclaimed: CreateDotResponse = serde_json::from_str(r#"{"slug":"x"}"#).unwrap();
        assert!(!unclaimed.claimed());
        assert!(serde_json::from_str::<CreateDotResponse>(r#"{"message":"nope"}"#).is_err());
    }

    #[test]
    fn test_completion_queues_success_and_drops_failure() {
        let queue = ClaimQueue::new();
        (queue.completion(3))(Ok(CreateDotResponse {
            id: None,
            slug: "kai".to_string(),
            owner_id: Some("u".to_string()),
        }));
        (queue.completion(4))(Err(PersistError::Status(500)));
        let updates = queue.drain();
        assert_eq!(
            updates,
            vec![ClaimUpdate {
                index: 3,
                slug: "kai".to_string(),
                claimed: true
            }]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PersistError::Status(409).to_string(),
            "server returned status 409"
        );
    }
}

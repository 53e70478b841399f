#![allow(dead_code)]

use chrono::{DateTime, Utc};
use event_store_adapter::aggregate::{Aggregate, AggregateId};
use event_store_adapter::error::{EventStoreError, EventStoreResult};
use event_store_adapter::event::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserAccountId {
    value: String,
}

impl UserAccountId {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl AggregateId for UserAccountId {
    fn type_name(&self) -> &str {
        "user-account"
    }

    fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type_name")]
pub enum UserAccountEvent {
    #[serde(rename = "user-account-created")]
    Created {
        id: String,
        aggregate_id: UserAccountId,
        seq_nr: usize,
        name: String,
        occurred_at: DateTime<Utc>,
    },
    #[serde(rename = "user-account-renamed")]
    Renamed {
        id: String,
        aggregate_id: UserAccountId,
        seq_nr: usize,
        name: String,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for UserAccountEvent {
    type Id = UserAccountId;

    fn id(&self) -> &str {
        match self {
            UserAccountEvent::Created { id, .. } | UserAccountEvent::Renamed { id, .. } => id,
        }
    }

    fn type_name(&self) -> &str {
        match self {
            UserAccountEvent::Created { .. } => "user-account-created",
            UserAccountEvent::Renamed { .. } => "user-account-renamed",
        }
    }

    fn aggregate_id(&self) -> &Self::Id {
        match self {
            UserAccountEvent::Created { aggregate_id, .. }
            | UserAccountEvent::Renamed { aggregate_id, .. } => aggregate_id,
        }
    }

    fn sequence_number(&self) -> usize {
        match self {
            UserAccountEvent::Created { seq_nr, .. }
            | UserAccountEvent::Renamed { seq_nr, .. } => *seq_nr,
        }
    }

    fn is_created(&self) -> bool {
        matches!(self, UserAccountEvent::Created { .. })
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            UserAccountEvent::Created { occurred_at, .. }
            | UserAccountEvent::Renamed { occurred_at, .. } => *occurred_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    id: UserAccountId,
    seq_nr: usize,
    version: usize,
    name: String,
}

impl UserAccount {
    pub fn create(id: UserAccountId, name: &str) -> (Self, UserAccountEvent) {
        let account = Self {
            id: id.clone(),
            seq_nr: 1,
            version: 1,
            name: name.to_string(),
        };
        let event = UserAccountEvent::Created {
            id: Ulid::new().to_string(),
            aggregate_id: id,
            seq_nr: 1,
            name: name.to_string(),
            occurred_at: Utc::now(),
        };
        (account, event)
    }

    pub fn rename(&self, name: &str) -> (Self, UserAccountEvent) {
        let mut renamed = self.clone();
        renamed.seq_nr += 1;
        renamed.name = name.to_string();
        let event = UserAccountEvent::Renamed {
            id: Ulid::new().to_string(),
            aggregate_id: self.id.clone(),
            seq_nr: renamed.seq_nr,
            name: name.to_string(),
            occurred_at: Utc::now(),
        };
        (renamed, event)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 从快照出发按序重放事件，重建最新状态
    pub fn replay(snapshot: UserAccount, events: &[UserAccountEvent]) -> UserAccount {
        events.iter().fold(snapshot, |mut state, event| {
            state.apply(event);
            state
        })
    }

    fn apply(&mut self, event: &UserAccountEvent) {
        match event {
            UserAccountEvent::Created { .. } => {}
            UserAccountEvent::Renamed { seq_nr, name, .. } => {
                self.seq_nr = *seq_nr;
                self.name = name.clone();
            }
        }
    }
}

impl Aggregate for UserAccount {
    type Id = UserAccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn sequence_number(&self) -> usize {
        self.seq_nr
    }

    fn version(&self) -> usize {
        self.version
    }

    fn with_version(mut self, version: usize) -> Self {
        self.version = version;
        self
    }
}

pub fn event_converter(payload: Value) -> EventStoreResult<UserAccountEvent> {
    serde_json::from_value(payload).map_err(EventStoreError::from)
}

pub fn snapshot_converter(payload: Value) -> EventStoreResult<UserAccount> {
    serde_json::from_value(payload).map_err(EventStoreError::from)
}

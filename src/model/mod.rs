//! Raw data model for the candidate graph.
//!
//! Messages and links are produced externally (chat frontends, arbiter
//! runners, consultation bridges) and handed to the engine as snapshots. The
//! engine never mutates a [`Message`]; links change only through the
//! repository surface in [`crate::links`].


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single conversational record.
///
/// Parent pointers and group ids are populated inconsistently by different
/// producers; both are weak references with no integrity guarantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: String,
    /// Who produced the message.
    pub role: Role,
    /// The message text.
    pub content: String,
    /// Weak back-reference to the message this one responds to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    /// Grouping key tying parallel responses to one request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_group_id: Option<String>,
    /// When the message was created. Sole sibling-ordering key.
    pub created_at: DateTime<Utc>,
    /// Identifier of the model that produced the response, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human (or driving agent) issuing requests.
    User,
    /// A model answering a request.
    Assistant,
    /// A model critiquing another response.
    Critic,
    /// A model scoring responses on the user's behalf.
    Arbiter,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Critic => write!(f, "critic"),
            Role::Arbiter => write!(f, "arbiter"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "critic" => Ok(Role::Critic),
            "arbiter" => Ok(Role::Arbiter),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// A typed, directed, optionally weighted relationship between two messages.
///
/// Referential integrity is not guaranteed: either endpoint may reference a
/// message that no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique link identifier.
    pub id: String,
    /// Source message id.
    pub source_message_id: String,
    /// Target message id.
    pub target_message_id: String,
    /// Relationship type.
    #[serde(rename = "link_type")]
    pub kind: LinkKind,
    /// Numeric weight. Meaningful only for evaluation links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Open metadata bag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
}

/// Type of relationship a link records.
///
/// The set is closed on the write side, but the read side tolerates unknown
/// wire values via [`LinkKind::Other`] so newer producers do not break older
/// consumers. Unknown kinds never contribute to scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Direct response lineage.
    Reply,
    /// A critique of the target response.
    Critique,
    /// A quality/preference score from a human or an arbiter model.
    Evaluation,
    /// The source was forwarded into an auxiliary consultation chat.
    ForwardToDchat,
    /// A consultation result returned into the originating chat.
    ReturnFromDchat,
    /// The source summarizes the target.
    SummaryOf,
    /// Unrecognized wire value, preserved verbatim.
    #[serde(untagged)]
    Other(String),
}

impl LinkKind {
    /// Whether this link carries an evaluation score.
    pub fn is_evaluation(&self) -> bool {
        matches!(self, LinkKind::Evaluation)
    }

    /// Whether this link crosses into or out of a consultation chat.
    pub fn is_cross_chat(&self) -> bool {
        matches!(self, LinkKind::ForwardToDchat | LinkKind::ReturnFromDchat)
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkKind::Reply => write!(f, "reply"),
            LinkKind::Critique => write!(f, "critique"),
            LinkKind::Evaluation => write!(f, "evaluation"),
            LinkKind::ForwardToDchat => write!(f, "forward_to_dchat"),
            LinkKind::ReturnFromDchat => write!(f, "return_from_dchat"),
            LinkKind::SummaryOf => write!(f, "summary_of"),
            LinkKind::Other(s) => write!(f, "{}", s),
        }
    }
}

impl std::str::FromStr for LinkKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "reply" => LinkKind::Reply,
            "critique" => LinkKind::Critique,
            "evaluation" => LinkKind::Evaluation,
            "forward_to_dchat" => LinkKind::ForwardToDchat,
            "return_from_dchat" => LinkKind::ReturnFromDchat,
            "summary_of" => LinkKind::SummaryOf,
            _ => LinkKind::Other(s.to_string()),
        })
    }
}

impl Message {
    /// Create a new message with the given role and content
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            parent_message_id: None,
            request_group_id: None,
            created_at: Utc::now(),
            model: None,
        }
    }

    /// Set the parent message
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_message_id = Some(parent_id.into());
        self
    }

    /// Set the request group
    pub fn with_request_group(mut self, group_id: impl Into<String>) -> Self {
        self.request_group_id = Some(group_id.into());
        self
    }

    /// Set the producing model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the creation timestamp (records arrive with their own clock)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

impl Link {
    /// Create a new link between two messages
    pub fn new(
        source_message_id: impl Into<String>,
        target_message_id: impl Into<String>,
        kind: LinkKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_message_id: source_message_id.into(),
            target_message_id: target_message_id.into(),
            kind,
            weight: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// Set the weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Set metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set the creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Whether this link contributes to score aggregation.
    pub fn is_scoring(&self) -> bool {
        self.kind.is_evaluation() && self.weight.is_some()
    }
}

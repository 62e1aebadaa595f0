//! # Candidate Graph Engine
//!
//! A decision-graph engine that reconstructs a multi-branch response lineage
//! from a flat collection of conversational messages and a separate table of
//! typed, directed, weighted links between them.
//!
//! Several AI models answer the same user request in parallel; a user or an
//! arbiter model scores and critiques individual responses. This crate turns
//! that flat, loosely-consistent data into a navigable tree of candidates per
//! request, with cross-chat references and aggregate scoring.
//!
//! ## Features
//!
//! - **Indexing**: O(n) lookup structures over a message/link snapshot
//! - **Tree assembly**: cycle-safe recursive candidate subtree composition
//! - **Path scoring**: evaluation-weight aggregation, node-local and per-path
//! - **Request grouping**: one ranked candidate set per originating request
//! - **Link repository**: mirrored mutations against a remote link store
//!
//! ## Architecture
//!
//! ```text
//! Message snapshot ─┐
//!                   ├─→ CandidateGraph (index → assemble → group → rank)
//! Link mirror ──────┘         ↑
//!                     LinkRepository ←→ LinkStore (HTTP)
//! ```
//!
//! The read side is total: every query returns a value (possibly empty or
//! unscored) and never fails. Only the link-store boundary produces errors.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use candidate_graph::links::{InMemoryLinkStore, LinkRepository};
//! use candidate_graph::model::{Link, LinkKind, Message, Role};
//! use candidate_graph::CandidateGraph;
//!
//! let request = Message::new(Role::User, "compare these approaches");
//! let answer = Message::new(Role::Assistant, "first approach wins")
//!     .with_parent(&request.id);
//! let score = Link::new(&answer.id, &request.id, LinkKind::Evaluation).with_weight(8.0);
//!
//! let store = Arc::new(InMemoryLinkStore::seeded(vec![score.clone()]));
//! let repository = LinkRepository::with_links(store, vec![score]);
//! let graph = CandidateGraph::new(vec![request, answer], repository);
//! assert_eq!(graph.groups().len(), 1);
//! ```

#![warn(missing_docs)]

/// Configuration management for the engine and its link store client.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Graph assembly: indexing, tree building, scoring, grouping, and the facade.
pub mod graph;
/// Link repository surface: store trait, HTTP client, and mirrored mutations.
pub mod links;
/// Raw data model: messages, links, and their closed/open enums.
pub mod model;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use graph::{CandidateGraph, CandidateNode, RequestGroup};
pub use links::{HttpLinkStore, InMemoryLinkStore, LinkRepository, LinkStore};
pub use model::{Link, LinkKind, Message, Role};

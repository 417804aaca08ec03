//! Orchestration layer for composite actions.
//!
//! `trigger` defines the collaborator traits the orchestrator calls out to;
//! `promise` holds the join, chain, classification, and finally flow.

pub mod promise;
pub mod trigger;

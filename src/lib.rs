//! A Kubernetes operator for a multi-role distributed database (§1): a
//! per-deployment reconciliation engine, a member/resource materializer,
//! and a scaling/validation/immutability layer, bound together by one
//! `DeploymentManager` per custom resource and a thin `Controller` registry.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

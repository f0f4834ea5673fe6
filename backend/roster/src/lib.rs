//! # Roster
//!
//! Everything a Zayathon registration is, independent of how it arrives.
//!
//! - [`registration`]: stored rows and incoming payloads
//! - [`validation`]: rules a team must pass before it is stored
//! - [`payment`]: payment proof file rules and storage naming
//! - [`mail`]: send-email requests and review templates
//! - [`review`]: admin filtering and stats
//! - [`export`]: CSV dump
//! - [`tracks`]: problem domains, problem statements, results
//! - [`remote`]: client for the hosted store, storage and auth
//!
//! The rules live here so the HTTP service and any other Rust client enforce
//! the same checks.
pub mod export;
pub mod mail;
pub mod payment;
pub mod registration;
pub mod remote;
pub mod review;
pub mod tracks;
pub mod validation;

pub use registration::{Registration, RegistrationForm, Status};
pub use remote::{RemoteError, Store};

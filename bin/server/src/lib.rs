//! Gatehouse server: the authentication gateway's web layer.
//!
//! The reusable pieces (provider catalog, session and directory seams, the
//! handshake capability) live in `gatehouse-access`; this crate wires them
//! into axum routes, extractors, and the OIDC handshake implementation.

pub mod auth;
pub mod config;

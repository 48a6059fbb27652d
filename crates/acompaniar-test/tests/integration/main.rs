//! HTTP-level integration tests for the emergency backend.

mod auth;
mod centros;
mod contacts;
mod emergency;
mod helpers;
mod pg_store;
mod report;

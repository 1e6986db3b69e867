//! Lighthouse pipeline gate.
//!
//! Runs Lighthouse against a URL, registers the HTML report as an Azure
//! Pipelines attachment, and checks audit scores against assertions such as
//! `first-contentful-paint > 0.9`.

pub mod adapters;
pub mod cmd;
pub mod domain;
pub mod engine;
pub mod io;
pub mod util;

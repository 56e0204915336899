//! Shared fixtures for integration tests. Not every test binary uses every helper.
#![allow(dead_code)]

pub mod api_server;
pub mod fakes;

//! Language Insight
//!
//! A small web service that sends text to a cloud language-analysis API and
//! presents sentiment, key phrases and the detected language.

pub mod analysis;
pub mod client;
pub mod config;
pub mod error;
pub mod web;

#[cfg(test)]
mod error_tests;

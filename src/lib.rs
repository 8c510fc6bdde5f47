//! Formflow - Conversation Orchestration Engine
//!
//! This crate implements the turn-by-turn state machine behind an AI-driven
//! form interview: respondents answer one field at a time, a model call
//! validates each answer, and the next question streams back incrementally.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

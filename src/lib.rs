//! Zoho Leads Markdown Transform Library
//!
//! Normalizes the loosely-shaped response envelopes produced by an upstream CRM
//! connector step and turns the contained record list into a markdown listing plus a
//! JSON diagnostic trace.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `context`: Pipeline context lookup (input document or environment fallback).
//! - `envelope`: Envelope classification and unwrapping.
//! - `errors`: Error handling types.
//! - `extractor`: Record list extraction.
//! - `models`: Shared data models and diagnostics.
//! - `render`: Markdown rendering.
//! - `transform`: Run orchestration and output writing.

pub mod config;
pub mod context;
pub mod envelope;
pub mod errors;
pub mod extractor;
pub mod models;
pub mod render;
pub mod transform;

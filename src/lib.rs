//! Development plan tracking for AI-assisted work.
//!
//! A project's plan is a sequence of versioned iterations. Each iteration
//! holds requirements decomposed from goals, tasks generated per requirement,
//! and a free-form Markdown report. The plan lives in a directory inside the
//! project and is exposed to agents through an MCP server.

pub mod config;
pub mod error;
pub mod guidance;
pub mod mcp;
pub mod models;
pub mod render;
pub mod store;
pub mod version;

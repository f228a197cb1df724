//! Rituo: chat-driven control of Google Workspace (calendar, mail, tasks).
//!
//! The library is the intent resolution and tool dispatch engine: it turns a
//! free-text utterance into a validated call against an MCP tool server and
//! turns the raw result back into a reply.
//!
//! Pipeline per turn: [`intent`] → [`slots`] → [`dispatch`] → [`format`],
//! driven by the [`agent`] orchestrator.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;

pub mod mcp;
pub mod providers;

pub mod intent;
pub mod slots;

pub mod dispatch;
pub mod format;

pub mod agent;

//! Agent runtime
//!
//! System prompt assembly, the JSON directive protocol, and tool
//! dispatch over the Moltbook API.

pub mod parser;
pub mod session;
pub mod tools;

pub use parser::{extract_directive, AgentDirective};
pub use session::{build_system_prompt, AgentSession, SKILL_URL};
pub use tools::{execute_tool, TOOL_CATALOG};

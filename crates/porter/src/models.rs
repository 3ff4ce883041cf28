//! The objects passed between the agent, the model provider and the tool
//! host. Wire formats (Anthropic message JSON, MCP JSON-RPC payloads) are
//! converted into these internal structs at the edges; nothing outside the
//! provider and transport modules touches raw JSON shapes.
pub mod message;
pub mod role;
pub mod tool;

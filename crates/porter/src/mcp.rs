//! Client side of the Model Context Protocol: the JSON-RPC payload types,
//! the SSE transport, and the registry adapter the agent talks to.
pub mod client;
pub mod protocol;
pub mod transport;

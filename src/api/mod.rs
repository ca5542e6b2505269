/// Wire-format types for the WebSocket and REST surfaces
pub mod dto;

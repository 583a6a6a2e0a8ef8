// handlers/mod.rs - HTTP handlers, one module per route group
pub mod admin; // /admin/* form endpoints
pub mod health; // GET /health

//! Users service
//!
//! A small in-memory users store served through `procedure-router`: root
//! procedures, a `user` group with HTTP-style methods, logging interceptors
//! and two adapters (`describe` and `http`).

pub mod rpc;

pub use rpc::{AppContext, HttpGateway, UserStore, create_api, create_router};

//! modfetch - locate and retrieve mod packages from heterogeneous sites.
//!
//! The crate is organized around [`handler::SiteHandler`] implementations,
//! one per supported origin family, dispatched through a
//! [`handler::HandlerRegistry`]. The [`acquire`] module drives the full
//! flow: resolve a handler, fetch metadata, discover download candidates,
//! and route the chosen candidate through direct streaming, a
//! [`resolver::HostResolver`], or delegation to another handler.

pub mod acquire;
pub mod download;
pub mod error;
pub mod handler;
pub mod http;
pub mod model;
pub mod parse;
pub mod resolver;
pub mod runtime;

//! Request middleware: tenant resolution and bearer authentication.

pub mod auth;
pub mod tenant;

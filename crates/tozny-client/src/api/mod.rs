//! Typed request/response shapes and the endpoints that use them, grouped by
//! the object they manage.

pub mod account;
pub mod application;
pub mod federation;
pub mod group;
pub mod pam;
pub mod provider;
pub mod realm;
pub mod role;

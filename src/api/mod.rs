//! Wire models for the identity and image services.
//!
//! Request and response bodies only; the clients that send them live in
//! `crate::identity` and `crate::image`.

pub mod glance;
pub mod keystone;

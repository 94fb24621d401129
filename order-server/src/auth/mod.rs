//! Actor identity and order authorization
//!
//! - [`CurrentActor`] - caller identity forwarded by the identity gateway
//! - [`authorize`] - allow-list evaluated on every order mutation

pub mod extractor;
pub mod policy;

pub use extractor::CurrentActor;
pub use policy::{Decision, DenyReason, RequestedTransition, authorize, authorize_create};

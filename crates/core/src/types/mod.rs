//! Core types for the food delivery platform.

pub mod access;
pub mod id;
pub mod money;
pub mod status;
pub mod validation;

pub use access::{AccessDenied, Capability, OrderOwnership, Principal, Role};
pub use id::*;
pub use money::Money;
pub use status::{OrderStatus, OrderTimeline, Transition, TransitionError, UnknownStatus};
pub use validation::{FieldError, ValidationErrors};

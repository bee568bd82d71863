// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod collection;
pub mod metrics;
pub mod pagination;
pub mod photo;
pub mod site;
pub mod tag;
pub mod user;

pub use collection::*;
pub use metrics::*;
pub use pagination::*;
pub use photo::*;
pub use site::*;
pub use tag::*;
pub use user::*;

// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod auth_service;
pub mod collection_service;
pub mod imaging;
pub mod metrics_service;
pub mod photo_service;
pub mod rate_limiter;
pub mod site_service;
pub mod slug;
pub mod storage;
pub mod tag_service;

pub use auth_service::*;
pub use collection_service::*;
pub use metrics_service::*;
pub use photo_service::*;
pub use rate_limiter::*;
pub use site_service::*;
pub use storage::*;
pub use tag_service::*;

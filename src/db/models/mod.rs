//! Database models split into domain-specific modules.

pub mod reservation;
pub mod studio;
pub mod user;

pub use reservation::*;
pub use studio::*;
pub use user::*;

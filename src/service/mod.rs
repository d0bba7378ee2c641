//! Entity services: validation in front of the repositories, and the registry that maps entities to them.

mod entity;
mod registry;
mod validation;
pub use entity::{EntityService, Mutation};
pub use registry::Registry;
pub use validation::{is_blank, is_email, RequestValidator};

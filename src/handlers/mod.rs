//! HTTP handlers: REST entity CRUD, SOAP endpoints, dashboard, hub, API info and form metadata.

pub mod dashboard;
pub mod entity;
pub mod hub;
pub mod info;
pub mod meta;
pub mod soap;

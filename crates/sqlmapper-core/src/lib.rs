//! Core types and traits for sqlmapper.
//!
//! `sqlmapper-core` is the foundation layer for the workspace. It defines the
//! contracts every other crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: [`Entity`] is implemented by user types (usually via
//!   `#[derive(Entity)]` from `sqlmapper-macros`); [`Connection`] and
//!   [`DataSource`] are the execution boundary implemented by database
//!   drivers.
//! - **Data model**: [`Row`], [`Value`], and [`ParameterMap`] represent query
//!   inputs and outputs shared across the query and session crates.
//! - **Metadata**: [`metadata::resolve`] turns an entity's static descriptor
//!   into cached [`EntityMetadata`] that drives SQL generation.
//!
//! # Who Uses This Crate
//!
//! - `sqlmapper-macros` generates [`Entity`] implementations defined here.
//! - `sqlmapper-query` consumes [`EntityMetadata`] and [`Value`] to build SQL.
//! - `sqlmapper-session` depends on [`Connection`] and [`DataSource`] for
//!   transaction propagation.
//!
//! Most applications should use the `sqlmapper` facade; reach for
//! `sqlmapper-core` directly when writing drivers or advanced integrations.

pub mod command;
pub mod connection;
pub mod entity;
pub mod error;
pub mod field;
pub mod metadata;
pub mod params;
pub mod pk;
pub mod row;
pub mod value;

pub use command::CommandKind;
pub use connection::{Connection, DataSource};
pub use entity::Entity;
pub use error::{Error, Result};
pub use field::FieldInfo;
pub use entity::entity_params;
pub use metadata::{EntityMetadata, resolve};
pub use params::ParameterMap;
pub use pk::{IntoPk, PkPredicate};
pub use row::Row;
pub use value::{FromValue, Value};

//! Policy tables for the commerce back office.
//!
//! - [`PolicyTable`] is the serializable form of a rule registry, loadable
//!   from JSON at startup
//! - [`commerce_table`] is the built-in table covering orders, products,
//!   providers, employees and customers

pub mod commerce;
pub mod error;
pub mod table;

pub use commerce::{commerce_registry, commerce_table, roles};
pub use error::{CatalogError, Result};
pub use table::{OwnershipConfig, PolicyTable, ResourceTable};

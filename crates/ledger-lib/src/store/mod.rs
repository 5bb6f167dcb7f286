pub mod db_migrate;
mod error;
pub mod migration;
mod schema;
pub mod store_impl;

pub use error::StoreError;
pub use store_impl::Store;

#[cfg(test)]
mod tests;

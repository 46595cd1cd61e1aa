pub mod catalog;
pub mod db;

pub use catalog::{FinnaSource, GoogleBooksSource, OpenLibrarySource};
pub use db::DbAdapter;

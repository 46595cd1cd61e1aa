pub mod domain;
pub mod ledger;
pub mod ports;
pub mod resolver;
pub mod stats;

pub use domain::{
    AuthSession, Book, BookPatch, BookStatus, NewBook, NormalizedBook, Stats, User,
    UserCredentials,
};
pub use ledger::{apply_patch, build_book};
pub use ports::{CatalogSource, DatabaseService, PortError, PortResult};
pub use resolver::CatalogResolver;
pub use stats::compute_stats;

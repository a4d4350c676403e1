//! SQLite adapter implementations of the persistence ports.

pub mod connection;
pub mod deliverable_repository;
pub mod migrations;
pub mod profile_repository;
pub mod step_repository;
pub mod task_repository;

pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError};
pub use deliverable_repository::SqliteDeliverableRepository;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use profile_repository::SqliteProfileRepository;
pub use step_repository::SqliteStepRepository;
pub use task_repository::SqliteTaskRepository;

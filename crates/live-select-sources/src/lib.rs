pub mod traits;
pub mod factory;
pub mod file;
pub mod showroom;
pub mod error;

pub use traits::SnapshotSupplier;
pub use factory::create_supplier;
pub use file::FileSnapshotSupplier;
pub use showroom::ShowroomClient;
pub use error::SourceError;

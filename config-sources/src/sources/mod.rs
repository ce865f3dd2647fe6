//! Configuration source implementations

pub mod ini_object;
pub mod parameter_store;
pub mod row_store;
pub mod secret_blob;

pub use ini_object::{IniDocument, IniObjectSource};
pub use parameter_store::ParameterStoreSource;
pub use row_store::RowStoreSource;
pub use secret_blob::SecretBlobSource;

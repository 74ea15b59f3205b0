pub mod builder;
pub mod remainder;
pub mod types;

pub use builder::{build_output, min_storage_cost, packed_len, storage_deposit};
pub use remainder::compute_remainder;
pub use types::{CostParameters, OutputDescriptor, OutputError, OutputRequest};

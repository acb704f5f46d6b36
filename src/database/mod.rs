pub mod local;
pub mod remote;

pub use local::{init_in_memory, init_mirror_db, MirrorDb};
pub use remote::common::{CloudClient, CloudError};

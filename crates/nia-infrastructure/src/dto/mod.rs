//! Versioned on-disk records.

mod config_root;
mod session;

pub use config_root::{
    CONFIG_ROOT_ENTITY, ConfigRoot, ConfigRootV1_0_0, create_config_root_migrator,
};
pub use session::{SESSION_ENTITY, SessionFile, SessionV1_0_0, create_session_migrator};

mod config;
mod store;

pub use config::FileConfig;
pub use store::FileStateStore;

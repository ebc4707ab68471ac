pub mod file;

pub use file::FileContextStore;

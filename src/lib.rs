pub mod archive;
pub mod bulk;
pub mod cli;
pub mod config;
pub mod db;
pub mod encoding;
pub mod error;
pub mod extractor;
pub mod facedb;
mod metrics;
pub mod server;

pub use config::Opts;
pub use encoding::FaceDescriptor;
pub use error::FaceDbError;
pub use facedb::FaceDB;

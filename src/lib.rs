// Cloudinary SDK Library
// Delivery URLs, request signing, uploads and a two-tier image cache

pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod management;
pub mod network;
pub mod results;
pub mod signature;
pub mod transformation;
pub mod uploader;
pub mod url;

pub use client::Cloudinary;
pub use error::SdkError;

//! photosync-s3: S3 SDK adapter for photosync
//!
//! Implements the `ObjectStore` trait from photosync-core using aws-sdk-s3.

mod client;

pub use client::S3Client;

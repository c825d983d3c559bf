// Picmark batch watermarking library

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod watermark;

//! Clip download adapters

mod fs_downloader;

pub use fs_downloader::FsDownloader;

//! Self-hosted media library server: browse a directory tree, keep a catalog of
//! videos and books, and serve browser-ready WebVTT subtitles converted from SubRip.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod http;
pub mod media;
pub mod subtitle;

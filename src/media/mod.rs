pub mod library;
pub mod mime;
pub mod paths;
pub mod scanner;

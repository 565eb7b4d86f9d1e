pub mod fs_service;
pub mod grouper;
pub mod loader;
pub mod mapper;
pub mod source;

pub mod auth;
pub mod init;
pub mod maintenance;
pub mod password;

pub mod clean;
pub mod deploy;
pub mod doctor;
pub mod init;
pub mod rollback;
pub mod status;
pub mod version;

pub mod audit_logs;
pub mod init;
pub mod patients;

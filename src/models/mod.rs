pub mod audit_log;
pub mod enums;
pub mod filters;
pub mod patient;

pub use audit_log::AuditLog;
pub use enums::{AuditAction, PatientStatus};
pub use filters::{PageRequest, PatientFilter, PatientSort, SortDirection, SortField};
pub use patient::{Address, AddressDraft, AddressPatch, Patient, PatientDraft, PatientPatch};

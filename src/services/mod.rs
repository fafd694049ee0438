pub mod data_product_service;
pub mod domain_service;
pub mod password;
pub mod policy_service;
pub mod role_service;
pub mod user_service;

pub use data_product_service::DataProductService;
pub use domain_service::DomainService;
pub use password::{hash_password, verify_password};
pub use policy_service::PolicyService;
pub use role_service::RoleService;
pub use user_service::UserService;

use crate::database::manager::DatabaseError;

/// Reject blank values for required text fields
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), DatabaseError> {
    if value.trim().is_empty() {
        return Err(DatabaseError::InvalidInput(format!("Field '{}' cannot be empty", field)));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), DatabaseError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DatabaseError::InvalidInput(format!("Invalid email address '{}'", email))),
    }
}

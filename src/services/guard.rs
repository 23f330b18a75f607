use crate::error::ServiceProgrammingError;

use super::model::Model;
use super::service::Service;

/// Runs `f` unless `service` is read-only.
///
/// # Errors
///
/// Returns [`ServiceProgrammingError::ReadOnly`] for a read-only service,
/// without calling `f`.
pub fn write_guard<M, T, F>(service: &Service<M>, f: F) -> Result<T, ServiceProgrammingError>
where
    M: Model,
    F: FnOnce(&Service<M>) -> T,
{
    if service.is_read_only() {
        return Err(ServiceProgrammingError::ReadOnly {
            service: service.to_string(),
        });
    }
    Ok(f(service))
}

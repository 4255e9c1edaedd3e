pub mod campaign;
pub mod compliance;
pub mod job;

/// Shared garde rule: a string field that must not be blank after trimming.
pub(crate) fn non_blank(value: &String, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be empty"));
    }
    Ok(())
}

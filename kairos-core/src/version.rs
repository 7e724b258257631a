use crate::error::EngineError;

/// Compare-and-increment contract for mutable entities.
///
/// A writer reads the entity, mutates its copy, and submits it with the
/// version it read. The store accepts the write only when the submitted
/// version still matches the stored one, then increments. Two concurrent
/// transitions on the same entity therefore detect the conflict instead of
/// silently overwriting each other.
pub trait Versioned {
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
}

/// Reject a write whose version no longer matches the stored entity.
pub fn check(submitted: u64, stored: u64) -> Result<(), EngineError> {
    if submitted != stored {
        return Err(EngineError::Conflict(format!(
            "version mismatch: submitted {submitted}, stored {stored}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_check() {
        assert!(check(3, 3).is_ok());
        assert!(matches!(check(2, 3), Err(EngineError::Conflict(_))));
    }
}

use casa_core::models::BytePayload;

/// Payload validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Image is empty (0 bytes)")]
    Empty,

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },
}

/// Gate every materialized payload must pass before it may be uploaded.
#[derive(Debug, Clone, Copy)]
pub struct PayloadValidator {
    max_bytes: u64,
}

impl PayloadValidator {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate a size in bytes
    pub fn validate_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::Empty);
        }

        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        Ok(())
    }

    pub fn validate(&self, payload: &BytePayload) -> Result<(), ValidationError> {
        self.validate_size(payload.len() as u64)
    }

    /// Reject a size the picker declared before any bytes are read.
    ///
    /// Only the ceiling is checked: pickers report 0 or nothing for sizes
    /// they do not know.
    pub fn check_declared_size(&self, declared: Option<u64>) -> Result<(), ValidationError> {
        match declared {
            Some(size) if size > self.max_bytes => Err(ValidationError::TooLarge {
                size,
                max: self.max_bytes,
            }),
            _ => Ok(()),
        }
    }
}

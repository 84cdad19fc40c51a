use crate::CompositeError;

/// Trait for validation:
/// 1. Input is deserialized with loose types (serde never fails on content)
/// 2. Input is converted to the domain type, accumulating all field errors
pub trait ValidateFrom: Sized {
    /// The type to deserialize from.
    type Input: serde::de::DeserializeOwned;

    /// Message returned when the body is missing, malformed or incomplete.
    const REJECTION: &'static str;

    fn validate_from(input: Self::Input) -> Result<Self, CompositeError>;
}

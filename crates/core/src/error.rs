//! Error types for fetchkit.

/// Result type alias for fetchkit operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for query translation and execution.
///
/// Every variant aborts the translate-or-execute call that raised it. Value
/// level type mismatches never surface here; they degrade to "no match".
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The query text is not well-formed XML.
    #[error("Malformed query document: {message}")]
    Format { message: String },
    /// The document is well-formed but structurally invalid.
    #[error("Invalid query document: {message}")]
    Validation { message: String },
    /// Unknown or ambiguous entity, attribute or alias.
    #[error("{message}")]
    Catalog { message: String },
    /// Operator is illegal for the resolved attribute type, or not implemented.
    #[error("{message}")]
    UnsupportedOperator { message: String },
    /// Attribute metadata category the engine cannot evaluate.
    #[error("Unsupported attribute type {type_name} for attribute {attribute}")]
    UnsupportedType { attribute: String, type_name: String },
    /// Wrong number of operands for an operator.
    #[error("Condition operator {operator} requires {expected} value(s), but {actual} were supplied")]
    ArgumentCount {
        operator: String,
        expected: String,
        actual: usize,
    },
    /// An operand has the right arity but an unusable value.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
    /// A feature was used without the configuration it depends on.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    /// An operand could not be converted to the shape the operator needs.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String },
}

impl Error {
    /// Creates a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Creates a catalog error.
    pub fn catalog(message: impl Into<String>) -> Self {
        Error::Catalog {
            message: message.into(),
        }
    }

    /// Creates an error for an attribute that is not part of an entity.
    pub fn unknown_attribute(entity: &str, attribute: &str) -> Self {
        Error::Catalog {
            message: format!("'{entity}' entity doesn't contain attribute with Name = '{attribute}'"),
        }
    }

    /// Creates an error for an entity unknown to both schema and metadata.
    pub fn unknown_entity(entity: &str) -> Self {
        Error::Catalog {
            message: format!("The entity with a name = '{entity}' was not found in the MetadataCache"),
        }
    }

    /// Creates an unsupported operator error.
    pub fn unsupported_operator(message: impl Into<String>) -> Self {
        Error::UnsupportedOperator {
            message: message.into(),
        }
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(attribute: impl Into<String>, type_name: impl Into<String>) -> Self {
        Error::UnsupportedType {
            attribute: attribute.into(),
            type_name: type_name.into(),
        }
    }

    /// Creates an argument count error.
    pub fn argument_count(operator: impl Into<String>, expected: impl Into<String>, actual: usize) -> Self {
        Error::ArgumentCount {
            operator: operator.into(),
            expected: expected.into(),
            actual,
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Creates a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Error::Deserialization {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_attribute("account", "foo");
        assert!(err.to_string().contains("foo"));
        assert!(err.to_string().contains("account"));

        let err = Error::argument_count("Between", "2", 1);
        assert!(err.to_string().contains("Between"));

        let err = Error::format("unexpected end of stream");
        assert!(err.to_string().contains("Malformed"));
    }

    #[test]
    fn test_error_constructors() {
        let err = Error::unsupported_type("activityparty", "PartyList");
        match err {
            Error::UnsupportedType { attribute, type_name } => {
                assert_eq!(attribute, "activityparty");
                assert_eq!(type_name, "PartyList");
            }
            _ => panic!("Wrong error type"),
        }
    }
}

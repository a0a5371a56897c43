use resq_coerce::CoerceError;
use resq_mapping::MappingError;
use resq_schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Schema binding error: {0}")]
    SchemaBinding(#[from] SchemaError),

    #[error("Type coercion error: {0}")]
    Coercion(#[from] CoerceError),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Nesting depth exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },
}

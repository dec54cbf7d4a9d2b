// Error conversion helpers and wrapping macro for Snafu-based errors
use crate::error::Error;

/// Convert different error types into our unified Error type.
pub trait IntoStowageError {
    fn into_error(self) -> Error;
}

impl IntoStowageError for Error {
    fn into_error(self) -> Error {
        self
    }
}

impl IntoStowageError for reqwest::Error {
    fn into_error(self) -> Error {
        self.into()
    }
}

impl IntoStowageError for std::io::Error {
    fn into_error(self) -> Error {
        self.into()
    }
}

/// Macro to wrap a Result-producing expression into a Snafu variant with `source: Box<Error>`.
/// Example:
/// wrap_err!(gateway.delete_file(id).await, DeleteFailed { target: id.to_string() })?
#[macro_export]
macro_rules! wrap_err {
    ($expr:expr, $variant:ident { $($field:ident : $value:expr),* $(,)? }) => {{
        $expr.map_err(|e| {
            let src: $crate::error::Error = $crate::storage::utils::error::IntoStowageError::into_error(e);
            $crate::error::Error::$variant { $($field: $value),*, source: Box::new(src) }
        })
    }};
}

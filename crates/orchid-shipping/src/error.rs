use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShippingError {
    #[error("unsupported carrier: {0}")]
    UnsupportedCarrier(String),

    #[error("provider integration not implemented for {0}")]
    NotImplemented(&'static str),

    #[error("{carrier} provider request failed: {message}")]
    ProviderFailed {
        carrier: &'static str,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

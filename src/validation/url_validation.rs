use url::Url;

use crate::error::ConfigError;

pub fn validate_http_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidUrl {
            name,
            reason: "url must not be empty".to_string(),
        });
    }
    let parsed = Url::parse(trimmed).map_err(|err| ConfigError::InvalidUrl {
        name,
        reason: err.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ConfigError::InvalidUrl {
            name,
            reason: format!("only http or https is allowed, got {scheme}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_http_url("X", "http://localhost:8000").is_ok());
        assert!(validate_http_url("X", " https://example.com/api ").is_ok());
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = validate_http_url("X", "ftp://example.com").unwrap_err();
        assert!(err.to_string().contains("ftp"));
        assert!(validate_http_url("X", "").is_err());
        assert!(validate_http_url("X", "not a url").is_err());
    }
}

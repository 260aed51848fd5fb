pub type SerdePathError = serde_path_to_error::Error<serde_json::Error>;

/// Parses JSON, reporting the path of the offending field on failure.
pub fn parse_json<T>(s: &str) -> Result<T, SerdePathError>
where
    T: serde::de::DeserializeOwned,
{
    serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(s))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Outer {
        inner: Inner,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Inner {
        decimals: u8,
    }

    #[test]
    fn test_error_reports_path() {
        let err = parse_json::<Outer>(r#"{"inner": {"decimals": "six"}}"#).unwrap_err();
        assert_eq!(err.path().to_string(), "inner.decimals");
    }
}

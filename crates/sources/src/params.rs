//! Open parameter parsing
//!
//! The open parameter is a URI: no scheme selects a local file, `http` and
//! `https` select a webhook listener. Scheme detection follows RFC 3986
//! (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`), so a bare path never
//! has a scheme while `ftp://...` or `c:\...` do.

use std::path::PathBuf;

use axum::http::Uri;

use crate::error::SourceError;

/// Address used when the URI has no host
const ANY_ADDRESS: &str = "0.0.0.0";

/// Parsed open parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenParams {
    /// Local file read line by line
    File(PathBuf),

    /// Webhook listener
    Webhook {
        /// `host:port` to bind
        address: String,
        /// Path served for POST requests
        path: String,
        /// Serve HTTPS
        tls: bool,
    },
}

impl OpenParams {
    /// Parse an open parameter string
    pub fn parse(params: &str) -> Result<Self, SourceError> {
        match scheme(params) {
            None => Ok(Self::File(PathBuf::from(params))),
            Some(s) if s.eq_ignore_ascii_case("http") => Self::webhook(params, false),
            Some(s) if s.eq_ignore_ascii_case("https") => Self::webhook(params, true),
            Some(s) => Err(SourceError::UnsupportedScheme(s.to_string())),
        }
    }

    fn webhook(params: &str, tls: bool) -> Result<Self, SourceError> {
        let uri: Uri = params
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| {
                SourceError::invalid_params(params, e.to_string())
            })?;

        let authority = uri
            .authority()
            .ok_or_else(|| SourceError::invalid_params(params, "missing host"))?;
        let port = authority
            .port_u16()
            .ok_or_else(|| SourceError::invalid_params(params, "missing port"))?;
        let host = match authority.host() {
            "" => ANY_ADDRESS,
            host => host,
        };

        let path = match uri.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        Ok(Self::Webhook {
            address: format!("{host}:{port}"),
            path,
            tls,
        })
    }

    /// Check if this parameter selects a network listener
    pub fn is_webhook(&self) -> bool {
        matches!(self, Self::Webhook { .. })
    }
}

/// Extract the URI scheme, if the string has one
fn scheme(params: &str) -> Option<&str> {
    let end = params.find(':')?;
    let candidate = &params[..end];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(candidate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_is_file() {
        assert_eq!(
            OpenParams::parse("/var/log/audit.log").unwrap(),
            OpenParams::File(PathBuf::from("/var/log/audit.log"))
        );
    }

    #[test]
    fn test_relative_path_is_file() {
        assert_eq!(
            OpenParams::parse("testdata/audit events.json").unwrap(),
            OpenParams::File(PathBuf::from("testdata/audit events.json"))
        );
    }

    #[test]
    fn test_path_with_colon_after_slash_is_file() {
        assert_eq!(
            OpenParams::parse("./logs/12:00.json").unwrap(),
            OpenParams::File(PathBuf::from("./logs/12:00.json"))
        );
    }

    #[test]
    fn test_http_webhook() {
        assert_eq!(
            OpenParams::parse("http://localhost:9765/k8s-audit").unwrap(),
            OpenParams::Webhook {
                address: "localhost:9765".into(),
                path: "/k8s-audit".into(),
                tls: false,
            }
        );
    }

    #[test]
    fn test_https_webhook() {
        let params = OpenParams::parse("https://127.0.0.1:443/audit").unwrap();
        assert_eq!(
            params,
            OpenParams::Webhook {
                address: "127.0.0.1:443".into(),
                path: "/audit".into(),
                tls: true,
            }
        );
        assert!(params.is_webhook());
    }

    #[test]
    fn test_webhook_without_path_serves_root() {
        let OpenParams::Webhook { path, .. } = OpenParams::parse("http://localhost:9765").unwrap()
        else {
            panic!("expected webhook");
        };
        assert_eq!(path, "/");
    }

    #[test]
    fn test_webhook_path_keeps_braces() {
        let OpenParams::Webhook { path, .. } =
            OpenParams::parse("http://127.0.0.1:9765/audit{x").unwrap()
        else {
            panic!("expected webhook");
        };
        assert_eq!(path, "/audit{x");
    }

    #[test]
    fn test_webhook_missing_port() {
        let err = OpenParams::parse("http://localhost/k8s-audit").unwrap_err();
        assert!(matches!(err, SourceError::InvalidParams { .. }));
        assert!(err.is_open_error());
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = OpenParams::parse("ftp://example.com/audit").unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedScheme(ref s) if s == "ftp"));
        assert_eq!(err.to_string(), r#"scheme "ftp" is not supported"#);
    }

    #[test]
    fn test_scheme_detection() {
        assert_eq!(scheme("http://x"), Some("http"));
        assert_eq!(scheme("svn+ssh://x"), Some("svn+ssh"));
        assert_eq!(scheme("/abs/path"), None);
        assert_eq!(scheme("1abc:def"), None);
        assert_eq!(scheme(":nothing"), None);
        assert_eq!(scheme("plain"), None);
    }
}

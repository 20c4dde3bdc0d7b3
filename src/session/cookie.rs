//! Session cookie transport settings and signing.

use axum::http::{header, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::time::Duration;

use crate::config::{Environment, SessionConfig};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => f.write_str("Strict"),
            SameSite::Lax => f.write_str("Lax"),
            SameSite::None => f.write_str("None"),
        }
    }
}

/// Verified session, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub id: String,
}

/// Cookie flags plus the signing key. Constant for the process lifetime.
#[derive(Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub max_age: Duration,
    pub rolling: bool,
    secret: Vec<u8>,
}

impl fmt::Debug for SessionCookieConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookieConfig")
            .field("name", &self.name)
            .field("http_only", &self.http_only)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .field("max_age", &self.max_age)
            .field("rolling", &self.rolling)
            .finish_non_exhaustive()
    }
}

impl SessionCookieConfig {
    /// Outside production an empty secret is replaced by a random one, so
    /// sessions do not survive a restart.
    pub fn from_config(config: &SessionConfig, environment: Environment) -> Self {
        let secret = if config.secret.is_empty() {
            tracing::warn!("SESSION_SECRET not set, using an ephemeral key");
            format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple()).into_bytes()
        } else {
            config.secret.clone().into_bytes()
        };

        Self {
            name: config.cookie_name.clone(),
            http_only: true,
            secure: environment.is_production(),
            same_site: SameSite::Strict,
            max_age: Duration::from_secs(config.max_age_secs),
            rolling: true,
            secret,
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }

    /// Cookie value for `id`: `<id>.<base64url(HMAC-SHA256(secret, id))>`.
    pub fn sign(&self, id: &str) -> String {
        let mut mac = self.mac();
        mac.update(id.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{id}.{signature}")
    }

    /// Session id when the signature checks out.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (id, signature) = value.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id.to_string())
    }

    /// Raw value of this cookie from the `Cookie` headers.
    pub fn read<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim())
    }

    pub fn session(&self, headers: &HeaderMap) -> Option<SessionContext> {
        self.read(headers)
            .and_then(|value| self.verify(value))
            .map(|id| SessionContext { id })
    }

    pub fn set_cookie(&self, value: &str) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}",
            self.name,
            value,
            self.max_age.as_secs()
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(&self.same_site.to_string());
        HeaderValue::from_str(&cookie).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: Environment) -> SessionCookieConfig {
        let session = SessionConfig {
            secret: "a-test-secret-that-is-long-enough!!".into(),
            ..SessionConfig::default()
        };
        SessionCookieConfig::from_config(&session, environment)
    }

    #[test]
    fn test_flags_follow_environment() {
        let dev = config(Environment::Development);
        assert!(dev.http_only);
        assert!(!dev.secure);
        assert_eq!(dev.same_site, SameSite::Strict);
        assert!(dev.rolling);

        let prod = config(Environment::Production);
        assert!(prod.secure);
        let cookie = prod.set_cookie("abc").unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("shield.sid=abc; Path=/; Max-Age=86400"));
        assert!(cookie.contains("; HttpOnly"));
        assert!(cookie.contains("; Secure"));
        assert!(cookie.ends_with("; SameSite=Strict"));
    }

    #[test]
    fn test_sign_and_verify() {
        let cookie = config(Environment::Test);
        let signed = cookie.sign("user-42");
        assert_eq!(cookie.verify(&signed).as_deref(), Some("user-42"));

        let tampered = signed.replacen("user-42", "user-43", 1);
        assert_eq!(cookie.verify(&tampered), None);
        assert_eq!(cookie.verify("user-42"), None);
        assert_eq!(cookie.verify(".abc"), None);
    }

    #[test]
    fn test_other_secret_does_not_verify() {
        let signed = config(Environment::Test).sign("user-42");
        let other = SessionCookieConfig::from_config(&SessionConfig::default(), Environment::Test);
        assert_eq!(other.verify(&signed), None);
    }

    #[test]
    fn test_read_from_cookie_header() {
        let cookie = config(Environment::Test);
        let mut headers = HeaderMap::new();
        let value = format!("theme=dark; shield.sid={}; lang=en", cookie.sign("s1"));
        headers.insert(header::COOKIE, HeaderValue::from_str(&value).unwrap());
        assert_eq!(cookie.session(&headers), Some(SessionContext { id: "s1".into() }));
    }
}

//! Captcha token verification for the public agent onboarding form.
//!
//! Supports Google reCAPTCHA v3 and Cloudflare Turnstile; the provider is
//! selected via configuration. When the provider is `disabled` every token
//! passes, which is the development and test default.

use serde::Deserialize;

/// reCAPTCHA server-side verification endpoint.
const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Turnstile server-side verification endpoint.
const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Default minimum reCAPTCHA v3 score.
const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

/// Which captcha backend to verify tokens against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptchaProvider {
    Recaptcha,
    Turnstile,
    Disabled,
}

/// Captcha configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    pub provider: CaptchaProvider,
    pub secret: String,
    /// Minimum acceptable reCAPTCHA v3 score (ignored by Turnstile).
    pub score_threshold: f64,
}

impl CaptchaConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default    |
    /// |---------------------------|------------|
    /// | `CAPTCHA_PROVIDER`        | `disabled` |
    /// | `CAPTCHA_SECRET`          | empty      |
    /// | `CAPTCHA_SCORE_THRESHOLD` | `0.5`      |
    ///
    /// # Panics
    ///
    /// Panics if `CAPTCHA_PROVIDER` is set to an unknown value, or a real
    /// provider is selected without a secret.
    pub fn from_env() -> Self {
        let provider = match std::env::var("CAPTCHA_PROVIDER")
            .unwrap_or_else(|_| "disabled".into())
            .to_lowercase()
            .as_str()
        {
            "recaptcha" => CaptchaProvider::Recaptcha,
            "turnstile" => CaptchaProvider::Turnstile,
            "disabled" => CaptchaProvider::Disabled,
            other => panic!("Unknown CAPTCHA_PROVIDER: {other}"),
        };

        let secret = std::env::var("CAPTCHA_SECRET").unwrap_or_default();
        if provider != CaptchaProvider::Disabled {
            assert!(
                !secret.is_empty(),
                "CAPTCHA_SECRET must be set when CAPTCHA_PROVIDER is enabled"
            );
        }

        let score_threshold: f64 = std::env::var("CAPTCHA_SCORE_THRESHOLD")
            .unwrap_or_else(|_| DEFAULT_SCORE_THRESHOLD.to_string())
            .parse()
            .expect("CAPTCHA_SCORE_THRESHOLD must be a valid f64");

        Self {
            provider,
            secret,
            score_threshold,
        }
    }
}

/// Captcha verification failure modes.
#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    /// The provider rejected the token (bot, expired, or wrong site key).
    #[error("Captcha verification failed: {0}")]
    Rejected(String),

    /// The provider could not be reached; the client should retry.
    #[error("Captcha provider unreachable: {0}")]
    Unavailable(String),
}

/// Response shape shared by the reCAPTCHA and Turnstile verify endpoints.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifies captcha tokens against the configured provider.
pub struct CaptchaVerifier {
    client: reqwest::Client,
    config: CaptchaConfig,
}

impl CaptchaVerifier {
    pub fn new(config: CaptchaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Verify a client-supplied token. Passes unconditionally when the
    /// provider is disabled.
    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), CaptchaError> {
        let url = match self.config.provider {
            CaptchaProvider::Disabled => return Ok(()),
            CaptchaProvider::Recaptcha => RECAPTCHA_VERIFY_URL,
            CaptchaProvider::Turnstile => TURNSTILE_VERIFY_URL,
        };

        if token.is_empty() {
            return Err(CaptchaError::Rejected("Missing captcha token".into()));
        }

        let mut params = vec![
            ("secret", self.config.secret.as_str()),
            ("response", token),
        ];
        if let Some(ip) = remote_ip {
            params.push(("remoteip", ip));
        }

        let response = self
            .client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|e| CaptchaError::Unavailable(e.to_string()))?;

        let verdict: VerifyResponse = response
            .json()
            .await
            .map_err(|e| CaptchaError::Unavailable(e.to_string()))?;

        if !verdict.success {
            return Err(CaptchaError::Rejected(
                verdict.error_codes.join(", "),
            ));
        }

        // reCAPTCHA v3 also returns a bot-likelihood score.
        if self.config.provider == CaptchaProvider::Recaptcha {
            if let Some(score) = verdict.score {
                if score < self.config.score_threshold {
                    return Err(CaptchaError::Rejected(format!(
                        "Score {score} below threshold"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_provider_accepts_anything() {
        let verifier = CaptchaVerifier::new(CaptchaConfig {
            provider: CaptchaProvider::Disabled,
            secret: String::new(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        });
        assert!(verifier.verify("", None).await.is_ok());
        assert!(verifier.verify("anything", None).await.is_ok());
    }

    #[tokio::test]
    async fn enabled_provider_rejects_empty_token() {
        let verifier = CaptchaVerifier::new(CaptchaConfig {
            provider: CaptchaProvider::Recaptcha,
            secret: "secret".to_string(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        });
        let result = verifier.verify("", None).await;
        assert!(matches!(result, Err(CaptchaError::Rejected(_))));
    }
}

//! Singleton site settings.
//!
//! Each settings table holds at most one logical row; create and update
//! collapse into a single upsert. Gateway-style settings (SMS, payment) carry
//! mutually exclusive credential sets: the field-to-gateway ownership is an
//! explicit map here, so saving with one gateway selected clears every other
//! gateway's credentials both in the row and in the external config mirror.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{Error, Result};

/// Placeholder returned instead of any stored secret value.
pub const SECRET_MASK: &str = "********";

fn mask(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|_| SECRET_MASK.to_string())
}

// ---------------------------------------------------------------------------
// General settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub id: i64,
    pub site_name: String,
    pub site_email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub logo: Option<String>,
    pub favicon: Option<String>,
    pub footer_text: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GeneralSettingsInput {
    #[validate(length(min = 1, max = 250))]
    pub site_name: String,
    #[validate(email)]
    pub site_email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 500))]
    pub logo: Option<String>,
    #[validate(length(max = 500))]
    pub favicon: Option<String>,
    #[validate(length(max = 1000))]
    pub footer_text: Option<String>,
    pub status: Option<bool>,
}

// ---------------------------------------------------------------------------
// Mail settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    pub id: i64,
    pub mailer: String,
    pub host: Option<String>,
    pub port: Option<i64>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub encryption: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MailSettings {
    /// Key/value pairs mirrored into the external config store for the mail
    /// collaborator. Unset fields clear their key.
    pub fn mirror_pairs(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("MAIL_MAILER", Some(self.mailer.clone())),
            ("MAIL_HOST", self.host.clone()),
            ("MAIL_PORT", self.port.map(|p| p.to_string())),
            ("MAIL_USERNAME", self.username.clone()),
            ("MAIL_PASSWORD", self.password.clone()),
            ("MAIL_ENCRYPTION", self.encryption.clone()),
            ("MAIL_FROM_ADDRESS", self.from_address.clone()),
            ("MAIL_FROM_NAME", self.from_name.clone()),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MailSettingsInput {
    #[validate(length(min = 1, max = 64))]
    pub mailer: String,
    #[validate(length(max = 250))]
    pub host: Option<String>,
    #[validate(range(min = 1, max = 65535))]
    pub port: Option<i64>,
    #[validate(length(max = 250))]
    pub username: Option<String>,
    #[validate(length(max = 250))]
    pub password: Option<String>,
    #[validate(length(max = 16))]
    pub encryption: Option<String>,
    #[validate(email)]
    pub from_address: Option<String>,
    #[validate(length(max = 250))]
    pub from_name: Option<String>,
    pub status: Option<bool>,
}

/// Mail settings as returned to clients: the password is never echoed back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettingsView {
    pub id: i64,
    pub mailer: String,
    pub host: Option<String>,
    pub port: Option<i64>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub encryption: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub status: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&MailSettings> for MailSettingsView {
    fn from(s: &MailSettings) -> Self {
        Self {
            id: s.id,
            mailer: s.mailer.clone(),
            host: s.host.clone(),
            port: s.port,
            username: s.username.clone(),
            password: mask(&s.password),
            encryption: s.encryption.clone(),
            from_address: s.from_address.clone(),
            from_name: s.from_name.clone(),
            status: s.status,
            updated_at: s.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// SMS settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsGateway {
    Twilio,
    Vonage,
}

impl SmsGateway {
    pub const ALL: [SmsGateway; 2] = [SmsGateway::Twilio, SmsGateway::Vonage];

    pub fn as_str(&self) -> &'static str {
        match self {
            SmsGateway::Twilio => "twilio",
            SmsGateway::Vonage => "vonage",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "twilio" => Ok(SmsGateway::Twilio),
            "vonage" => Ok(SmsGateway::Vonage),
            other => Err(Error::validation_field(
                format!("Unknown SMS gateway '{}'", other),
                "sms_gateway",
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsSettings {
    pub id: i64,
    pub sms_gateway: SmsGateway,
    pub twilio_sid: Option<String>,
    pub twilio_token: Option<String>,
    pub twilio_from: Option<String>,
    pub vonage_key: Option<String>,
    pub vonage_secret: Option<String>,
    pub vonage_from: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SmsSettings {
    /// Mirror pairs for the SMS collaborator. Every gateway's keys appear;
    /// non-selected gateways mirror as cleared so stale secrets never remain
    /// readable in the external store.
    pub fn mirror_pairs(&self) -> Vec<(&'static str, Option<String>)> {
        let selected = self.sms_gateway;
        let mut pairs = vec![("SMS_GATEWAY", Some(selected.as_str().to_string()))];
        for gateway in SmsGateway::ALL {
            let live = gateway == selected;
            match gateway {
                SmsGateway::Twilio => {
                    pairs.push(("TWILIO_SID", live.then(|| self.twilio_sid.clone()).flatten()));
                    pairs.push(("TWILIO_TOKEN", live.then(|| self.twilio_token.clone()).flatten()));
                    pairs.push(("TWILIO_FROM", live.then(|| self.twilio_from.clone()).flatten()));
                }
                SmsGateway::Vonage => {
                    pairs.push(("VONAGE_KEY", live.then(|| self.vonage_key.clone()).flatten()));
                    pairs
                        .push(("VONAGE_SECRET", live.then(|| self.vonage_secret.clone()).flatten()));
                    pairs.push(("VONAGE_FROM", live.then(|| self.vonage_from.clone()).flatten()));
                }
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SmsSettingsInput {
    pub sms_gateway: SmsGateway,
    #[validate(length(max = 250))]
    pub twilio_sid: Option<String>,
    #[validate(length(max = 250))]
    pub twilio_token: Option<String>,
    #[validate(length(max = 32))]
    pub twilio_from: Option<String>,
    #[validate(length(max = 250))]
    pub vonage_key: Option<String>,
    #[validate(length(max = 250))]
    pub vonage_secret: Option<String>,
    #[validate(length(max = 32))]
    pub vonage_from: Option<String>,
    pub status: Option<bool>,
}

impl SmsSettingsInput {
    /// Null out every credential field belonging to a non-selected gateway.
    /// The ownership map is explicit per gateway, never name-prefix based.
    pub fn cleared_for_gateway(mut self) -> Self {
        for gateway in SmsGateway::ALL {
            if gateway == self.sms_gateway {
                continue;
            }
            match gateway {
                SmsGateway::Twilio => {
                    self.twilio_sid = None;
                    self.twilio_token = None;
                    self.twilio_from = None;
                }
                SmsGateway::Vonage => {
                    self.vonage_key = None;
                    self.vonage_secret = None;
                    self.vonage_from = None;
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsSettingsView {
    pub id: i64,
    pub sms_gateway: SmsGateway,
    pub twilio_sid: Option<String>,
    pub twilio_token: Option<String>,
    pub twilio_from: Option<String>,
    pub vonage_key: Option<String>,
    pub vonage_secret: Option<String>,
    pub vonage_from: Option<String>,
    pub status: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&SmsSettings> for SmsSettingsView {
    fn from(s: &SmsSettings) -> Self {
        Self {
            id: s.id,
            sms_gateway: s.sms_gateway,
            twilio_sid: s.twilio_sid.clone(),
            twilio_token: mask(&s.twilio_token),
            twilio_from: s.twilio_from.clone(),
            vonage_key: s.vonage_key.clone(),
            vonage_secret: mask(&s.vonage_secret),
            vonage_from: s.vonage_from.clone(),
            status: s.status,
            updated_at: s.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Payment settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentGateway {
    Stripe,
    Paypal,
    Razorpay,
}

impl PaymentGateway {
    pub const ALL: [PaymentGateway; 3] =
        [PaymentGateway::Stripe, PaymentGateway::Paypal, PaymentGateway::Razorpay];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentGateway::Stripe => "stripe",
            PaymentGateway::Paypal => "paypal",
            PaymentGateway::Razorpay => "razorpay",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "stripe" => Ok(PaymentGateway::Stripe),
            "paypal" => Ok(PaymentGateway::Paypal),
            "razorpay" => Ok(PaymentGateway::Razorpay),
            other => Err(Error::validation_field(
                format!("Unknown payment gateway '{}'", other),
                "payment_gateway",
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettings {
    pub id: i64,
    pub payment_gateway: PaymentGateway,
    pub stripe_key: Option<String>,
    pub stripe_secret: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub paypal_client_id: Option<String>,
    pub paypal_client_secret: Option<String>,
    pub paypal_mode: Option<String>,
    pub razorpay_key: Option<String>,
    pub razorpay_secret: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentSettings {
    pub fn mirror_pairs(&self) -> Vec<(&'static str, Option<String>)> {
        let selected = self.payment_gateway;
        let mut pairs = vec![("PAYMENT_GATEWAY", Some(selected.as_str().to_string()))];
        for gateway in PaymentGateway::ALL {
            let live = gateway == selected;
            match gateway {
                PaymentGateway::Stripe => {
                    pairs.push(("STRIPE_KEY", live.then(|| self.stripe_key.clone()).flatten()));
                    pairs
                        .push(("STRIPE_SECRET", live.then(|| self.stripe_secret.clone()).flatten()));
                    pairs.push((
                        "STRIPE_WEBHOOK_SECRET",
                        live.then(|| self.stripe_webhook_secret.clone()).flatten(),
                    ));
                }
                PaymentGateway::Paypal => {
                    pairs.push((
                        "PAYPAL_CLIENT_ID",
                        live.then(|| self.paypal_client_id.clone()).flatten(),
                    ));
                    pairs.push((
                        "PAYPAL_CLIENT_SECRET",
                        live.then(|| self.paypal_client_secret.clone()).flatten(),
                    ));
                    pairs.push(("PAYPAL_MODE", live.then(|| self.paypal_mode.clone()).flatten()));
                }
                PaymentGateway::Razorpay => {
                    pairs.push(("RAZORPAY_KEY", live.then(|| self.razorpay_key.clone()).flatten()));
                    pairs.push((
                        "RAZORPAY_SECRET",
                        live.then(|| self.razorpay_secret.clone()).flatten(),
                    ));
                }
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentSettingsInput {
    pub payment_gateway: PaymentGateway,
    #[validate(length(max = 250))]
    pub stripe_key: Option<String>,
    #[validate(length(max = 250))]
    pub stripe_secret: Option<String>,
    #[validate(length(max = 250))]
    pub stripe_webhook_secret: Option<String>,
    #[validate(length(max = 250))]
    pub paypal_client_id: Option<String>,
    #[validate(length(max = 250))]
    pub paypal_client_secret: Option<String>,
    #[validate(length(max = 16))]
    pub paypal_mode: Option<String>,
    #[validate(length(max = 250))]
    pub razorpay_key: Option<String>,
    #[validate(length(max = 250))]
    pub razorpay_secret: Option<String>,
    pub status: Option<bool>,
}

impl PaymentSettingsInput {
    pub fn cleared_for_gateway(mut self) -> Self {
        for gateway in PaymentGateway::ALL {
            if gateway == self.payment_gateway {
                continue;
            }
            match gateway {
                PaymentGateway::Stripe => {
                    self.stripe_key = None;
                    self.stripe_secret = None;
                    self.stripe_webhook_secret = None;
                }
                PaymentGateway::Paypal => {
                    self.paypal_client_id = None;
                    self.paypal_client_secret = None;
                    self.paypal_mode = None;
                }
                PaymentGateway::Razorpay => {
                    self.razorpay_key = None;
                    self.razorpay_secret = None;
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettingsView {
    pub id: i64,
    pub payment_gateway: PaymentGateway,
    pub stripe_key: Option<String>,
    pub stripe_secret: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub paypal_client_id: Option<String>,
    pub paypal_client_secret: Option<String>,
    pub paypal_mode: Option<String>,
    pub razorpay_key: Option<String>,
    pub razorpay_secret: Option<String>,
    pub status: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&PaymentSettings> for PaymentSettingsView {
    fn from(s: &PaymentSettings) -> Self {
        Self {
            id: s.id,
            payment_gateway: s.payment_gateway,
            stripe_key: s.stripe_key.clone(),
            stripe_secret: mask(&s.stripe_secret),
            stripe_webhook_secret: mask(&s.stripe_webhook_secret),
            paypal_client_id: s.paypal_client_id.clone(),
            paypal_client_secret: mask(&s.paypal_client_secret),
            paypal_mode: s.paypal_mode.clone(),
            razorpay_key: s.razorpay_key.clone(),
            razorpay_secret: mask(&s.razorpay_secret),
            status: s.status,
            updated_at: s.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Content-block singletons (no external sync, no secrets)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopbarSettings {
    pub id: i64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notice: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TopbarSettingsInput {
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 500))]
    pub notice: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSettings {
    pub id: i64,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub youtube: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SocialSettingsInput {
    #[validate(url)]
    pub facebook: Option<String>,
    #[validate(url)]
    pub twitter: Option<String>,
    #[validate(url)]
    pub instagram: Option<String>,
    #[validate(url)]
    pub linkedin: Option<String>,
    #[validate(url)]
    pub youtube: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutUs {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub video_url: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AboutUsInput {
    #[validate(length(max = 250))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToAction {
    pub id: i64,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub button_text: Option<String>,
    pub button_link: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CallToActionInput {
    #[validate(length(max = 250))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub subtitle: Option<String>,
    #[validate(length(max = 64))]
    pub button_text: Option<String>,
    #[validate(length(max = 500))]
    pub button_link: Option<String>,
    pub status: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sms_settings(gateway: SmsGateway) -> SmsSettings {
        SmsSettings {
            id: 1,
            sms_gateway: gateway,
            twilio_sid: Some("sid".into()),
            twilio_token: Some("token".into()),
            twilio_from: Some("+1555".into()),
            vonage_key: Some("key".into()),
            vonage_secret: Some("secret".into()),
            vonage_from: Some("CAMPANILE".into()),
            status: true,
            created_by: None,
            created_by_name: None,
            updated_by: None,
            updated_by_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sms_input_clearing_keeps_only_selected_gateway() {
        let input = SmsSettingsInput {
            sms_gateway: SmsGateway::Twilio,
            twilio_sid: Some("sid".into()),
            twilio_token: Some("token".into()),
            twilio_from: Some("+1555".into()),
            vonage_key: Some("key".into()),
            vonage_secret: Some("secret".into()),
            vonage_from: Some("CAMPANILE".into()),
            status: None,
        }
        .cleared_for_gateway();

        assert_eq!(input.twilio_sid.as_deref(), Some("sid"));
        assert!(input.vonage_key.is_none());
        assert!(input.vonage_secret.is_none());
        assert!(input.vonage_from.is_none());
    }

    #[test]
    fn sms_mirror_clears_unselected_gateway_keys() {
        let pairs = sms_settings(SmsGateway::Vonage).mirror_pairs();
        let get = |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone());

        assert_eq!(get("SMS_GATEWAY").unwrap().as_deref(), Some("vonage"));
        assert_eq!(get("VONAGE_KEY").unwrap().as_deref(), Some("key"));
        assert_eq!(get("TWILIO_SID").unwrap(), None);
        assert_eq!(get("TWILIO_TOKEN").unwrap(), None);
    }

    #[test]
    fn payment_input_clearing() {
        let input = PaymentSettingsInput {
            payment_gateway: PaymentGateway::Stripe,
            stripe_key: Some("pk".into()),
            stripe_secret: Some("sk".into()),
            stripe_webhook_secret: Some("whsec".into()),
            paypal_client_id: Some("cid".into()),
            paypal_client_secret: Some("cs".into()),
            paypal_mode: Some("sandbox".into()),
            razorpay_key: Some("rk".into()),
            razorpay_secret: Some("rs".into()),
            status: None,
        }
        .cleared_for_gateway();

        assert_eq!(input.stripe_key.as_deref(), Some("pk"));
        assert!(input.paypal_client_id.is_none());
        assert!(input.paypal_client_secret.is_none());
        assert!(input.paypal_mode.is_none());
        assert!(input.razorpay_key.is_none());
        assert!(input.razorpay_secret.is_none());
    }

    #[test]
    fn secret_masking_preserves_null() {
        let mut settings = sms_settings(SmsGateway::Twilio);
        settings.vonage_secret = None;
        let view = SmsSettingsView::from(&settings);
        assert_eq!(view.twilio_token.as_deref(), Some(SECRET_MASK));
        assert!(view.vonage_secret.is_none());
        assert_eq!(view.twilio_sid.as_deref(), Some("sid"));
    }

    #[test]
    fn gateway_parse_round_trip() {
        for gateway in PaymentGateway::ALL {
            assert_eq!(PaymentGateway::parse(gateway.as_str()).unwrap(), gateway);
        }
        assert!(PaymentGateway::parse("braintree").is_err());
        assert!(SmsGateway::parse("smoke-signals").is_err());
    }
}

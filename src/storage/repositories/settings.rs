//! Singleton settings repository.
//!
//! Every settings table holds at most one logical row; `save_*` is an upsert
//! that keeps the original `created_by` stamp and always refreshes the
//! `updated_by` stamp. Gateway inputs are cleared for the selected gateway
//! before they touch the database, so credentials for a deselected gateway
//! never survive a save.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

use crate::domain::settings::{
    AboutUs, AboutUsInput, CallToAction, CallToActionInput, GeneralSettings, GeneralSettingsInput,
    MailSettings, MailSettingsInput, PaymentGateway, PaymentSettings, PaymentSettingsInput,
    SmsGateway, SmsSettings, SmsSettingsInput, SocialSettings, SocialSettingsInput,
    TopbarSettings, TopbarSettingsInput,
};
use crate::domain::{Actor, AuditStamp};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

use super::map_write_err;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: DbPool,
}

#[derive(Debug, Clone, FromRow)]
struct AuditTail {
    created_by: Option<i64>,
    created_by_name: Option<String>,
    updated_by: Option<i64>,
    updated_by_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SettingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn singleton_id(&self, table: &'static str) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT id FROM {} WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
            table
        );
        sqlx::query_scalar(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, format!("Failed to resolve {} row", table)))
    }

    // -- General ------------------------------------------------------------

    #[instrument(skip(self), name = "db_get_general_settings")]
    pub async fn get_general(&self) -> Result<Option<GeneralSettings>> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            site_name: String,
            site_email: Option<String>,
            phone: Option<String>,
            address: Option<String>,
            logo: Option<String>,
            favicon: Option<String>,
            footer_text: Option<String>,
            status: bool,
            #[sqlx(flatten)]
            tail: AuditTail,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT * FROM general_settings WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch general settings"))?;

        Ok(row.map(|r| GeneralSettings {
            id: r.id,
            site_name: r.site_name,
            site_email: r.site_email,
            phone: r.phone,
            address: r.address,
            logo: r.logo,
            favicon: r.favicon,
            footer_text: r.footer_text,
            status: r.status,
            created_by: r.tail.created_by,
            created_by_name: r.tail.created_by_name,
            updated_by: r.tail.updated_by,
            updated_by_name: r.tail.updated_by_name,
            created_at: r.tail.created_at,
            updated_at: r.tail.updated_at,
        }))
    }

    #[instrument(skip(self, input, actor), name = "db_save_general_settings")]
    pub async fn save_general(
        &self,
        input: GeneralSettingsInput,
        actor: Option<&Actor>,
    ) -> Result<GeneralSettings> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        match self.singleton_id("general_settings").await? {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE general_settings
                    SET site_name = ?, site_email = ?, phone = ?, address = ?, logo = ?,
                        favicon = ?, footer_text = ?, status = ?,
                        updated_by = COALESCE(?, updated_by),
                        updated_by_name = COALESCE(?, updated_by_name),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.site_name)
                .bind(&input.site_email)
                .bind(&input.phone)
                .bind(&input.address)
                .bind(&input.logo)
                .bind(&input.favicon)
                .bind(&input.footer_text)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "General settings", "Failed to update general settings"))?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO general_settings (site_name, site_email, phone, address, logo,
                        favicon, footer_text, status,
                        created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&input.site_name)
                .bind(&input.site_email)
                .bind(&input.phone)
                .bind(&input.address)
                .bind(&input.logo)
                .bind(&input.favicon)
                .bind(&input.footer_text)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "General settings", "Failed to create general settings"))?;
            }
        }

        self.get_general()
            .await?
            .ok_or_else(|| Error::internal("General settings not found after save"))
    }

    // -- Mail ---------------------------------------------------------------

    #[instrument(skip(self), name = "db_get_mail_settings")]
    pub async fn get_mail(&self) -> Result<Option<MailSettings>> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            mailer: String,
            host: Option<String>,
            port: Option<i64>,
            username: Option<String>,
            password: Option<String>,
            encryption: Option<String>,
            from_address: Option<String>,
            from_name: Option<String>,
            status: bool,
            #[sqlx(flatten)]
            tail: AuditTail,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT * FROM mail_settings WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch mail settings"))?;

        Ok(row.map(|r| MailSettings {
            id: r.id,
            mailer: r.mailer,
            host: r.host,
            port: r.port,
            username: r.username,
            password: r.password,
            encryption: r.encryption,
            from_address: r.from_address,
            from_name: r.from_name,
            status: r.status,
            created_by: r.tail.created_by,
            created_by_name: r.tail.created_by_name,
            updated_by: r.tail.updated_by,
            updated_by_name: r.tail.updated_by_name,
            created_at: r.tail.created_at,
            updated_at: r.tail.updated_at,
        }))
    }

    #[instrument(skip(self, input, actor), name = "db_save_mail_settings")]
    pub async fn save_mail(
        &self,
        input: MailSettingsInput,
        actor: Option<&Actor>,
    ) -> Result<MailSettings> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        match self.singleton_id("mail_settings").await? {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE mail_settings
                    SET mailer = ?, host = ?, port = ?, username = ?, password = ?,
                        encryption = ?, from_address = ?, from_name = ?, status = ?,
                        updated_by = COALESCE(?, updated_by),
                        updated_by_name = COALESCE(?, updated_by_name),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.mailer)
                .bind(&input.host)
                .bind(input.port)
                .bind(&input.username)
                .bind(&input.password)
                .bind(&input.encryption)
                .bind(&input.from_address)
                .bind(&input.from_name)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Mail settings", "Failed to update mail settings"))?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO mail_settings (mailer, host, port, username, password,
                        encryption, from_address, from_name, status,
                        created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&input.mailer)
                .bind(&input.host)
                .bind(input.port)
                .bind(&input.username)
                .bind(&input.password)
                .bind(&input.encryption)
                .bind(&input.from_address)
                .bind(&input.from_name)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Mail settings", "Failed to create mail settings"))?;
            }
        }

        self.get_mail().await?.ok_or_else(|| Error::internal("Mail settings not found after save"))
    }

    // -- SMS ----------------------------------------------------------------

    #[instrument(skip(self), name = "db_get_sms_settings")]
    pub async fn get_sms(&self) -> Result<Option<SmsSettings>> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            sms_gateway: String,
            twilio_sid: Option<String>,
            twilio_token: Option<String>,
            twilio_from: Option<String>,
            vonage_key: Option<String>,
            vonage_secret: Option<String>,
            vonage_from: Option<String>,
            status: bool,
            #[sqlx(flatten)]
            tail: AuditTail,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT * FROM sms_settings WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch SMS settings"))?;

        row.map(|r| {
            Ok(SmsSettings {
                id: r.id,
                sms_gateway: SmsGateway::parse(&r.sms_gateway)?,
                twilio_sid: r.twilio_sid,
                twilio_token: r.twilio_token,
                twilio_from: r.twilio_from,
                vonage_key: r.vonage_key,
                vonage_secret: r.vonage_secret,
                vonage_from: r.vonage_from,
                status: r.status,
                created_by: r.tail.created_by,
                created_by_name: r.tail.created_by_name,
                updated_by: r.tail.updated_by,
                updated_by_name: r.tail.updated_by_name,
                created_at: r.tail.created_at,
                updated_at: r.tail.updated_at,
            })
        })
        .transpose()
    }

    /// Save SMS settings. Credentials for every non-selected gateway are
    /// nulled in the stored row.
    #[instrument(skip(self, input, actor), fields(gateway = input.sms_gateway.as_str()), name = "db_save_sms_settings")]
    pub async fn save_sms(
        &self,
        input: SmsSettingsInput,
        actor: Option<&Actor>,
    ) -> Result<SmsSettings> {
        let input = input.cleared_for_gateway();
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        match self.singleton_id("sms_settings").await? {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE sms_settings
                    SET sms_gateway = ?, twilio_sid = ?, twilio_token = ?, twilio_from = ?,
                        vonage_key = ?, vonage_secret = ?, vonage_from = ?, status = ?,
                        updated_by = COALESCE(?, updated_by),
                        updated_by_name = COALESCE(?, updated_by_name),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(input.sms_gateway.as_str())
                .bind(&input.twilio_sid)
                .bind(&input.twilio_token)
                .bind(&input.twilio_from)
                .bind(&input.vonage_key)
                .bind(&input.vonage_secret)
                .bind(&input.vonage_from)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "SMS settings", "Failed to update SMS settings"))?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO sms_settings (sms_gateway, twilio_sid, twilio_token, twilio_from,
                        vonage_key, vonage_secret, vonage_from, status,
                        created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(input.sms_gateway.as_str())
                .bind(&input.twilio_sid)
                .bind(&input.twilio_token)
                .bind(&input.twilio_from)
                .bind(&input.vonage_key)
                .bind(&input.vonage_secret)
                .bind(&input.vonage_from)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "SMS settings", "Failed to create SMS settings"))?;
            }
        }

        self.get_sms().await?.ok_or_else(|| Error::internal("SMS settings not found after save"))
    }

    // -- Payment ------------------------------------------------------------

    #[instrument(skip(self), name = "db_get_payment_settings")]
    pub async fn get_payment(&self) -> Result<Option<PaymentSettings>> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            payment_gateway: String,
            stripe_key: Option<String>,
            stripe_secret: Option<String>,
            stripe_webhook_secret: Option<String>,
            paypal_client_id: Option<String>,
            paypal_client_secret: Option<String>,
            paypal_mode: Option<String>,
            razorpay_key: Option<String>,
            razorpay_secret: Option<String>,
            status: bool,
            #[sqlx(flatten)]
            tail: AuditTail,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT * FROM payment_settings WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch payment settings"))?;

        row.map(|r| {
            Ok(PaymentSettings {
                id: r.id,
                payment_gateway: PaymentGateway::parse(&r.payment_gateway)?,
                stripe_key: r.stripe_key,
                stripe_secret: r.stripe_secret,
                stripe_webhook_secret: r.stripe_webhook_secret,
                paypal_client_id: r.paypal_client_id,
                paypal_client_secret: r.paypal_client_secret,
                paypal_mode: r.paypal_mode,
                razorpay_key: r.razorpay_key,
                razorpay_secret: r.razorpay_secret,
                status: r.status,
                created_by: r.tail.created_by,
                created_by_name: r.tail.created_by_name,
                updated_by: r.tail.updated_by,
                updated_by_name: r.tail.updated_by_name,
                created_at: r.tail.created_at,
                updated_at: r.tail.updated_at,
            })
        })
        .transpose()
    }

    #[instrument(skip(self, input, actor), fields(gateway = input.payment_gateway.as_str()), name = "db_save_payment_settings")]
    pub async fn save_payment(
        &self,
        input: PaymentSettingsInput,
        actor: Option<&Actor>,
    ) -> Result<PaymentSettings> {
        let input = input.cleared_for_gateway();
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        match self.singleton_id("payment_settings").await? {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE payment_settings
                    SET payment_gateway = ?, stripe_key = ?, stripe_secret = ?,
                        stripe_webhook_secret = ?, paypal_client_id = ?, paypal_client_secret = ?,
                        paypal_mode = ?, razorpay_key = ?, razorpay_secret = ?, status = ?,
                        updated_by = COALESCE(?, updated_by),
                        updated_by_name = COALESCE(?, updated_by_name),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(input.payment_gateway.as_str())
                .bind(&input.stripe_key)
                .bind(&input.stripe_secret)
                .bind(&input.stripe_webhook_secret)
                .bind(&input.paypal_client_id)
                .bind(&input.paypal_client_secret)
                .bind(&input.paypal_mode)
                .bind(&input.razorpay_key)
                .bind(&input.razorpay_secret)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Payment settings", "Failed to update payment settings"))?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO payment_settings (payment_gateway, stripe_key, stripe_secret,
                        stripe_webhook_secret, paypal_client_id, paypal_client_secret, paypal_mode,
                        razorpay_key, razorpay_secret, status,
                        created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(input.payment_gateway.as_str())
                .bind(&input.stripe_key)
                .bind(&input.stripe_secret)
                .bind(&input.stripe_webhook_secret)
                .bind(&input.paypal_client_id)
                .bind(&input.paypal_client_secret)
                .bind(&input.paypal_mode)
                .bind(&input.razorpay_key)
                .bind(&input.razorpay_secret)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Payment settings", "Failed to create payment settings"))?;
            }
        }

        self.get_payment()
            .await?
            .ok_or_else(|| Error::internal("Payment settings not found after save"))
    }

    // -- Topbar -------------------------------------------------------------

    #[instrument(skip(self), name = "db_get_topbar_settings")]
    pub async fn get_topbar(&self) -> Result<Option<TopbarSettings>> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            phone: Option<String>,
            email: Option<String>,
            address: Option<String>,
            notice: Option<String>,
            status: bool,
            #[sqlx(flatten)]
            tail: AuditTail,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT * FROM topbar_settings WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch topbar settings"))?;

        Ok(row.map(|r| TopbarSettings {
            id: r.id,
            phone: r.phone,
            email: r.email,
            address: r.address,
            notice: r.notice,
            status: r.status,
            created_by: r.tail.created_by,
            created_by_name: r.tail.created_by_name,
            updated_by: r.tail.updated_by,
            updated_by_name: r.tail.updated_by_name,
            created_at: r.tail.created_at,
            updated_at: r.tail.updated_at,
        }))
    }

    #[instrument(skip(self, input, actor), name = "db_save_topbar_settings")]
    pub async fn save_topbar(
        &self,
        input: TopbarSettingsInput,
        actor: Option<&Actor>,
    ) -> Result<TopbarSettings> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        match self.singleton_id("topbar_settings").await? {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE topbar_settings
                    SET phone = ?, email = ?, address = ?, notice = ?, status = ?,
                        updated_by = COALESCE(?, updated_by),
                        updated_by_name = COALESCE(?, updated_by_name),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.phone)
                .bind(&input.email)
                .bind(&input.address)
                .bind(&input.notice)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Topbar settings", "Failed to update topbar settings"))?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO topbar_settings (phone, email, address, notice, status,
                        created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&input.phone)
                .bind(&input.email)
                .bind(&input.address)
                .bind(&input.notice)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Topbar settings", "Failed to create topbar settings"))?;
            }
        }

        self.get_topbar()
            .await?
            .ok_or_else(|| Error::internal("Topbar settings not found after save"))
    }

    // -- Social -------------------------------------------------------------

    #[instrument(skip(self), name = "db_get_social_settings")]
    pub async fn get_social(&self) -> Result<Option<SocialSettings>> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            facebook: Option<String>,
            twitter: Option<String>,
            instagram: Option<String>,
            linkedin: Option<String>,
            youtube: Option<String>,
            status: bool,
            #[sqlx(flatten)]
            tail: AuditTail,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT * FROM social_settings WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch social settings"))?;

        Ok(row.map(|r| SocialSettings {
            id: r.id,
            facebook: r.facebook,
            twitter: r.twitter,
            instagram: r.instagram,
            linkedin: r.linkedin,
            youtube: r.youtube,
            status: r.status,
            created_by: r.tail.created_by,
            created_by_name: r.tail.created_by_name,
            updated_by: r.tail.updated_by,
            updated_by_name: r.tail.updated_by_name,
            created_at: r.tail.created_at,
            updated_at: r.tail.updated_at,
        }))
    }

    #[instrument(skip(self, input, actor), name = "db_save_social_settings")]
    pub async fn save_social(
        &self,
        input: SocialSettingsInput,
        actor: Option<&Actor>,
    ) -> Result<SocialSettings> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        match self.singleton_id("social_settings").await? {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE social_settings
                    SET facebook = ?, twitter = ?, instagram = ?, linkedin = ?, youtube = ?,
                        status = ?,
                        updated_by = COALESCE(?, updated_by),
                        updated_by_name = COALESCE(?, updated_by_name),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.facebook)
                .bind(&input.twitter)
                .bind(&input.instagram)
                .bind(&input.linkedin)
                .bind(&input.youtube)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Social settings", "Failed to update social settings"))?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO social_settings (facebook, twitter, instagram, linkedin, youtube,
                        status, created_by, created_by_name, updated_by, updated_by_name,
                        created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&input.facebook)
                .bind(&input.twitter)
                .bind(&input.instagram)
                .bind(&input.linkedin)
                .bind(&input.youtube)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Social settings", "Failed to create social settings"))?;
            }
        }

        self.get_social()
            .await?
            .ok_or_else(|| Error::internal("Social settings not found after save"))
    }

    // -- About us -----------------------------------------------------------

    #[instrument(skip(self), name = "db_get_about_us")]
    pub async fn get_about_us(&self) -> Result<Option<AboutUs>> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            title: Option<String>,
            description: Option<String>,
            image: Option<String>,
            video_url: Option<String>,
            status: bool,
            #[sqlx(flatten)]
            tail: AuditTail,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT * FROM about_us WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch about-us content"))?;

        Ok(row.map(|r| AboutUs {
            id: r.id,
            title: r.title,
            description: r.description,
            image: r.image,
            video_url: r.video_url,
            status: r.status,
            created_by: r.tail.created_by,
            created_by_name: r.tail.created_by_name,
            updated_by: r.tail.updated_by,
            updated_by_name: r.tail.updated_by_name,
            created_at: r.tail.created_at,
            updated_at: r.tail.updated_at,
        }))
    }

    #[instrument(skip(self, input, actor), name = "db_save_about_us")]
    pub async fn save_about_us(&self, input: AboutUsInput, actor: Option<&Actor>) -> Result<AboutUs> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        match self.singleton_id("about_us").await? {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE about_us
                    SET title = ?, description = ?, image = ?, video_url = ?, status = ?,
                        updated_by = COALESCE(?, updated_by),
                        updated_by_name = COALESCE(?, updated_by_name),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.title)
                .bind(&input.description)
                .bind(&input.image)
                .bind(&input.video_url)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "About us", "Failed to update about-us content"))?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO about_us (title, description, image, video_url, status,
                        created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&input.title)
                .bind(&input.description)
                .bind(&input.image)
                .bind(&input.video_url)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "About us", "Failed to create about-us content"))?;
            }
        }

        self.get_about_us()
            .await?
            .ok_or_else(|| Error::internal("About-us content not found after save"))
    }

    // -- Call to action -----------------------------------------------------

    #[instrument(skip(self), name = "db_get_call_to_action")]
    pub async fn get_call_to_action(&self) -> Result<Option<CallToAction>> {
        #[derive(FromRow)]
        struct Row {
            id: i64,
            title: Option<String>,
            subtitle: Option<String>,
            button_text: Option<String>,
            button_link: Option<String>,
            status: bool,
            #[sqlx(flatten)]
            tail: AuditTail,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT * FROM call_to_actions WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch call-to-action content"))?;

        Ok(row.map(|r| CallToAction {
            id: r.id,
            title: r.title,
            subtitle: r.subtitle,
            button_text: r.button_text,
            button_link: r.button_link,
            status: r.status,
            created_by: r.tail.created_by,
            created_by_name: r.tail.created_by_name,
            updated_by: r.tail.updated_by,
            updated_by_name: r.tail.updated_by_name,
            created_at: r.tail.created_at,
            updated_at: r.tail.updated_at,
        }))
    }

    #[instrument(skip(self, input, actor), name = "db_save_call_to_action")]
    pub async fn save_call_to_action(
        &self,
        input: CallToActionInput,
        actor: Option<&Actor>,
    ) -> Result<CallToAction> {
        let now = Utc::now();
        let stamp = AuditStamp::from_actor(actor);

        match self.singleton_id("call_to_actions").await? {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE call_to_actions
                    SET title = ?, subtitle = ?, button_text = ?, button_link = ?, status = ?,
                        updated_by = COALESCE(?, updated_by),
                        updated_by_name = COALESCE(?, updated_by_name),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.title)
                .bind(&input.subtitle)
                .bind(&input.button_text)
                .bind(&input.button_link)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Call to action", "Failed to update call-to-action content"))?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO call_to_actions (title, subtitle, button_text, button_link, status,
                        created_by, created_by_name, updated_by, updated_by_name, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&input.title)
                .bind(&input.subtitle)
                .bind(&input.button_text)
                .bind(&input.button_link)
                .bind(input.status.unwrap_or(true))
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(stamp.id)
                .bind(&stamp.name)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|err| map_write_err(err, "Call to action", "Failed to create call-to-action content"))?;
            }
        }

        self.get_call_to_action()
            .await?
            .ok_or_else(|| Error::internal("Call-to-action content not found after save"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_pool;

    fn general(site_name: &str) -> GeneralSettingsInput {
        GeneralSettingsInput {
            site_name: site_name.to_string(),
            site_email: None,
            phone: None,
            address: None,
            logo: None,
            favicon: None,
            footer_text: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_save_is_single_row_upsert() {
        let repo = SettingsRepository::new(test_pool().await);
        assert!(repo.get_general().await.unwrap().is_none());

        let creator = Actor::new(1, "Root");
        let first = repo.save_general(general("Campanile U"), Some(&creator)).await.unwrap();

        let editor = Actor::new(2, "Registrar");
        let second = repo.save_general(general("Campanile University"), Some(&editor)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.site_name, "Campanile University");
        // Creator stamp survives later saves; updater follows the last save.
        assert_eq!(second.created_by, Some(1));
        assert_eq!(second.updated_by, Some(2));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM general_settings")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_sms_gateway_switch_clears_other_credentials() {
        let repo = SettingsRepository::new(test_pool().await);

        let twilio = SmsSettingsInput {
            sms_gateway: SmsGateway::Twilio,
            twilio_sid: Some("sid".to_string()),
            twilio_token: Some("token".to_string()),
            twilio_from: Some("+1555".to_string()),
            vonage_key: None,
            vonage_secret: None,
            vonage_from: None,
            status: None,
        };
        repo.save_sms(twilio, None).await.unwrap();

        let vonage = SmsSettingsInput {
            sms_gateway: SmsGateway::Vonage,
            twilio_sid: Some("stale-sid".to_string()),
            twilio_token: None,
            twilio_from: None,
            vonage_key: Some("key".to_string()),
            vonage_secret: Some("secret".to_string()),
            vonage_from: Some("CAMPANILE".to_string()),
            status: None,
        };
        let saved = repo.save_sms(vonage, None).await.unwrap();

        assert_eq!(saved.sms_gateway, SmsGateway::Vonage);
        assert!(saved.twilio_sid.is_none());
        assert!(saved.twilio_token.is_none());
        assert_eq!(saved.vonage_key.as_deref(), Some("key"));
    }

    #[tokio::test]
    async fn test_payment_save_round_trip() {
        let repo = SettingsRepository::new(test_pool().await);
        let input = PaymentSettingsInput {
            payment_gateway: PaymentGateway::Stripe,
            stripe_key: Some("pk".to_string()),
            stripe_secret: Some("sk".to_string()),
            stripe_webhook_secret: None,
            paypal_client_id: Some("cid".to_string()),
            paypal_client_secret: None,
            paypal_mode: None,
            razorpay_key: None,
            razorpay_secret: None,
            status: None,
        };

        let saved = repo.save_payment(input, None).await.unwrap();
        assert_eq!(saved.payment_gateway, PaymentGateway::Stripe);
        assert_eq!(saved.stripe_key.as_deref(), Some("pk"));
        // Non-selected gateway fields are dropped before the write.
        assert!(saved.paypal_client_id.is_none());
    }
}

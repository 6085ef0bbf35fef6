//! External check-in link
//!
//! A church can publish `/public/checkin/<slug>` for members to check
//! themselves in. The page is useless without the church PIN, which is
//! checked on every submission. Wrong PINs are throttled per client address
//! and, more loosely, per link.

use chrono::{Duration, Utc};
use tracing::info;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimitMiddleware};
use crate::models::*;
use crate::services::attendance::AttendanceService;
use crate::services::auth::AuthContext;
use crate::services::billing::check_feature;
use crate::utils::errors::{Result, ShepherdError};
use crate::utils::helpers::{constant_time_eq, like_pattern, local_date, sha256_hex};
use crate::utils::logging::{log_auth_event, log_tenant_action};

/// Public member search results are capped
pub const PUBLIC_SEARCH_LIMIT: i64 = 50;

/// Digest stored for a check-in PIN, salted with the church id
pub fn pin_digest(church_id: i64, pin: &str) -> String {
    sha256_hex(format!("{}:{}", church_id, pin.trim()).as_bytes())
}

/// Throttling key for one client of one link
fn client_key(slug: &str, client: &str) -> String {
    format!("{}|{}", slug, client)
}

#[derive(Clone)]
pub struct CheckInLinkService {
    db: DatabaseService,
    attendance: AttendanceService,
    per_client: RateLimitMiddleware,
    per_link: RateLimitMiddleware,
    settings: Settings,
}

impl CheckInLinkService {
    pub fn new(db: DatabaseService, attendance: AttendanceService, settings: Settings) -> Self {
        let lockout = std::time::Duration::from_secs(settings.checkin.lockout_seconds);
        let per_client = RateLimitMiddleware::new(RateLimitConfig {
            max_per_minute: settings.checkin.pin_attempts_per_minute,
            lockout,
        });
        let per_link = RateLimitMiddleware::new(RateLimitConfig {
            max_per_minute: settings.checkin.link_failures_per_minute,
            lockout,
        });
        Self { db, attendance, per_client, per_link, settings }
    }

    /// Forget throttling state for links and clients that have gone quiet
    pub fn cleanup_throttling(&self) {
        self.per_client.cleanup_old_entries();
        self.per_link.cleanup_old_entries();
    }

    pub fn link_url(&self, slug: &str) -> String {
        format!(
            "{}/public/checkin/{}",
            self.settings.server.public_base_url.trim_end_matches('/'),
            slug
        )
    }

    fn describe(&self, church: &Church) -> CheckInLinkSettings {
        CheckInLinkSettings {
            enabled: church.checkin_enabled,
            has_pin: church.checkin_pin_hash.is_some(),
            url: self.link_url(&church.slug),
        }
    }

    async fn church(&self, church_id: i64) -> Result<Church> {
        self.db
            .churches
            .find_by_id(church_id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Church", church_id))
    }

    pub async fn link_settings(&self, church_id: i64) -> Result<CheckInLinkSettings> {
        let church = self.church(church_id).await?;
        Ok(self.describe(&church))
    }

    /// Toggle the link and optionally replace its PIN
    pub async fn update(&self, ctx: &AuthContext, request: UpdateCheckInLinkRequest) -> Result<CheckInLinkSettings> {
        ctx.require(ChurchRole::Admin)?;
        let church = self.church(ctx.church_id).await?;

        let pin_hash = match request.pin.as_deref().map(str::trim) {
            Some(pin) => {
                let min = self.settings.checkin.min_pin_length;
                if pin.len() < min {
                    return Err(ShepherdError::Validation(format!("pin must be at least {} digits", min)));
                }
                Some(pin_digest(church.id, pin))
            }
            None => None,
        };

        if request.enabled && pin_hash.is_none() && church.checkin_pin_hash.is_none() {
            return Err(ShepherdError::Validation("a pin is required to enable the check-in link".to_string()));
        }

        let church = self
            .db
            .churches
            .update_checkin_link(church.id, request.enabled, pin_hash)
            .await?;

        log_tenant_action(ctx.church_id, ctx.user_id, "update_checkin_link", None);
        Ok(self.describe(&church))
    }

    /// Church behind a public slug, if its link is usable
    async fn open_church(&self, slug: &str) -> Result<Church> {
        let church = self
            .db
            .churches
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_active && c.checkin_enabled && c.checkin_pin_hash.is_some())
            .ok_or_else(|| ShepherdError::Unrecognized("Check-in link not found".to_string()))?;

        let subscription = self
            .db
            .subscriptions
            .find_by_church(church.id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Subscription", church.id))?;
        check_feature(&subscription, Feature::ExternalCheckIn, Utc::now())?;

        Ok(church)
    }

    /// Compare the PIN; only wrong PINs spend the client's and the link's quota
    fn verify_pin(&self, church: &Church, pin: &str, client: &str) -> Result<()> {
        let client_key = client_key(&church.slug, client);
        self.per_link.ensure_unlocked(&church.slug)?;
        self.per_client.ensure_unlocked(&client_key)?;

        let matches = church
            .checkin_pin_hash
            .as_deref()
            .map(|stored| constant_time_eq(stored, &pin_digest(church.id, pin)))
            .unwrap_or(false);
        if matches {
            return Ok(());
        }

        log_auth_event(&church.slug, "checkin_pin", false, Some(client));
        self.per_client.record_failure(&client_key)?;
        self.per_link.record_failure(&church.slug)?;
        Err(ShepherdError::Unauthorized("Incorrect PIN".to_string()))
    }

    /// Church name and today's events, shown before the PIN is entered
    pub async fn public_info(&self, slug: &str) -> Result<PublicChurchInfo> {
        let church = self.open_church(slug).await?;

        let offset = Duration::minutes(church.utc_offset_minutes as i64);
        let today = local_date(Utc::now(), church.utc_offset_minutes);
        let local_midnight = today.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let start = local_midnight - offset;
        let events = self
            .db
            .events
            .list_active_between(church.id, start, start + Duration::days(1))
            .await?;

        Ok(PublicChurchInfo {
            name: church.name,
            slug: church.slug,
            events,
        })
    }

    pub async fn search_members(
        &self,
        slug: &str,
        client: &str,
        request: PublicMemberSearchRequest,
    ) -> Result<Vec<PublicMember>> {
        let church = self.open_church(slug).await?;
        self.verify_pin(&church, &request.pin, client)?;

        self.db
            .members
            .search_public(church.id, &like_pattern(&request.q), PUBLIC_SEARCH_LIMIT)
            .await
    }

    pub async fn check_in(&self, slug: &str, client: &str, request: PublicCheckInRequest) -> Result<AttendanceRecord> {
        let church = self.open_church(slug).await?;
        self.verify_pin(&church, &request.pin, client)?;

        let record = self
            .attendance
            .external_check_in(&church, request.member_id, request.event_id)
            .await?;

        info!(church_id = church.id, member_id = request.member_id, "Self check-in via public link");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_keys_are_scoped_to_the_link() {
        assert_eq!(client_key("grace-chapel", "203.0.113.7"), "grace-chapel|203.0.113.7");
        assert_ne!(client_key("grace-chapel", "203.0.113.7"), client_key("st-marks", "203.0.113.7"));
    }

    #[test]
    fn test_pin_digest_depends_on_church() {
        assert_eq!(pin_digest(1, "4821"), pin_digest(1, " 4821 "));
        assert_ne!(pin_digest(1, "4821"), pin_digest(2, "4821"));
        assert_ne!(pin_digest(1, "4821"), pin_digest(1, "4822"));
    }
}

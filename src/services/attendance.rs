//! Attendance recording
//!
//! Every check-in path (staff entry, kiosk, biometric scan, public link)
//! funnels through [`AttendanceService::record`], which enforces tenant
//! ownership, member and event state, and the one-per-day rule.

use chrono::Utc;
use crate::database::repositories::attendance::DUPLICATE_CHECK_IN;
use crate::database::DatabaseService;
use crate::models::*;
use crate::services::auth::AuthContext;
use crate::utils::errors::{Result, ShepherdError};
use crate::utils::helpers::{clean_optional, like_pattern, local_date, page_bounds, sha256_hex};
use crate::utils::logging::{log_check_in, log_tenant_action};

/// Kiosk search results are capped so the screen stays usable
pub const KIOSK_SEARCH_LIMIT: i64 = 20;

/// Digest stored for a fingerprint template
pub fn biometric_digest(template: &str) -> String {
    sha256_hex(template.trim().as_bytes())
}

#[derive(Clone)]
pub struct AttendanceService {
    db: DatabaseService,
}

impl AttendanceService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    async fn church(&self, church_id: i64) -> Result<Church> {
        self.db
            .churches
            .find_by_id(church_id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Church", church_id))
    }

    /// Validate and write one attendance row
    pub async fn record(
        &self,
        church: &Church,
        request: CheckInRequest,
        method: CheckInMethod,
        recorded_by: Option<i64>,
    ) -> Result<AttendanceRecord> {
        let CheckInRequest { member_id, event_id, attendance_date, notes } = request;
        let member = self
            .db
            .members
            .find_by_id(church.id, member_id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Member", member_id))?;
        if member.status() != MemberStatus::Active {
            return Err(ShepherdError::Validation(format!(
                "{} is not an active member",
                member.full_name()
            )));
        }

        if let Some(event_id) = event_id {
            let event = self
                .db
                .events
                .find_by_id(church.id, event_id)
                .await?
                .ok_or_else(|| ShepherdError::not_found("Event", event_id))?;
            if !event.is_active {
                return Err(ShepherdError::Validation("Event is not active".to_string()));
            }
        }

        let today = local_date(Utc::now(), church.utc_offset_minutes);
        let attendance_date = attendance_date.unwrap_or(today);
        if attendance_date > today {
            return Err(ShepherdError::Validation("attendance_date cannot be in the future".to_string()));
        }

        if self.db.attendance.exists(member_id, event_id, attendance_date).await? {
            return Err(ShepherdError::Conflict(DUPLICATE_CHECK_IN.to_string()));
        }

        let record = self
            .db
            .attendance
            .create(NewAttendance {
                church_id: church.id,
                member_id,
                event_id,
                attendance_date,
                method,
                recorded_by,
                notes: clean_optional(notes),
            })
            .await?;

        log_check_in(church.id, member_id, event_id, method.as_str());
        Ok(record)
    }

    /// Staff-entered check-in
    pub async fn check_in(&self, ctx: &AuthContext, request: CheckInRequest) -> Result<AttendanceRecord> {
        ctx.require(ChurchRole::Staff)?;
        let church = self.church(ctx.church_id).await?;
        self.record(&church, request, CheckInMethod::Manual, Some(ctx.user_id)).await
    }

    pub async fn kiosk_search(&self, church_id: i64, query: &str) -> Result<Vec<Member>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.db
            .members
            .search_active(church_id, &like_pattern(query), KIOSK_SEARCH_LIMIT)
            .await
    }

    pub async fn kiosk_check_in(&self, ctx: &AuthContext, request: KioskCheckInRequest) -> Result<AttendanceRecord> {
        ctx.require(ChurchRole::Staff)?;
        let church = self.church(ctx.church_id).await?;
        let request = CheckInRequest {
            member_id: request.member_id,
            event_id: request.event_id,
            ..Default::default()
        };
        self.record(&church, request, CheckInMethod::Kiosk, Some(ctx.user_id)).await
    }

    /// Check in whoever the scanned template belongs to
    pub async fn biometric_check_in(&self, ctx: &AuthContext, request: BiometricCheckInRequest) -> Result<(Member, AttendanceRecord)> {
        ctx.require(ChurchRole::Staff)?;
        let church = self.church(ctx.church_id).await?;
        let member = self
            .db
            .members
            .find_by_biometric(church.id, &biometric_digest(&request.template))
            .await?
            .ok_or_else(|| ShepherdError::Unrecognized("No member is enrolled with this fingerprint".to_string()))?;

        let check_in = CheckInRequest {
            member_id: member.id,
            event_id: request.event_id,
            ..Default::default()
        };
        let record = self.record(&church, check_in, CheckInMethod::Biometric, Some(ctx.user_id)).await?;
        Ok((member, record))
    }

    /// Check-in submitted through the public link; the PIN is already verified
    pub async fn external_check_in(&self, church: &Church, member_id: i64, event_id: Option<i64>) -> Result<AttendanceRecord> {
        let request = CheckInRequest { member_id, event_id, ..Default::default() };
        self.record(church, request, CheckInMethod::ExternalLink, None).await
    }

    pub async fn enroll_biometric(&self, ctx: &AuthContext, member_id: i64, request: BiometricEnrollRequest) -> Result<Member> {
        ctx.require(ChurchRole::Staff)?;
        let member = self
            .db
            .members
            .set_biometric(ctx.church_id, member_id, Some(biometric_digest(&request.template)))
            .await?;
        log_tenant_action(ctx.church_id, ctx.user_id, "enroll_biometric", Some(member_id));
        Ok(member)
    }

    pub async fn remove_biometric(&self, ctx: &AuthContext, member_id: i64) -> Result<Member> {
        ctx.require(ChurchRole::Staff)?;
        let member = self.db.members.set_biometric(ctx.church_id, member_id, None).await?;
        log_tenant_action(ctx.church_id, ctx.user_id, "remove_biometric", Some(member_id));
        Ok(member)
    }

    pub async fn list(&self, church_id: i64, filter: &AttendanceFilter) -> Result<Page<AttendanceEntry>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(ShepherdError::Validation("from must not be after to".to_string()));
            }
        }
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let items = self.db.attendance.list(church_id, filter, limit, offset).await?;
        let total = self.db.attendance.count(church_id, filter).await?;
        Ok(Page::new(items, total, limit, offset))
    }

    pub async fn delete(&self, ctx: &AuthContext, id: i64) -> Result<()> {
        ctx.require(ChurchRole::Admin)?;
        if !self.db.attendance.delete(ctx.church_id, id).await? {
            return Err(ShepherdError::not_found("Attendance record", id));
        }
        log_tenant_action(ctx.church_id, ctx.user_id, "delete_attendance", Some(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biometric_digest_ignores_surrounding_whitespace() {
        let a = biometric_digest("  minutiae:12,44,91,203  ");
        let b = biometric_digest("minutiae:12,44,91,203");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, biometric_digest("minutiae:12,44,91,204"));
    }
}

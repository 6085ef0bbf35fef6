//! Services module
//!
//! This module contains business logic services

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod billing;
pub mod checkin;
pub mod church;
pub mod congregation;
pub mod reports;

// Re-export commonly used services
pub use admin::AdminService;
pub use attendance::AttendanceService;
pub use auth::{AuthService, AuthContext, AdminContext};
pub use billing::{BillingService, PlanCapabilities, SubscriptionSummary};
pub use checkin::CheckInLinkService;
pub use church::ChurchService;
pub use congregation::CongregationService;
pub use reports::{CsvExport, ReportService};

use crate::config::settings::Settings;
use crate::database::DatabaseService;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub billing_service: BillingService,
    pub church_service: ChurchService,
    pub congregation_service: CongregationService,
    pub attendance_service: AttendanceService,
    pub checkin_service: CheckInLinkService,
    pub report_service: ReportService,
    pub admin_service: AdminService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(db: DatabaseService, settings: Settings) -> Self {
        let billing_service = BillingService::new(db.clone());
        let attendance_service = AttendanceService::new(db.clone());

        Self {
            auth_service: AuthService::new(db.clone(), settings.clone()),
            church_service: ChurchService::new(db.clone(), billing_service.clone(), settings.clone()),
            congregation_service: CongregationService::new(db.clone(), billing_service.clone()),
            checkin_service: CheckInLinkService::new(db.clone(), attendance_service.clone(), settings),
            report_service: ReportService::new(db.clone()),
            admin_service: AdminService::new(db),
            attendance_service,
            billing_service,
        }
    }
}

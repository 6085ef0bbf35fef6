//! Authentication service implementation
//!
//! This service handles password hashing, token issuing and verification,
//! church signup and login for both church staff and super admins,
//! and role-based access checks.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::Sha256;
use tracing::{debug, info, warn};
use crate::config::settings::Settings;
use crate::database::repositories::ChurchUserChanges;
use crate::database::{DatabaseService, Registration};
use crate::models::*;
use crate::utils::errors::{Result, ShepherdError};
use crate::utils::helpers::{clean_optional, constant_time_eq, normalize_email, random_hex, sha256_hex, slugify, to_hex};
use crate::utils::logging::{log_admin_action, log_auth_event};

const HASH_SCHEME: &str = "pbkdf2-sha256";
/// Iterated digest written before PBKDF2; still accepted at login
const LEGACY_HASH_SCHEME: &str = "sha256";
const SALT_BYTES: usize = 16;
const KEY_BYTES: usize = 32;

/// Authenticated church staff member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub church_id: i64,
    pub role: ChurchRole,
}

impl AuthContext {
    /// Fail with 403 unless the caller holds at least `min` role
    pub fn require(&self, min: ChurchRole) -> Result<()> {
        require_role(self.role, min)
    }
}

/// Authenticated super admin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminContext {
    pub admin_id: i64,
}

/// Check role hierarchy
pub fn require_role(role: ChurchRole, min: ChurchRole) -> Result<()> {
    if role.includes(min) {
        Ok(())
    } else {
        Err(ShepherdError::PermissionDenied(format!("This action requires the {} role", min)))
    }
}

fn pbkdf2_digest(salt: &str, secret: &str, iterations: u32) -> String {
    let mut key = [0u8; KEY_BYTES];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt.as_bytes(), iterations, &mut key);
    to_hex(&key)
}

fn legacy_digest(salt: &str, secret: &str, iterations: u32) -> String {
    let mut hash = sha256_hex(format!("{}{}", salt, secret).as_bytes());
    for _ in 1..iterations {
        hash = sha256_hex(format!("{}{}{}", hash, salt, secret).as_bytes());
    }
    hash
}

/// Hash a password as `pbkdf2-sha256$<iterations>$<salt>$<key>`
pub fn hash_password(password: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let salt = random_hex(SALT_BYTES);
    let key = pbkdf2_digest(&salt, password, iterations);
    format!("{}${}${}${}", HASH_SCHEME, iterations, salt, key)
}

/// Verify a password against a stored hash of either scheme
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, expected] = parts.as_slice() else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 || salt.is_empty() {
        return false;
    }
    let computed = match *scheme {
        HASH_SCHEME => pbkdf2_digest(salt, password, iterations),
        LEGACY_HASH_SCHEME => legacy_digest(salt, password, iterations),
        _ => return false,
    };
    constant_time_eq(&computed, expected)
}

/// Whether a stored hash should be rewritten with the current scheme
pub fn needs_rehash(stored: &str) -> bool {
    !stored.starts_with(&format!("{}$", HASH_SCHEME))
}

/// Authentication service for signup, login and token handling
#[derive(Clone)]
pub struct AuthService {
    db: DatabaseService,
    settings: Settings,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: DatabaseService, settings: Settings) -> Self {
        Self { db, settings }
    }

    pub fn hash_password(&self, password: &str) -> String {
        hash_password(password, self.settings.auth.password_iterations)
    }

    /// Sign a token for a principal
    pub fn issue_token(&self, kind: PrincipalKind, subject: i64, church_id: Option<i64>, role: Option<ChurchRole>) -> Result<TokenResponse> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.settings.auth.token_ttl_hours);
        let claims = Claims {
            sub: subject,
            kind,
            church_id,
            role: role.map(|r| r.as_str().to_string()),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.settings.auth.jwt_secret.as_bytes()),
        )?;

        Ok(TokenResponse::bearer(token, expires_at))
    }

    /// Decode and validate a token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.auth.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    /// Resolve the church staff context behind verified claims
    pub async fn church_context(&self, claims: &Claims) -> Result<AuthContext> {
        if claims.kind != PrincipalKind::ChurchUser {
            return Err(ShepherdError::PermissionDenied("Church account required".to_string()));
        }
        let church_id = claims
            .church_id
            .ok_or_else(|| ShepherdError::Unauthorized("Token is missing its church".to_string()))?;

        let user = self
            .db
            .users
            .find_by_id(church_id, claims.sub)
            .await?
            .ok_or_else(|| ShepherdError::Unauthorized("Account no longer exists".to_string()))?;
        if !user.is_active {
            return Err(ShepherdError::PermissionDenied("Account is deactivated".to_string()));
        }

        let church = self
            .db
            .churches
            .find_by_id(church_id)
            .await?
            .ok_or_else(|| ShepherdError::Unauthorized("Church no longer exists".to_string()))?;
        if !church.is_active {
            return Err(ShepherdError::PermissionDenied("Church account is suspended".to_string()));
        }

        // Role is read from the row so demotions apply immediately
        Ok(AuthContext {
            user_id: user.id,
            church_id,
            role: user.role(),
        })
    }

    /// Resolve the super admin context behind verified claims
    pub async fn admin_context(&self, claims: &Claims) -> Result<AdminContext> {
        if claims.kind != PrincipalKind::SuperAdmin {
            return Err(ShepherdError::PermissionDenied("Super admin access required".to_string()));
        }
        let admin = self
            .db
            .super_admins
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| ShepherdError::Unauthorized("Account no longer exists".to_string()))?;

        Ok(AdminContext { admin_id: admin.id })
    }

    /// Self-service church signup
    pub async fn register(&self, request: RegisterChurchRequest) -> Result<(Registration, TokenResponse)> {
        if !self.settings.features.open_registration {
            return Err(ShepherdError::PermissionDenied("Registration is closed".to_string()));
        }

        let slug = match request.slug {
            Some(ref slug) => slug.clone(),
            None => self.available_slug(&request.church_name).await?,
        };
        let email = normalize_email(&request.email);

        let church = CreateChurchRequest {
            name: request.church_name.trim().to_string(),
            slug,
            email: clean_optional(request.church_email).map(|e| normalize_email(&e)),
            phone: clean_optional(request.church_phone),
            address: clean_optional(request.address),
            utc_offset_minutes: request.utc_offset_minutes,
        };
        let trial_ends_at = Utc::now() + Duration::days(self.settings.billing.trial_days);

        let registration = self
            .db
            .register_church(
                church,
                email.clone(),
                self.hash_password(&request.password),
                request.full_name.trim().to_string(),
                trial_ends_at,
            )
            .await?;

        info!(
            church_id = registration.church.id,
            slug = %registration.church.slug,
            "Church registered"
        );
        log_auth_event(&email, "register", true, None);

        let token = self.issue_token(
            PrincipalKind::ChurchUser,
            registration.owner.id,
            Some(registration.church.id),
            Some(ChurchRole::Owner),
        )?;

        Ok((registration, token))
    }

    /// First free slug derived from a church name
    async fn available_slug(&self, name: &str) -> Result<String> {
        let mut base = slugify(name);
        if base.len() < 3 {
            base = format!("church-{}", base).trim_end_matches('-').to_string();
        }
        base.truncate(56);
        let base = base.trim_end_matches('-').to_string();

        if !self.db.churches.slug_exists(&base).await? {
            return Ok(base);
        }
        for _ in 0..5 {
            let candidate = format!("{}-{}", base, random_hex(3));
            if !self.db.churches.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(ShepherdError::Conflict("Could not find a free slug; please choose one".to_string()))
    }

    /// Church staff login
    pub async fn login(&self, request: LoginRequest) -> Result<(ChurchUser, TokenResponse)> {
        let email = normalize_email(&request.email);

        let user = match self.db.users.find_by_email(&email).await? {
            Some(user) if verify_password(&request.password, &user.password_hash) => user,
            _ => {
                log_auth_event(&email, "login", false, Some("bad credentials"));
                return Err(ShepherdError::Unauthorized("Invalid email or password".to_string()));
            }
        };

        if !user.is_active {
            log_auth_event(&email, "login", false, Some("account deactivated"));
            return Err(ShepherdError::PermissionDenied("Account is deactivated".to_string()));
        }

        let church = self
            .db
            .churches
            .find_by_id(user.church_id)
            .await?
            .ok_or_else(|| ShepherdError::not_found("Church", user.church_id))?;
        if !church.is_active {
            log_auth_event(&email, "login", false, Some("church suspended"));
            return Err(ShepherdError::PermissionDenied("Church account is suspended".to_string()));
        }

        if needs_rehash(&user.password_hash) {
            self.db
                .users
                .update(user.church_id, user.id, ChurchUserChanges {
                    password_hash: Some(self.hash_password(&request.password)),
                    ..Default::default()
                })
                .await?;
            debug!(user_id = user.id, "Upgraded stored password hash");
        }

        self.db.users.touch_login(user.id).await?;
        log_auth_event(&email, "login", true, None);

        let token = self.issue_token(PrincipalKind::ChurchUser, user.id, Some(user.church_id), Some(user.role()))?;
        Ok((user, token))
    }

    /// Super admin login
    pub async fn admin_login(&self, request: LoginRequest) -> Result<(SuperAdmin, TokenResponse)> {
        let email = normalize_email(&request.email);

        let admin = match self.db.super_admins.find_by_email(&email).await? {
            Some(admin) if verify_password(&request.password, &admin.password_hash) => admin,
            _ => {
                log_auth_event(&email, "admin_login", false, Some("bad credentials"));
                return Err(ShepherdError::Unauthorized("Invalid email or password".to_string()));
            }
        };

        self.db.super_admins.touch_login(admin.id).await?;
        log_auth_event(&email, "admin_login", true, None);

        let token = self.issue_token(PrincipalKind::SuperAdmin, admin.id, None, None)?;
        Ok((admin, token))
    }

    /// Seed the configured super admin when none exists yet
    pub async fn bootstrap_super_admin(&self) -> Result<Option<SuperAdmin>> {
        if !self.settings.features.seed_super_admin {
            debug!("Super admin seeding disabled");
            return Ok(None);
        }
        let Some(ref seed) = self.settings.bootstrap_admin else {
            warn!("Super admin seeding enabled but no bootstrap_admin configured");
            return Ok(None);
        };
        if self.db.super_admins.count().await? > 0 {
            return Ok(None);
        }

        let admin = self
            .db
            .super_admins
            .create(NewSuperAdmin {
                email: normalize_email(&seed.email),
                password_hash: self.hash_password(&seed.password),
                full_name: seed.full_name.clone(),
            })
            .await?;

        log_admin_action(admin.id, "bootstrap", Some(&admin.email), None);
        Ok(Some(admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::create_lazy_pool;

    fn service() -> AuthService {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "unit-test-secret-that-is-long-enough".to_string();
        let pool = create_lazy_pool(&settings.database).unwrap();
        AuthService::new(DatabaseService::new(pool), settings)
    }

    #[test]
    fn test_password_round_trip() {
        let stored = hash_password("correct horse", 50);
        assert!(stored.starts_with("pbkdf2-sha256$50$"));
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("battery staple", &stored));
        assert!(!needs_rehash(&stored));
    }

    #[test]
    fn test_pbkdf2_matches_reference_vector() {
        // RFC 7914 section 11, PBKDF2-HMAC-SHA256 with c = 1
        let key = pbkdf2_digest("salt", "passwd", 1);
        assert_eq!(key, "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc");
    }

    #[test]
    fn test_legacy_hashes_still_verify() {
        let salt = "00112233445566778899aabbccddeeff";
        let stored = format!("sha256$3${}${}", salt, legacy_digest(salt, "amazing grace", 3));
        assert!(verify_password("amazing grace", &stored));
        assert!(!verify_password("amazing grace!", &stored));
        assert!(needs_rehash(&stored));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        assert_ne!(hash_password("amazing grace", 5), hash_password("amazing grace", 5));
    }

    #[test]
    fn test_malformed_hashes_never_verify() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$1$aa$bb"));
        assert!(!verify_password("x", "sha256$zero$aa$bb"));
        assert!(!verify_password("x", "sha256$0$aa$bb"));
        assert!(!verify_password("x", "pbkdf2-sha256$10$$bb"));
    }

    #[test]
    fn test_require_role() {
        let ctx = AuthContext { user_id: 1, church_id: 1, role: ChurchRole::Staff };
        assert!(ctx.require(ChurchRole::Viewer).is_ok());
        assert!(ctx.require(ChurchRole::Staff).is_ok());
        let err = ctx.require(ChurchRole::Admin).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let auth = service();
        let token = auth
            .issue_token(PrincipalKind::ChurchUser, 7, Some(3), Some(ChurchRole::Admin))
            .unwrap();
        assert_eq!(token.token_type, "Bearer");

        let claims = auth.verify_token(&token.token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.church_id, Some(3));
        assert_eq!(claims.kind, PrincipalKind::ChurchUser);
        assert_eq!(claims.role.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let auth = service();
        let token = auth.issue_token(PrincipalKind::SuperAdmin, 1, None, None).unwrap();

        let mut other_settings = Settings::default();
        other_settings.auth.jwt_secret = "another-secret-that-is-long-enough-1234".to_string();
        let pool = create_lazy_pool(&other_settings.database).unwrap();
        let other = AuthService::new(DatabaseService::new(pool), other_settings);

        let err = other.verify_token(&token.token).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        assert!(auth.verify_token("not.a.token").is_err());
    }

    #[tokio::test]
    async fn test_wrong_principal_kind_is_forbidden() {
        let auth = service();
        let claims = Claims {
            sub: 1,
            kind: PrincipalKind::SuperAdmin,
            church_id: None,
            role: None,
            iat: 0,
            exp: i64::MAX,
        };
        let err = auth.church_context(&claims).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_registration_closed() {
        let mut settings = Settings::default();
        settings.features.open_registration = false;
        let pool = create_lazy_pool(&settings.database).unwrap();
        let auth = AuthService::new(DatabaseService::new(pool), settings);

        let request = RegisterChurchRequest {
            church_name: "Grace Chapel".into(),
            slug: None,
            church_email: None,
            church_phone: None,
            address: None,
            utc_offset_minutes: 0,
            full_name: "Jane".into(),
            email: "jane@grace.org".into(),
            password: "hallelujah".into(),
        };
        let err = auth.register(request).await.unwrap_err();
        assert!(matches!(err, ShepherdError::PermissionDenied(_)));
    }
}

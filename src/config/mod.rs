use once_cell::sync::Lazy;
use std::env;

use crate::models::Role;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Prefix for all API routes. Deployments that expose the handlers at the
    /// bare root set this to "".
    pub route_prefix: String,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Seconds to wait when acquiring a connection.
    pub connection_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// HS256 signing secret. Must come from the environment in staging and
    /// production; the development fallback is for local runs only.
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub enable_cors: bool,
    /// When set, enroll/unenroll require the acting employee's gym to match
    /// the class's gym.
    pub enforce_gym_scope: bool,
    /// Roles allowed to register new employees.
    pub register_roles: Vec<Role>,
    /// Roles allowed to enroll/unenroll customers and check subscriptions.
    pub enroll_roles: Vec<Role>,
    /// Roles allowed to manage gyms, classes, subscriptions, schedules,
    /// products and employee records.
    pub admin_roles: Vec<Role>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("API_ROUTE_PREFIX") {
            self.api.route_prefix = v;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_ENFORCE_GYM_SCOPE") {
            self.security.enforce_gym_scope = v.parse().unwrap_or(self.security.enforce_gym_scope);
        }
        if let Ok(v) = env::var("SECURITY_REGISTER_ROLES") {
            if let Some(roles) = parse_roles(&v) {
                self.security.register_roles = roles;
            }
        }
        if let Ok(v) = env::var("SECURITY_ENROLL_ROLES") {
            if let Some(roles) = parse_roles(&v) {
                self.security.enroll_roles = roles;
            }
        }
        if let Ok(v) = env::var("SECURITY_ADMIN_ROLES") {
            if let Some(roles) = parse_roles(&v) {
                self.security.admin_roles = roles;
            }
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                route_prefix: "/api".to_string(),
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                url: "postgres://localhost:5432/gym".to_string(),
                max_connections: 10,
                connection_timeout: 2,
            },
            security: SecurityConfig {
                jwt_secret: "gym-api-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                bcrypt_cost: 4,           // fast hashes for local iteration
                enable_cors: true,
                enforce_gym_scope: false,
                register_roles: vec![Role::Manager],
                enroll_roles: vec![Role::Manager, Role::Receptionist],
                admin_roles: vec![Role::Manager],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                route_prefix: "/api".to_string(),
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                url: "postgres://localhost:5432/gym".to_string(),
                max_connections: 20,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                enable_cors: true,
                enforce_gym_scope: true,
                register_roles: vec![Role::Manager],
                enroll_roles: vec![Role::Manager, Role::Receptionist],
                admin_roles: vec![Role::Manager],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                route_prefix: "/api".to_string(),
                enable_request_logging: false,
            },
            database: DatabaseConfig {
                url: "postgres://localhost:5432/gym".to_string(),
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 4,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                enable_cors: true,
                enforce_gym_scope: true,
                register_roles: vec![Role::Manager],
                enroll_roles: vec![Role::Manager, Role::Receptionist],
                admin_roles: vec![Role::Manager],
            },
        }
    }
}

/// Parse a comma-separated role list. Returns None if any entry is unknown so
/// a typo in the env var keeps the default set instead of silently shrinking it.
fn parse_roles(value: &str) -> Option<Vec<Role>> {
    let roles: Result<Vec<Role>, _> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect();
    match roles {
        Ok(roles) if !roles.is_empty() => Some(roles),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("ignoring invalid role list '{}': {}", value, e);
            None
        }
    }
}

// Global default config - initialized once at startup. Handlers receive the
// config through AppState; this is only the construction entry point.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.route_prefix, "/api");
        assert_eq!(config.security.register_roles, vec![Role::Manager]);
        assert!(!config.security.enforce_gym_scope);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.security.jwt_expiry_hours, 4);
        assert!(config.security.enforce_gym_scope);
        // Production refuses to sign tokens until JWT_SECRET is provided.
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn parses_role_lists() {
        assert_eq!(
            parse_roles("manager,receptionist"),
            Some(vec![Role::Manager, Role::Receptionist])
        );
        assert_eq!(parse_roles(" coach "), Some(vec![Role::Coach]));
        assert_eq!(parse_roles("manager,janitor"), None);
        assert_eq!(parse_roles(""), None);
    }
}

use std::{env, str::FromStr, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use mkt_common::{helpers::parse_boolean_flag, Naira, Secret};
use paystack_tools::PaystackConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use settlement_engine::{
    helpers::DEFAULT_CAS_ATTEMPTS,
    pricing::{DEFAULT_BASE_FEE, DEFAULT_FEE_RATE},
    PricingPolicy,
    DEFAULT_SESSION_EXPIRY,
};

use crate::errors::ServerError;

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8360;
const DEFAULT_RECONCILE_INTERVAL: StdDuration = StdDuration::from_secs(15 * 60);
const DEFAULT_RECONCILE_PENDING_AFTER: Duration = Duration::minutes(30);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Gateway credentials and endpoint. The secret key also signs webhooks.
    pub paystack: PaystackConfig,
    /// Where the gateway sends customers once they have paid.
    pub callback_url: Option<String>,
    pub pricing: PricingPolicy,
    /// How many times a contended stock update is attempted before giving up.
    pub stock_retries: usize,
    /// When false, webhook signatures are not checked. **DANGER**
    pub webhook_checks: bool,
    /// How often the reconciliation sweep runs.
    pub reconcile_interval: StdDuration,
    /// Pending orders older than this are re-verified by the reconciliation sweep.
    pub reconcile_pending_after: Duration,
    /// Pending orders the gateway still reports as unpaid this long after checkout are failed by the sweep.
    pub session_expiry: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            paystack: PaystackConfig::default(),
            callback_url: None,
            pricing: PricingPolicy::default(),
            stock_retries: DEFAULT_CAS_ATTEMPTS,
            webhook_checks: true,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            reconcile_pending_after: DEFAULT_RECONCILE_PENDING_AFTER,
            session_expiry: DEFAULT_SESSION_EXPIRY,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env::var("MKT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MKT_PORT. {e} Using the default, {DEFAULT_MKT_PORT}, instead."
                    );
                    DEFAULT_MKT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MKT_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let paystack = PaystackConfig::new_from_env_or_default();
        let callback_url = env::var("MKT_PAYSTACK_CALLBACK_URL").ok().filter(|s| !s.trim().is_empty());
        if callback_url.is_none() {
            info!("🪛️ MKT_PAYSTACK_CALLBACK_URL is not set. The gateway's dashboard callback will be used.");
        }
        let pricing = configure_pricing();
        let stock_retries = parse_env("MKT_STOCK_RETRIES", DEFAULT_CAS_ATTEMPTS).max(1);
        let webhook_checks = parse_boolean_flag(env::var("MKT_WEBHOOK_CHECKS").ok(), true);
        if !webhook_checks {
            warn!(
                "🚨️🚨️🚨️ Webhook signature checks are DISABLED. Anyone can mark orders as paid. Never run production \
                 like this. 🚨️🚨️🚨️"
            );
        }
        let reconcile_interval = StdDuration::from_secs(parse_env(
            "MKT_RECONCILE_INTERVAL_SECS",
            DEFAULT_RECONCILE_INTERVAL.as_secs(),
        ));
        let reconcile_pending_after = Duration::minutes(parse_env(
            "MKT_RECONCILE_PENDING_AFTER_MINS",
            DEFAULT_RECONCILE_PENDING_AFTER.num_minutes(),
        ));
        let session_expiry =
            Duration::hours(parse_env("MKT_SESSION_EXPIRY_HOURS", DEFAULT_SESSION_EXPIRY.num_hours()).max(1));
        if session_expiry <= reconcile_pending_after {
            warn!(
                "🪛️ MKT_SESSION_EXPIRY_HOURS ({}h) is not longer than MKT_RECONCILE_PENDING_AFTER_MINS ({}m). Customers \
                 who are slow to pay will have their orders failed on the first sweep.",
                session_expiry.num_hours(),
                reconcile_pending_after.num_minutes()
            );
        }
        Self {
            host,
            port,
            database_url,
            auth,
            paystack,
            callback_url,
            pricing,
            stock_retries,
            webhook_checks,
            reconcile_interval,
            reconcile_pending_after,
            session_expiry,
        }
    }
}

fn configure_pricing() -> PricingPolicy {
    let base_fee = parse_env("MKT_BASE_FEE", DEFAULT_BASE_FEE);
    let fee_rate = parse_env("MKT_FEE_RATE", DEFAULT_FEE_RATE);
    let (base_fee, fee_rate) = if base_fee < 0 || !(0.0..1.0).contains(&fee_rate) {
        warn!(
            "🪛️ The pricing configuration (base fee {base_fee}, rate {fee_rate}) is out of range. Using the defaults, \
             {DEFAULT_BASE_FEE} and {DEFAULT_FEE_RATE}."
        );
        (DEFAULT_BASE_FEE, DEFAULT_FEE_RATE)
    } else {
        (base_fee, fee_rate)
    };
    info!("🪛️ Customer prices are wholesale + {base_fee} + {}%", fee_rate * 100.0);
    PricingPolicy::new(Naira::from(base_fee), fee_rate)
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name} ({s}). {e}. Using the default, {default}.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret that seller bearer tokens are signed with. Tokens are issued elsewhere; the server only
    /// verifies them.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No seller token \
             issued elsewhere will be accepted. Set MKT_JWT_SECRET. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self { jwt_secret: Secret::new(secret.to_string()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("MKT_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [MKT_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "MKT_JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }
        Ok(Self::new(&secret))
    }
}

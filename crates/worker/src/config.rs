use std::time::Duration;

/// Reply queues the registry interface answers on, one per entity family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyQueues {
    pub domain: String,
    pub contact: String,
    pub host: String,
    pub validation: String,
}

impl Default for ReplyQueues {
    fn default() -> Self {
        Self {
            domain: "domain_provision_update".into(),
            contact: "contact_provision_update".into(),
            host: "host_provision_update".into(),
            validation: "validation_update".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Queue job notifications are consumed from.
    pub job_queue: String,
    /// Maximum number of notifications handled concurrently.
    pub prefetch_count: usize,
    pub remote_call_timeout: Duration,
    pub broker_poll_interval: Duration,
    /// Deliveries after which a notification is dead-lettered.
    pub broker_max_deliveries: i32,
    pub broker_requeue_backoff: Duration,
    /// Age after which unclaimed call replies are purged.
    pub reply_ttl: Duration,
    pub reply_queues: ReplyQueues,
    /// How long shutdown waits for in-flight jobs.
    pub shutdown_timeout: Duration,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `DATABASE_URL`             | required                   |
    /// | `DB_MAX_CONNECTIONS`       | `20`                       |
    /// | `JOB_QUEUE`                | `worker_jobs`              |
    /// | `PREFETCH_COUNT`           | `10`                       |
    /// | `REMOTE_CALL_TIMEOUT_SECS` | `30`                       |
    /// | `BROKER_POLL_INTERVAL_MS`  | `250`                      |
    /// | `BROKER_MAX_DELIVERIES`    | `5`                        |
    /// | `BROKER_REQUEUE_BACKOFF_MS`| `1000`                     |
    /// | `REPLY_TTL_SECS`           | `600`                      |
    /// | `DOMAIN_UPDATE_QUEUE`      | `domain_provision_update`  |
    /// | `CONTACT_UPDATE_QUEUE`     | `contact_provision_update` |
    /// | `HOST_UPDATE_QUEUE`        | `host_provision_update`    |
    /// | `VALIDATION_UPDATE_QUEUE`  | `validation_update`        |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                       |
    /// | `LOG_FORMAT`               | `pretty` (or `json`)       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        let defaults = ReplyQueues::default();

        let prefetch_count: usize = env.parse("PREFETCH_COUNT", 10)?;
        if prefetch_count == 0 {
            return Err(ConfigError::Invalid {
                var: "PREFETCH_COUNT",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let log_format = match env.string("LOG_FORMAT", "pretty").as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected `pretty` or `json`".into(),
                })
            }
        };

        Ok(Self {
            database_url: (env.lookup)("DATABASE_URL")
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            db_max_connections: env.parse("DB_MAX_CONNECTIONS", 20)?,
            job_queue: env.string("JOB_QUEUE", "worker_jobs"),
            prefetch_count,
            remote_call_timeout: Duration::from_secs(env.parse("REMOTE_CALL_TIMEOUT_SECS", 30)?),
            broker_poll_interval: Duration::from_millis(env.parse("BROKER_POLL_INTERVAL_MS", 250)?),
            broker_max_deliveries: env.parse("BROKER_MAX_DELIVERIES", 5)?,
            broker_requeue_backoff: Duration::from_millis(
                env.parse("BROKER_REQUEUE_BACKOFF_MS", 1000)?,
            ),
            reply_ttl: Duration::from_secs(env.parse("REPLY_TTL_SECS", 600)?),
            reply_queues: ReplyQueues {
                domain: env.string("DOMAIN_UPDATE_QUEUE", &defaults.domain),
                contact: env.string("CONTACT_UPDATE_QUEUE", &defaults.contact),
                host: env.string("HOST_UPDATE_QUEUE", &defaults.host),
                validation: env.string("VALIDATION_UPDATE_QUEUE", &defaults.validation),
            },
            shutdown_timeout: Duration::from_secs(env.parse("SHUTDOWN_TIMEOUT_SECS", 30)?),
            log_format,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, var: &str, default: &str) -> String {
        (self.lookup)(var).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.lookup)(var) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<WorkerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/ry")]).unwrap();
        assert_eq!(config.db_max_connections, 20);
        assert_eq!(config.job_queue, "worker_jobs");
        assert_eq!(config.prefetch_count, 10);
        assert_eq!(config.remote_call_timeout, Duration::from_secs(30));
        assert_eq!(config.broker_poll_interval, Duration::from_millis(250));
        assert_eq!(config.broker_max_deliveries, 5);
        assert_eq!(config.broker_requeue_backoff, Duration::from_secs(1));
        assert_eq!(config.reply_ttl, Duration::from_secs(600));
        assert_eq!(config.reply_queues, ReplyQueues::default());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn database_url_is_required() {
        assert_matches!(config(&[]), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            ("DATABASE_URL", "postgres://db/ry"),
            ("PREFETCH_COUNT", "4"),
            ("HOST_UPDATE_QUEUE", "hosts_v2"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.prefetch_count, 4);
        assert_eq!(config.reply_queues.host, "hosts_v2");
        assert_eq!(config.reply_queues.domain, "domain_provision_update");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_numbers_name_the_variable() {
        assert_matches!(
            config(&[("DATABASE_URL", "x"), ("REMOTE_CALL_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::Invalid { var: "REMOTE_CALL_TIMEOUT_SECS", .. })
        );
        assert_matches!(
            config(&[("DATABASE_URL", "x"), ("PREFETCH_COUNT", "0")]),
            Err(ConfigError::Invalid { var: "PREFETCH_COUNT", .. })
        );
    }
}

use anyhow::{Context, Result, anyhow};
use storage::services::pairing::HomeAwayPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub home_away_policy: HomeAwayPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            host: var("HOST").context("Cannot load HOST env variable")?,
            port: var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: var("DATABASE_URL").context("Cannot load DATABASE_URL env variable")?,
            database_max_connections: match var("DATABASE_MAX_CONNECTIONS") {
                Some(value) => value
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be a number")?,
                None => 5,
            },
            run_migrations: match var("RUN_MIGRATIONS") {
                Some(value) => parse_bool(&value).context("RUN_MIGRATIONS must be true or false")?,
                None => true,
            },
            home_away_policy: match var("FIXTURE_HOME_AWAY_POLICY") {
                Some(value) => value.parse::<HomeAwayPolicy>().map_err(|e| anyhow!(e))?,
                None => HomeAwayPolicy::default(),
            },
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(anyhow!("invalid boolean '{other}'")),
    }
}

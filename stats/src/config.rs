pub struct Config {
    pub database_url: String,
    pub max_db_connections: usize,
}

fn var(key: &str) -> Result<Option<String>, String> {
    match std::env::var(key) {
        Ok(env) => Ok(Some(env)),
        Err(e) => match e {
            std::env::VarError::NotPresent => Ok(None),
            std::env::VarError::NotUnicode(_) => Err(format!(
                "Could not get the environment variable `{key}` due to unicode error"
            )),
        },
    }
}

fn required_var(key: &str) -> String {
    let val = var(key);
    match val {
        Ok(val) => match val {
            Some(val) => val,
            None => {
                tracing::error!("Environment variable `{key}` is required");
                std::process::exit(1)
            }
        },
        Err(e) => {
            tracing::error!(
                "Environment variable `{key}` is required, but could not retrieve: {e}"
            );
            std::process::exit(1)
        }
    }
}

impl Config {
    pub fn new_from_env() -> Self {
        let max_db_connections = match var("MAX_DB_CONNECTIONS") {
            Ok(Some(n)) => match n.parse() {
                Ok(n) => n,
                Err(_) => {
                    tracing::warn!("Invalid MAX_DB_CONNECTIONS `{n}`, falling back to 10");
                    10
                }
            },
            _ => 10,
        };

        Config {
            database_url: required_var("DATABASE_URL"),
            max_db_connections,
        }
    }
}

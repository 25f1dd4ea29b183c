use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub session_secret: String,
    pub link_secret: String,
    pub ops_key: String,
    pub allowed_origin: String,
    pub port: u16,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let session_secret =
            env::var("SESSION_SECRET").map_err(|_| "SESSION_SECRET must be set".to_string())?;

        // Share links are signed with their own key so rotating one secret
        // does not invalidate the other.
        let link_secret =
            env::var("LINK_SECRET").map_err(|_| "LINK_SECRET must be set".to_string())?;

        let ops_key = env::var("OPS_KEY").map_err(|_| "OPS_KEY must be set".to_string())?;

        let allowed_origin =
            env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a number, got '{raw}'"))?,
            Err(_) => 8080,
        };

        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse::<u32>()
                .map_err(|_| format!("DB_MAX_CONNECTIONS must be a number, got '{raw}'"))?,
            Err(_) => 10,
        };

        Ok(Self {
            database_url,
            session_secret,
            link_secret,
            ops_key,
            allowed_origin,
            port,
            db_max_connections,
        })
    }
}

use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub env: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let mut database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://moviesdb.db?mode=rwc".to_string());
        if env == "test" {
            database_url = test_database_url(&database_url);
        }

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            env,
        })
    }

    pub fn is_test(&self) -> bool {
        self.env == "test"
    }
}

/// Appends `_test` to the database name, keeping any extension and query.
fn test_database_url(url: &str) -> String {
    if url.contains(":memory:") {
        return url.to_string();
    }
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };
    let name_start = base.rfind('/').map_or(0, |i| i + 1);
    let base = match base[name_start..].rfind('.') {
        Some(dot) => {
            let dot = name_start + dot;
            format!("{}_test{}", &base[..dot], &base[dot..])
        }
        None => format!("{base}_test"),
    };
    match query {
        Some(query) => format!("{base}?{query}"),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::test_database_url;

    #[test]
    fn test_suffix_goes_before_extension() {
        assert_eq!(
            test_database_url("sqlite://moviesdb.db?mode=rwc"),
            "sqlite://moviesdb_test.db?mode=rwc"
        );
        assert_eq!(test_database_url("sqlite://data/movies"), "sqlite://data/movies_test");
        assert_eq!(test_database_url("sqlite::memory:"), "sqlite::memory:");
    }
}

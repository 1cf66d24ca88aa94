use super::*;
use crate::MetadataError;

/// Database flavours a session can connect to, picked from the URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Dialect {
    #[display("postgres")]
    Postgres,
    #[display("mysql")]
    MySql,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split_once("://").map_or("", |(scheme, _)| scheme);
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            _ => Err(Error::invalid_argument(format!(
                "unsupported database url scheme {scheme:?}"
            ))),
        }
    }
}

/// The metadata source of whichever database a session is connected to.
#[derive(Debug, Clone)]
pub enum DatabaseSource {
    Postgres(PgMetadataSource),
    MySql(MySqlMetadataSource),
}

impl DatabaseSource {
    pub fn dialect(&self) -> Dialect {
        match self {
            DatabaseSource::Postgres(_) => Dialect::Postgres,
            DatabaseSource::MySql(_) => Dialect::MySql,
        }
    }
}

impl MetadataSource for DatabaseSource {
    async fn fetch_schema_names(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        match self {
            DatabaseSource::Postgres(source) => source.fetch_schema_names().await,
            DatabaseSource::MySql(source) => source.fetch_schema_names().await,
        }
    }

    async fn fetch_keywords(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        match self {
            DatabaseSource::Postgres(source) => source.fetch_keywords().await,
            DatabaseSource::MySql(source) => source.fetch_keywords().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("postgres://u:p@localhost/db", Dialect::Postgres)]
    #[case("postgresql://localhost", Dialect::Postgres)]
    #[case("MySQL://root@localhost:3306/shop", Dialect::MySql)]
    fn dialect_follows_url_scheme(#[case] url: &str, #[case] expected: Dialect) {
        assert_eq!(Dialect::from_url(url).expect("supported scheme"), expected);
    }

    #[rstest]
    #[case("sqlite://shop.db")]
    #[case("localhost:5432")]
    #[case("")]
    fn unsupported_urls_are_invalid(#[case] url: &str) {
        assert!(matches!(
            Dialect::from_url(url),
            Err(Error::InvalidArgument(_))
        ));
    }
}

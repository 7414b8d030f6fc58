use super::{Connection, SqliteDriver};
use crate::error::{Error, Result};

/// Open a session for a database target string.
///
/// Accepts `sqlite://path`, `:memory:`, or a bare path ending in `.db`,
/// `.sqlite` or `.sqlite3`.
pub fn open_target(target: &str) -> Result<Box<dyn Connection>> {
    if target.starts_with("mysql://")
        || target.starts_with("postgres://")
        || target.starts_with("postgresql://")
    {
        return Err(Error::UnsupportedTarget(target.to_string()));
    }

    if target == ":memory:" {
        return Ok(Box::new(SqliteDriver::open_in_memory()?));
    }

    let path = if let Some(rest) = target.strip_prefix("sqlite://") {
        rest
    } else if is_sqlite_file(target) {
        target
    } else {
        return Err(Error::UnsupportedTarget(target.to_string()));
    };

    Ok(Box::new(SqliteDriver::open(path)?))
}

fn is_sqlite_file(target: &str) -> bool {
    [".db", ".sqlite", ".sqlite3"]
        .iter()
        .any(|ext| target.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_server_targets() {
        for t in ["mysql://u:p@localhost/app", "postgres://localhost/app"] {
            assert!(matches!(open_target(t), Err(Error::UnsupportedTarget(_))));
        }
    }

    #[test]
    fn test_rejects_unknown_paths() {
        assert!(matches!(open_target("notes.txt"), Err(Error::UnsupportedTarget(_))));
    }

    #[test]
    fn test_opens_memory_and_files() {
        let conn = open_target(":memory:").unwrap();
        assert_eq!(conn.name(), "sqlite");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");
        let conn = open_target(&format!("sqlite://{}", path.display())).unwrap();
        assert_eq!(conn.database_name().unwrap(), "shop");
        let conn = open_target(path.to_str().unwrap()).unwrap();
        assert_eq!(conn.database_name().unwrap(), "shop");
    }
}

//! One-time database setup for IAM-authenticated users.
//!
//! The connect grant only lets the function request a token; the matching
//! user must exist inside the database before the first connection.

use crate::error::{Result, StackError};

/// SQL creating `user` with the IAM auth plugin and granting it `database`
pub fn bootstrap_sql(database: &str, user: &str) -> Result<String> {
    for (field, value) in [("database", database), ("user", user)] {
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StackError::invalid_property(
                "bootstrap-sql",
                field,
                format!("{value:?} must be a plain identifier"),
            ));
        }
    }

    Ok(format!(
        "CREATE USER '{user}' IDENTIFIED WITH AWSAuthenticationPlugin AS 'RDS';\n\
         GRANT ALL PRIVILEGES ON {database}.* TO '{user}';\n\
         ALTER USER '{user}' REQUIRE SSL;\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_sql() {
        let sql = bootstrap_sql("foo", "lambda").unwrap();
        assert_eq!(
            sql,
            "CREATE USER 'lambda' IDENTIFIED WITH AWSAuthenticationPlugin AS 'RDS';\n\
             GRANT ALL PRIVILEGES ON foo.* TO 'lambda';\n\
             ALTER USER 'lambda' REQUIRE SSL;\n"
        );
    }

    #[test]
    fn test_bootstrap_sql_rejects_quotes() {
        assert!(bootstrap_sql("foo", "x'; DROP TABLE t; --").is_err());
    }
}

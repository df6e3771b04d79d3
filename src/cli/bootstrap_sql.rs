//! # Bootstrap SQL Command
//!
//! Prints the one-time statements that create the IAM-authenticated user.
//! They must be run by the admin user before the function first connects.

use anyhow::{Context, Result};
use lambda_rds_stack::stack::bootstrap_sql;

pub fn bootstrap_sql_command(database: &str, user: &str) -> Result<()> {
    let sql = bootstrap_sql(database, user).context("Failed to build bootstrap SQL")?;
    print!("{sql}");
    Ok(())
}

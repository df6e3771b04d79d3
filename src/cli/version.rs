//! # Version Command

pub fn version_command() {
    println!("lambda-rds-stack {}", env!("CARGO_PKG_VERSION"));
    println!("  git:   {}", env!("BUILD_GIT_HASH"));
    println!("  built: {} ({})", env!("BUILD_DATETIME"), env!("BUILD_TIMESTAMP"));
}

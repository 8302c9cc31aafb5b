/// Get the version string for silo and libsilo
pub fn get_version_string() -> String {
    format!(
        "silo {}\nlibsilo {}",
        env!("CARGO_PKG_VERSION"),
        libsilo::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;

// crates/sandbox-verify-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starting point for `sandbox-verify config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The example spells out every default, so it parses back into the same
//! configuration as an empty file.

/// Returns a canonical example `sandbox-verify.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[sandbox]
image = "ubuntu:24.04"
source = "."
mount_path = "/app"
keepalive = ["tail", "-f", "/dev/null"]
shell = ["/bin/sh", "-c"]
startup_timeout_secs = 300

[sandbox.env]
DEBIAN_FRONTEND = "noninteractive"

[run]
# 0 disables the whole-run timeout.
timeout_secs = 0

[dependencies]
refresh_command = "apt-get update"
install_command = "apt-get install -y"
packages = ["build-essential", "libssl-dev", "pkg-config", "gettext", "cargo", "cmake", "clang"]

[build]
script = "./build-deb.sh"
output_dir = "build"

[artifact]
pattern = "*.deb"
product_token = "amazon-efs-utils"
install_command = "apt-get install -y"

[identity]
command = "mount.efs --version"
token = "mount.efs"
"#,
    )
}

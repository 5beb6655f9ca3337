// system-tests/tests/helpers/fixtures.rs
// ============================================================================
// Module: Package Fixtures
// Description: Minimal Debian packaging trees for end-to-end runs.
// Purpose: Give the verification plan a real build script to execute.
// Dependencies: sandbox-verify-core, system-tests, tempfile
// ============================================================================

//! ## Overview
//! [`PackageFixture`] writes a source tree whose `build-deb.sh` uses
//! `dpkg-deb` to produce `build/amazon-efs-utils_2.1.0_all.deb`. A healthy
//! fixture ships `mount.efs`; a broken one ships only documentation, so the
//! identity step fails after a successful install.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;

use sandbox_verify_core::Binding;
use sandbox_verify_core::PackagingProfile;
use sandbox_verify_core::SandboxRequest;
use system_tests::config::SystemTestConfig;
use tempfile::TempDir;

/// Output line printed by the fixture `mount.efs`.
pub const IDENTITY_OUTPUT: &str = "mount.efs version 2.1.0";

/// Build script header shared by both fixture variants.
const BUILD_SCRIPT_HEAD: &str = r#"#!/bin/sh
set -eu
root="$(mktemp -d)"
mkdir -p "$root/DEBIAN" "$root/usr/share/doc/amazon-efs-utils" build
cat > "$root/DEBIAN/control" <<'CONTROL'
Package: amazon-efs-utils
Version: 2.1.0
Architecture: all
Maintainer: System Tests <system-tests@localhost>
Description: Fixture package for sandbox verification
CONTROL
echo "fixture" > "$root/usr/share/doc/amazon-efs-utils/README"
"#;

/// Build script lines installing the `mount.efs` helper.
const BUILD_SCRIPT_HELPER: &str = r#"mkdir -p "$root/usr/local/bin"
cat > "$root/usr/local/bin/mount.efs" <<'HELPER'
#!/bin/sh
echo "mount.efs version 2.1.0"
HELPER
chmod 0755 "$root/usr/local/bin/mount.efs"
"#;

/// Build script footer producing the package.
const BUILD_SCRIPT_TAIL: &str = r#"dpkg-deb --build "$root" build/amazon-efs-utils_2.1.0_all.deb
"#;

/// Source tree bound into the sandbox.
pub struct PackageFixture {
    /// Temporary source directory.
    dir: TempDir,
}

impl PackageFixture {
    /// Writes a fixture whose package provides `mount.efs`.
    pub fn healthy() -> Result<Self, String> {
        Self::write(true)
    }

    /// Writes a fixture whose package lacks `mount.efs`.
    pub fn without_helper() -> Result<Self, String> {
        Self::write(false)
    }

    fn write(with_helper: bool) -> Result<Self, String> {
        let dir = tempfile::Builder::new()
            .prefix("sandbox-verify-fixture-")
            .tempdir()
            .map_err(|err| format!("create fixture dir: {err}"))?;
        let mut script = BUILD_SCRIPT_HEAD.to_string();
        if with_helper {
            script.push_str(BUILD_SCRIPT_HELPER);
        }
        script.push_str(BUILD_SCRIPT_TAIL);
        let path = dir.path().join("build-deb.sh");
        fs::write(&path, script).map_err(|err| format!("write build script: {err}"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .map_err(|err| format!("chmod build script: {err}"))?;
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o777))
            .map_err(|err| format!("chmod fixture dir: {err}"))?;
        Ok(Self {
            dir,
        })
    }

    /// Returns the host source directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Builds a request for the configured system-test image.
    pub fn request(&self) -> Result<SandboxRequest, String> {
        let config = SystemTestConfig::load()?;
        Ok(SandboxRequest::new(config.image, Binding::new(self.path(), "/app")))
    }

    /// Writes a `sandbox-verify.toml` pointing at this fixture and returns its path.
    pub fn write_config(&self) -> Result<PathBuf, String> {
        let config = SystemTestConfig::load()?;
        let contents = format!(
            "[sandbox]\nimage = \"{}\"\nsource = \".\"\n\n[dependencies]\npackages = []\n",
            config.image
        );
        let path = self.path().join("sandbox-verify.toml");
        fs::write(&path, contents).map_err(|err| format!("write config: {err}"))?;
        Ok(path)
    }

    /// Keeps the directory on disk when requested by the environment.
    pub fn finish(self) {
        let keep = SystemTestConfig::load().is_ok_and(|config| config.keep_workdir);
        if keep {
            let _ = self.dir.keep();
        }
    }
}

/// Default profile without the heavy toolchain packages.
pub fn light_profile() -> PackagingProfile {
    PackagingProfile {
        packages: Vec::new(),
        ..PackagingProfile::default()
    }
}

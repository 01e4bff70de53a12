//! VirtualBox guest additions image layout.

pub const DOWNLOAD_BASE: &str = "https://download.virtualbox.org/virtualbox";
pub const MOUNT_POINT: &str = "/media/VBoxGuestAdditions";
pub const INSTALLER: &str = "VBoxLinuxAdditions.run";

/// Build prerequisites for the kernel modules.
pub const BUILD_DEPS_INSTALL: &str =
    "apt-get install -y -qq linux-headers-$(uname -r) build-essential dkms";

/// One guest additions release.
#[derive(Debug, Clone, Copy)]
pub struct GuestAdditions<'a> {
    version: &'a str,
}

impl<'a> GuestAdditions<'a> {
    #[must_use]
    pub fn new(version: &'a str) -> Self {
        Self { version }
    }

    /// ISO file name, downloaded into the login user's home directory.
    #[must_use]
    pub fn iso_name(&self) -> String {
        format!("VBoxGuestAdditions_{}.iso", self.version)
    }

    #[must_use]
    pub fn download_url(&self) -> String {
        format!("{DOWNLOAD_BASE}/{}/{}", self.version, self.iso_name())
    }

    #[must_use]
    pub fn installer_path(&self) -> String {
        format!("{MOUNT_POINT}/{INSTALLER}")
    }
}

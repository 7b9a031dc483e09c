//! Mutation operations against the print registration store
//!
//! The executor drives convergence exclusively through this trait, so the
//! whole retry/recovery behavior is testable with a fake store. Methods
//! take `&self`; implementations that track state use interior mutability.

use crate::error::Result;

/// Write access to the print registration store
pub trait PrintStore {
    /// Register a driver, staging the package first when a path is given
    fn install_driver(&self, identity: &str, package_path: &str) -> Result<()>;

    /// Create a TCP/IP port bound to an address
    fn create_port(&self, name: &str, address: &str) -> Result<()>;

    /// Create a device object on an existing port with an installed driver
    fn create_device(&self, name: &str, port: &str, driver: &str) -> Result<()>;

    /// Remove a device object
    fn remove_device(&self, name: &str) -> Result<()>;

    /// Remove a port
    ///
    /// Can fail while the spooling service still holds a handle on it;
    /// callers apply the recovery ladder in that case.
    fn remove_port(&self, name: &str) -> Result<()>;

    /// Restart the OS print spooling service
    fn restart_spooler(&self) -> Result<()>;

    /// Apply one configuration setting to a device
    fn set_feature(&self, device: &str, key: &str, value: &str) -> Result<()>;

    /// Names of device objects still bound to a port
    ///
    /// Used by the port-removal recovery ladder to find strays.
    fn devices_on_port(&self, port: &str) -> Result<Vec<String>>;
}

//! State prober trait
//!
//! Read-only view of the device registration store. Implementations query
//! the OS; tests use an in-memory fake. Absence is a valid answer, not an
//! error: only an unreachable store produces `Error::Probe`.

use crate::device::{normalize_address, DesiredDevice, MatchResult, ObservedDevice};
use crate::error::Result;

/// Read access to the device registration store
///
/// The three lookups are deliberately independent and not guaranteed to be
/// mutually consistent: a device can be registered under a different port
/// or address than the one declared for it.
pub trait StateProber {
    /// Look up a registered device by its logical name
    fn probe_by_name(&self, name: &str) -> Result<Option<ObservedDevice>>;

    /// Look up a registered device through a port whose name or bound
    /// address contains the given fragment
    fn probe_by_port(&self, address_fragment: &str) -> Result<Option<ObservedDevice>>;

    /// Look up a registered device bound to exactly this address
    fn probe_by_address(&self, address: &str) -> Result<Option<ObservedDevice>>;

    /// Assemble all three lookups for one desired device
    ///
    /// Port and address probes are skipped when the entry declares no
    /// address (removal entries may omit it).
    fn match_desired(&self, desired: &DesiredDevice) -> Result<MatchResult> {
        let by_name = self.probe_by_name(&desired.name)?;
        let address = normalize_address(&desired.address);
        let (by_port, by_address) = if address.is_empty() {
            (None, None)
        } else {
            (
                self.probe_by_port(&address)?,
                self.probe_by_address(&address)?,
            )
        };
        Ok(MatchResult {
            by_name,
            by_port,
            by_address,
        })
    }
}

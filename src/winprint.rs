//! PowerShell-backed print store
//!
//! Concrete `StateProber` and `PrintStore` over the Windows printing
//! cmdlets. Pure glue: probes run `Get-Printer`/`Get-PrinterPort` and parse
//! their JSON, mutations map one-to-one onto the corresponding cmdlet.
//!
//! Probe scripts run with `-ErrorAction Stop`. A non-zero exit maps to
//! absence only when it is a lookup miss (the scripts' own not-found exit
//! code, or an ObjectNotFound-class stderr); any other failure, including a
//! spooler/WMI store that cannot be reached, is reported as `Error::Probe`
//! so the engine records a probe failure instead of planning an install
//! against a dead store.
//!
//! Feature keys are passed through as `Set-PrintConfiguration` parameter
//! names (restricted to an identifier charset) with verbatim values
//! (e.g. `DuplexingMode` -> `TwoSidedLongEdge`, `Color` -> `$false`);
//! vendor module settings go through the same call with the module type
//! as the key.

use reconcile::{Error, ObservedDevice, PrintStore, Result, StateProber};
use serde::Deserialize;
use std::process::{Command, Output};

pub struct WinPrintStore;

impl WinPrintStore {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, script: &str) -> std::io::Result<Output> {
        log::trace!("powershell: {}", script);
        Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .output()
    }

    /// Run a probe script, distinguishing a lookup miss from an
    /// unreachable store
    fn probe(&self, script: &str) -> Result<Option<String>> {
        let output = self
            .run(script)
            .map_err(|e| Error::Probe(e.to_string()))?;
        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).to_string()));
        }
        if output.status.code() == Some(NOT_FOUND_EXIT) {
            return Ok(None);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_not_found(&stderr) {
            return Ok(None);
        }
        Err(Error::Probe(stderr.trim().to_string()))
    }

    /// Run a mutation script, mapping any failure to `Error::Mutation`
    fn mutate(&self, operation: &'static str, target: &str, script: &str) -> Result<()> {
        let output = self
            .run(script)
            .map_err(|e| Error::mutation(operation, target, e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::mutation(operation, target, stderr.trim()));
        }
        Ok(())
    }
}

impl Default for WinPrintStore {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON shape emitted by the probe scripts
#[derive(Deserialize)]
struct PsPrinter {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "PortName", default)]
    port_name: String,
    #[serde(rename = "DriverName", default)]
    driver: String,
    #[serde(rename = "Address", default)]
    address: String,
}

fn parse_printer(json: &str) -> Result<ObservedDevice> {
    let printer: PsPrinter = serde_json::from_str(json.trim())
        .map_err(|e| Error::Probe(format!("unparseable printer record: {e}")))?;
    Ok(ObservedDevice {
        name: printer.name,
        port_name: printer.port_name,
        driver: printer.driver,
        address: printer.address,
    })
}

/// Escape a value for single-quoted PowerShell string literals
fn ps_quote(value: &str) -> String {
    value.replace('\'', "''")
}

/// Exit code the probe scripts use for a deliberate lookup miss
const NOT_FOUND_EXIT: i32 = 3;

/// Whether a failed probe's stderr is a lookup miss rather than a store
/// that could not be reached
fn is_not_found(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("objectnotfound")
        || stderr.contains("no msft_printer objects found")
        || stderr.contains("no msft_printerport objects found")
}

/// Feature keys become cmdlet parameter names, so they must stay within
/// an identifier charset; anything else would splice into the script
fn is_valid_feature_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Script fragment emitting one printer + its port address as JSON
const EMIT_PRINTER: &str = "[pscustomobject]@{ Name = $p.Name; PortName = $p.PortName; \
     DriverName = $p.DriverName; Address = \"$($port.PrinterHostAddress)\" } \
     | ConvertTo-Json -Compress";

impl StateProber for WinPrintStore {
    fn probe_by_name(&self, name: &str) -> Result<Option<ObservedDevice>> {
        let script = format!(
            "$ErrorActionPreference = 'Stop'; \
             $p = Get-Printer -Name '{name}'; \
             $port = Get-PrinterPort -Name $p.PortName -ErrorAction SilentlyContinue; \
             {EMIT_PRINTER}",
            name = ps_quote(name),
        );
        match self.probe(&script)? {
            Some(json) => Ok(Some(parse_printer(&json)?)),
            None => Ok(None),
        }
    }

    fn probe_by_port(&self, address_fragment: &str) -> Result<Option<ObservedDevice>> {
        let script = format!(
            "$ErrorActionPreference = 'Stop'; \
             $frag = '{frag}'; \
             $port = Get-PrinterPort | Where-Object {{ $_.Name -like \"*$frag*\" \
               -or \"$($_.PrinterHostAddress)\" -eq $frag }} | Select-Object -First 1; \
             if (-not $port) {{ exit 3 }}; \
             $p = Get-Printer | Where-Object {{ $_.PortName -eq $port.Name }} \
               | Select-Object -First 1; \
             if (-not $p) {{ exit 3 }}; \
             {EMIT_PRINTER}",
            frag = ps_quote(address_fragment),
        );
        match self.probe(&script)? {
            Some(json) => Ok(Some(parse_printer(&json)?)),
            None => Ok(None),
        }
    }

    fn probe_by_address(&self, address: &str) -> Result<Option<ObservedDevice>> {
        let script = format!(
            "$ErrorActionPreference = 'Stop'; \
             $port = Get-PrinterPort | Where-Object {{ \
               \"$($_.PrinterHostAddress)\" -eq '{address}' }} | Select-Object -First 1; \
             if (-not $port) {{ exit 3 }}; \
             $p = Get-Printer | Where-Object {{ $_.PortName -eq $port.Name }} \
               | Select-Object -First 1; \
             if (-not $p) {{ exit 3 }}; \
             {EMIT_PRINTER}",
            address = ps_quote(address),
        );
        match self.probe(&script)? {
            Some(json) => Ok(Some(parse_printer(&json)?)),
            None => Ok(None),
        }
    }
}

impl PrintStore for WinPrintStore {
    fn install_driver(&self, identity: &str, package_path: &str) -> Result<()> {
        let script = if package_path.trim().is_empty() {
            format!("Add-PrinterDriver -Name '{}'", ps_quote(identity))
        } else {
            // stage the package into the driver store first
            format!(
                "pnputil.exe /add-driver '{}' /install | Out-Null; \
                 Add-PrinterDriver -Name '{}'",
                ps_quote(package_path),
                ps_quote(identity),
            )
        };
        self.mutate("install_driver", identity, &script)
    }

    fn create_port(&self, name: &str, address: &str) -> Result<()> {
        let script = format!(
            "Add-PrinterPort -Name '{}' -PrinterHostAddress '{}'",
            ps_quote(name),
            ps_quote(address),
        );
        self.mutate("create_port", name, &script)
    }

    fn create_device(&self, name: &str, port: &str, driver: &str) -> Result<()> {
        let script = format!(
            "Add-Printer -Name '{}' -PortName '{}' -DriverName '{}'",
            ps_quote(name),
            ps_quote(port),
            ps_quote(driver),
        );
        self.mutate("create_device", name, &script)
    }

    fn remove_device(&self, name: &str) -> Result<()> {
        let script = format!("Remove-Printer -Name '{}'", ps_quote(name));
        self.mutate("remove_device", name, &script)
    }

    fn remove_port(&self, name: &str) -> Result<()> {
        let script = format!("Remove-PrinterPort -Name '{}'", ps_quote(name));
        self.mutate("remove_port", name, &script)
    }

    fn restart_spooler(&self) -> Result<()> {
        self.mutate(
            "restart_spooler",
            "Spooler",
            "Restart-Service -Name Spooler -Force",
        )
    }

    fn set_feature(&self, device: &str, key: &str, value: &str) -> Result<()> {
        if !is_valid_feature_key(key) {
            return Err(Error::mutation(
                "set_feature",
                device,
                format!("invalid feature key {key:?}"),
            ));
        }
        let script = format!(
            "Set-PrintConfiguration -PrinterName '{}' -{} {}",
            ps_quote(device),
            key,
            value,
        );
        self.mutate("set_feature", device, &script)
    }

    fn devices_on_port(&self, port: &str) -> Result<Vec<String>> {
        let script = format!(
            "Get-Printer | Where-Object {{ $_.PortName -eq '{}' }} \
             | Select-Object -ExpandProperty Name",
            ps_quote(port),
        );
        match self.probe(&script)? {
            Some(stdout) => Ok(stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect()),
            None => Ok(Vec::new()),
        }
    }
}

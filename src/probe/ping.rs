use crate::prober::{ProbeError, Prober, Reachability};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

const PING_PACKET_COUNT: &str = "1";
const MIN_UNIX_WAIT_SECS: u64 = 1;
// Socket creation only; send-time refusals are per destination
const PRIVILEGE_MARKERS: [&str; 2] = ["socket: operation not permitted", "socket: permission denied"];

/// Which `ping` command-line dialect to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingFlavor {
    Linux,
    MacOs,
    Windows,
}

impl PingFlavor {
    pub fn host() -> Self {
        if cfg!(windows) {
            PingFlavor::Windows
        } else if cfg!(target_os = "macos") {
            PingFlavor::MacOs
        } else {
            PingFlavor::Linux
        }
    }

    /// Program and arguments for a single echo request to `address`.
    pub fn command_line(&self, address: IpAddr, timeout: Duration) -> (&'static str, Vec<String>) {
        let target = address.to_string();
        match self {
            PingFlavor::Windows => (
                "ping",
                vec![
                    "-n".into(),
                    PING_PACKET_COUNT.into(),
                    "-w".into(),
                    timeout.as_millis().to_string(),
                    target,
                ],
            ),
            PingFlavor::MacOs if address.is_ipv6() => {
                ("ping6", vec!["-c".into(), PING_PACKET_COUNT.into(), target])
            }
            PingFlavor::MacOs => (
                "ping",
                vec![
                    "-n".into(),
                    "-c".into(),
                    PING_PACKET_COUNT.into(),
                    "-W".into(),
                    timeout.as_millis().to_string(),
                    target,
                ],
            ),
            PingFlavor::Linux => {
                // iputils only takes whole seconds here
                let secs = (timeout.as_secs_f64().round() as u64).max(MIN_UNIX_WAIT_SECS);
                (
                    "ping",
                    vec![
                        "-n".into(),
                        "-c".into(),
                        PING_PACKET_COUNT.into(),
                        "-W".into(),
                        secs.to_string(),
                        target,
                    ],
                )
            }
        }
    }
}

/// Probes hosts with the system `ping` executable.
#[derive(Debug, Clone)]
pub struct PingProber {
    flavor: PingFlavor,
}

impl PingProber {
    pub fn new(flavor: PingFlavor) -> Self {
        log::debug!("[probe::ping] new: flavor={:?}", flavor);
        Self { flavor }
    }

    pub fn flavor(&self) -> PingFlavor {
        self.flavor
    }
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new(PingFlavor::host())
    }
}

fn is_privilege_failure(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    PRIVILEGE_MARKERS.iter().any(|m| lowered.contains(m))
}

#[async_trait]
impl Prober for PingProber {
    fn name(&self) -> &'static str {
        "ping"
    }

    async fn probe(&self, address: IpAddr, timeout: Duration) -> Result<Reachability, ProbeError> {
        let (program, args) = self.flavor.command_line(address, timeout);
        log::trace!("[probe::ping] probe: address={} program={} args={:?}", address, program, args);

        let probe_start = Instant::now();
        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                log::error!("[probe::ping] spawn_failed: address={} program={} error={}", address, program, e);
                let reason = match e.kind() {
                    ErrorKind::NotFound => format!("`{program}` executable not found"),
                    ErrorKind::PermissionDenied => format!("not permitted to run `{program}`"),
                    _ => format!("failed to run `{program}`: {e}"),
                };
                return Err(ProbeError::new(address, reason));
            }
        };

        // Dropping the wait future on timeout kills the child.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                log::error!("[probe::ping] wait_failed: address={} error={}", address, e);
                return Err(ProbeError::new(address, format!("failed to wait for `{program}`: {e}")));
            }
            Err(_) => {
                log::trace!("[probe::ping] timed_out: address={} timeout={}ms", address, timeout.as_millis());
                return Ok(Reachability::Unreachable);
            }
        };

        let duration = probe_start.elapsed();
        if output.status.success() {
            log::trace!("[probe::ping] reachable: address={} duration={}ms", address, duration.as_millis());
            return Ok(Reachability::Reachable);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_privilege_failure(&stderr) {
            log::error!("[probe::ping] not_permitted: address={} stderr={}", address, stderr.trim());
            return Err(ProbeError::new(address, stderr.trim().to_string()));
        }

        log::trace!("[probe::ping] unreachable: address={} status={} duration={}ms",
            address, output.status, duration.as_millis());
        Ok(Reachability::Unreachable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const V4: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));

    #[test]
    fn test_linux_command_rounds_to_whole_seconds() {
        let (program, args) = PingFlavor::Linux.command_line(V4, Duration::from_millis(700));
        assert_eq!(program, "ping");
        assert_eq!(args, vec!["-n", "-c", "1", "-W", "1", "192.0.2.1"]);

        let (_, args) = PingFlavor::Linux.command_line(V4, Duration::from_millis(2600));
        assert_eq!(args[4], "3");

        let (_, args) = PingFlavor::Linux.command_line(V4, Duration::from_millis(100));
        assert_eq!(args[4], "1");
    }

    #[test]
    fn test_windows_command_uses_milliseconds() {
        let (program, args) = PingFlavor::Windows.command_line(V4, Duration::from_millis(700));
        assert_eq!(program, "ping");
        assert_eq!(args, vec!["-n", "1", "-w", "700", "192.0.2.1"]);
    }

    #[test]
    fn test_macos_command_variants() {
        let (program, args) = PingFlavor::MacOs.command_line(V4, Duration::from_millis(1500));
        assert_eq!(program, "ping");
        assert!(args.contains(&"1500".to_string()));

        let v6 = IpAddr::V6(Ipv6Addr::LOCALHOST);
        let (program, args) = PingFlavor::MacOs.command_line(v6, Duration::from_millis(1500));
        assert_eq!(program, "ping6");
        assert_eq!(args.last().map(String::as_str), Some("::1"));
    }

    #[test]
    fn test_privilege_failure_detection() {
        assert!(is_privilege_failure("ping: socket: Operation not permitted\n"));
        assert!(is_privilege_failure("ping: socket: Permission denied"));
        assert!(!is_privilege_failure("1 packets transmitted, 0 received, 100% packet loss"));
        assert!(!is_privilege_failure(""));
    }

    #[test]
    fn test_firewalled_destination_is_not_privilege_failure() {
        assert!(!is_privilege_failure("ping: sendmsg: Operation not permitted\n"));
        assert!(!is_privilege_failure("ping: sendto: Permission denied"));
    }

    #[test]
    fn test_default_matches_host() {
        assert_eq!(PingProber::default().flavor(), PingFlavor::host());
        assert_eq!(PingProber::default().name(), "ping");
    }

    #[tokio::test]
    async fn test_timeout_is_unreachable_not_error() {
        let prober = PingProber::default();

        // RFC5737 test address; should never answer.
        match prober.probe(V4, Duration::from_millis(50)).await {
            Ok(status) => assert_eq!(status, Reachability::Unreachable),
            Err(e) => {
                // Containers without ping or ICMP privilege
                println!("Ping unavailable (might be expected): {}", e);
            }
        }
    }

    #[tokio::test]
    async fn test_ping_localhost() {
        let prober = PingProber::default();
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);

        match prober.probe(localhost, Duration::from_secs(2)).await {
            Ok(_) => {}
            Err(e) => println!("Ping to localhost failed (might be expected): {}", e),
        }
    }
}

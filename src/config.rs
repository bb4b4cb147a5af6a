use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};

pub const APP_NAME: &str = "ec2-to-vdc";
const CONFIG_NAME: &str = "adapter";

/// Adapter settings, read once at startup and shared read-only by every request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AdapterConfig {
    /// Address the EC2 endpoint listens on
    pub listen: SocketAddr,
    pub web_api_location: String,
    pub web_api_port: u16,
    /// Path prefix of the VDC API, e.g. `/api`
    pub web_api_path: String,
    pub use_ssl: bool,
    pub accept_invalid_certs: bool,
    /// Upper bound on instances started by a single RunInstances
    pub max_instances_to_start: u32,
    /// Log the decoded parameters of every request
    pub verbose_requests: bool,
    pub network_pool_id: String,
    pub host_node_id: Option<String>,
    /// Literal emitted as `<hypervisor>` in responses
    pub hypervisor: String,
    /// Pause between consecutive create calls of a RunInstances batch
    pub create_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8773)),
            web_api_location: "127.0.0.1".to_string(),
            web_api_port: 9001,
            web_api_path: "/api".to_string(),
            use_ssl: false,
            accept_invalid_certs: false,
            max_instances_to_start: 10,
            verbose_requests: false,
            network_pool_id: "nw-demo1".to_string(),
            host_node_id: None,
            hypervisor: "kvm".to_string(),
            create_delay_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

impl AdapterConfig {
    /// Load from `path`, or from the platform config directory when none is
    /// given. A missing file is created with the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, confy::ConfyError> {
        match path {
            Some(path) => confy::load_path(path),
            None => confy::load(APP_NAME, Some(CONFIG_NAME)),
        }
    }

    pub fn file_path(path: Option<&Path>) -> Result<std::path::PathBuf, confy::ConfyError> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => confy::get_configuration_file_path(APP_NAME, Some(CONFIG_NAME)),
        }
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!(
            "{scheme}://{host}:{port}{path}",
            host = self.web_api_location,
            port = self.web_api_port,
            path = self.web_api_path.trim_end_matches('/'),
        )
    }

    pub fn create_delay(&self) -> Duration {
        Duration::from_millis(self.create_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

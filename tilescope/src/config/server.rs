use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
	/// IP to bind to. Default: 0.0.0.0
	pub ip: Option<String>,

	/// TCP port to bind to. Default: 8080
	pub port: Option<u16>,

	/// Only serve `/status`.
	pub disable_api: Option<bool>,

	/// Hard limit for one request in seconds. Default: 300
	pub request_timeout_seconds: Option<u64>,
}

impl ServerConfig {
	pub fn override_optional_ip(&mut self, ip: Option<&str>) {
		if let Some(ip) = ip {
			self.ip = Some(ip.to_string());
		}
	}

	pub fn override_optional_port(&mut self, port: Option<u16>) {
		if port.is_some() {
			self.port = port;
		}
	}

	pub fn override_optional_disable_api(&mut self, disable_api: Option<bool>) {
		if disable_api.is_some() {
			self.disable_api = disable_api;
		}
	}
}

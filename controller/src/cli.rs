use std::{fmt, path::PathBuf, str::FromStr};

use clap::Parser;
use url::{Host, Url};

#[derive(Debug, Parser)]
#[command(name = "roomtemp-controller", version, about = "Schedule and override driven room thermostat")]
pub struct Args {
    /// Full URL of the MQTT broker, e.g. tcp://127.0.0.1:1883
    #[arg(long, default_value = "tcp://127.0.0.1:1883")]
    pub broker: String,

    /// Client id used for the MQTT connection
    #[arg(long = "clientid", default_value = "thermostat")]
    pub client_id: String,

    /// YAML file with the MQTT topic mappings
    #[arg(long, default_value = "/config.yaml")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerUrlError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),
    #[error("unsupported scheme '{0}', expected tcp:// or mqtt://")]
    UnsupportedScheme(String),
    #[error("missing host")]
    MissingHost,
    #[error("port 0 is not a valid broker port")]
    ZeroPort,
}

/// Plain TCP broker address, with credentials when the URL carries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerUrl {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl FromStr for BrokerUrl {
    type Err = BrokerUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        if !matches!(url.scheme(), "tcp" | "mqtt") {
            return Err(BrokerUrlError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(BrokerUrlError::MissingHost),
        };

        let port = url.port().unwrap_or(1883);
        if port == 0 {
            return Err(BrokerUrlError::ZeroPort);
        }

        Ok(Self {
            host,
            port,
            username: Some(url.username())
                .filter(|user| !user.is_empty())
                .map(str::to_string),
            password: url.password().map(str::to_string),
        })
    }
}

impl fmt::Display for BrokerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "tcp://[{}]:{}", self.host, self.port)
        } else {
            write!(f, "tcp://{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_flags() {
        let args = Args::parse_from(["roomtemp-controller"]);

        assert_eq!(args.broker, "tcp://127.0.0.1:1883");
        assert_eq!(args.client_id, "thermostat");
        assert_eq!(args.config, PathBuf::from("/config.yaml"));
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "roomtemp-controller",
            "--broker",
            "mqtt://broker.lan:1884",
            "--clientid",
            "livingroom",
            "--config",
            "/etc/roomtemp.yaml",
        ]);

        assert_eq!(args.broker, "mqtt://broker.lan:1884");
        assert_eq!(args.client_id, "livingroom");
        assert_eq!(args.config, PathBuf::from("/etc/roomtemp.yaml"));
    }

    fn broker(host: &str, port: u16) -> BrokerUrl {
        BrokerUrl {
            host: host.to_string(),
            port,
            username: None,
            password: None,
        }
    }

    #[test]
    fn parses_broker_urls() {
        assert_eq!(
            "tcp://127.0.0.1:1883".parse::<BrokerUrl>(),
            Ok(broker("127.0.0.1", 1883))
        );
        assert_eq!(
            "mqtt://broker.lan/".parse::<BrokerUrl>(),
            Ok(broker("broker.lan", 1883))
        );
        assert_eq!(
            "tcp://broker:1883?x=1".parse::<BrokerUrl>(),
            Ok(broker("broker", 1883))
        );
    }

    #[test]
    fn bracketed_ipv6_host() {
        let url = "tcp://[::1]".parse::<BrokerUrl>().unwrap();

        assert_eq!(url, broker("::1", 1883));
        assert_eq!(url.to_string(), "tcp://[::1]:1883");
    }

    #[test]
    fn userinfo_becomes_credentials() {
        let url = "tcp://user:pw@broker:1884".parse::<BrokerUrl>().unwrap();

        assert_eq!(url.host, "broker");
        assert_eq!(url.port, 1884);
        assert_eq!(url.username.as_deref(), Some("user"));
        assert_eq!(url.password.as_deref(), Some("pw"));
    }

    #[test]
    fn rejects_bad_broker_urls() {
        assert!(matches!(
            "127.0.0.1:1883".parse::<BrokerUrl>(),
            Err(BrokerUrlError::Parse(_))
        ));
        assert_eq!(
            "ssl://broker:8883".parse::<BrokerUrl>(),
            Err(BrokerUrlError::UnsupportedScheme("ssl".to_string()))
        );
        assert!("tcp://:1883".parse::<BrokerUrl>().is_err());
        assert!(matches!(
            "tcp://broker:http".parse::<BrokerUrl>(),
            Err(BrokerUrlError::Parse(url::ParseError::InvalidPort))
        ));
        assert_eq!(
            "tcp://broker:0".parse::<BrokerUrl>(),
            Err(BrokerUrlError::ZeroPort)
        );
    }
}

//! Bus topic naming and presence payloads.

/// Application name used in the presence topic and the client identifier.
pub const APP_NAME: &str = "mqtt-powermunin";

/// Online/offline state announced on the presence topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Online,
    Offline,
}

impl Presence {
    /// Retained payload for this state.
    #[must_use]
    pub fn payload(self) -> &'static str {
        match self {
            Self::Online => "1",
            Self::Offline => "0",
        }
    }
}

/// Topic layout for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    presence: String,
    data_prefix: String,
}

impl Topics {
    /// Build the topic layout.
    ///
    /// `subtopic` is inserted verbatim between `raw/<fqdn>` and the device
    /// name, so it normally starts and ends with `/`.
    #[must_use]
    pub fn new(fqdn: &str, app_name: &str, subtopic: &str) -> Self {
        Self {
            presence: format!("clients/{fqdn}/{app_name}/state"),
            data_prefix: format!("raw/{fqdn}{subtopic}"),
        }
    }

    /// Retained presence topic, also used as the last will.
    #[must_use]
    pub fn presence(&self) -> &str {
        &self.presence
    }

    #[must_use]
    pub fn watt_hours(&self, device_name: &str) -> String {
        format!("{}{device_name}/watthours", self.data_prefix)
    }

    #[must_use]
    pub fn watts(&self, device_name: &str) -> String {
        format!("{}{device_name}/watts", self.data_prefix)
    }
}

//! Requested device actions and their wire encoding.

use thiserror::Error;

/// A sensor read request. Sensor and model are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorQuery {
    port: String,
    pin: i32,
    sensor: String,
    model: String,
}

impl SensorQuery {
    pub fn new(
        port: impl Into<String>,
        pin: i32,
        sensor: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ActionError> {
        let sensor = sensor.into();
        let model = model.into();
        if sensor.is_empty() {
            return Err(ActionError::EmptySensor);
        }
        if model.is_empty() {
            return Err(ActionError::EmptyModel);
        }
        Ok(Self {
            port: port.into(),
            pin,
            sensor,
            model,
        })
    }

    pub fn sensor(&self) -> &str {
        &self.sensor
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Invalid action descriptor.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    #[error("sensor must not be empty")]
    EmptySensor,
    #[error("model must not be empty")]
    EmptyModel,
}

/// What the caller wants the device to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetPinOn { port: String, pin: i32 },
    SetPinOff { port: String, pin: i32 },
    GetSensor(SensorQuery),
}

impl Action {
    pub fn pin_on(port: impl Into<String>, pin: i32) -> Self {
        Self::SetPinOn {
            port: port.into(),
            pin,
        }
    }

    pub fn pin_off(port: impl Into<String>, pin: i32) -> Self {
        Self::SetPinOff {
            port: port.into(),
            pin,
        }
    }

    pub fn get_sensor(
        port: impl Into<String>,
        pin: i32,
        sensor: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ActionError> {
        SensorQuery::new(port, pin, sensor, model).map(Self::GetSensor)
    }

    /// Name of the serial port the action targets.
    pub fn port_name(&self) -> &str {
        match self {
            Self::SetPinOn { port, .. } | Self::SetPinOff { port, .. } => port,
            Self::GetSensor(query) => &query.port,
        }
    }

    pub fn pin(&self) -> i32 {
        match self {
            Self::SetPinOn { pin, .. } | Self::SetPinOff { pin, .. } => *pin,
            Self::GetSensor(query) => query.pin,
        }
    }

    /// The `action` verb sent to the device.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::SetPinOn { .. } => "on",
            Self::SetPinOff { .. } => "off",
            Self::GetSensor(_) => "get",
        }
    }

    /// Single-line JSON command for the device.
    ///
    /// The layout is fixed byte for byte. Sensor and model are inserted
    /// without escaping, so embedded quotes reach the device unchanged.
    pub fn encode(&self) -> String {
        match self {
            Self::SetPinOn { pin, .. } | Self::SetPinOff { pin, .. } => {
                format!(r#"{{"action": "{}", "pin": {}}}"#, self.verb(), pin)
            }
            Self::GetSensor(query) => format!(
                r#"{{"action": "get", "sensor": "{}", "pin": {}, "model": "{}"}}"#,
                query.sensor, query.pin, query.model
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_pin_on() {
        assert_eq!(
            Action::pin_on("/dev/ttyUSB0", 5).encode(),
            r#"{"action": "on", "pin": 5}"#
        );
    }

    #[test]
    fn test_encode_pin_off() {
        assert_eq!(
            Action::pin_off("/dev/ttyUSB0", 13).encode(),
            r#"{"action": "off", "pin": 13}"#
        );
    }

    #[test]
    fn test_encode_get_sensor() {
        let action = Action::get_sensor("/dev/ttyUSB0", 4, "dht22", "dht22").unwrap();
        assert_eq!(
            action.encode(),
            r#"{"action": "get", "sensor": "dht22", "pin": 4, "model": "dht22"}"#
        );
    }

    #[test]
    fn test_encode_does_not_escape() {
        let action = Action::get_sensor("p", 1, r#"a"b"#, "m").unwrap();
        assert_eq!(
            action.encode(),
            r#"{"action": "get", "sensor": "a"b", "pin": 1, "model": "m"}"#
        );
    }

    #[test]
    fn test_encode_negative_pin() {
        assert_eq!(
            Action::pin_on("p", -1).encode(),
            r#"{"action": "on", "pin": -1}"#
        );
    }

    #[test]
    fn test_get_sensor_requires_sensor_and_model() {
        assert_eq!(
            Action::get_sensor("p", 4, "", "dht22"),
            Err(ActionError::EmptySensor)
        );
        assert_eq!(
            Action::get_sensor("p", 4, "dht22", ""),
            Err(ActionError::EmptyModel)
        );
    }

    #[test]
    fn test_accessors() {
        let action = Action::get_sensor("/dev/ttyUSB1", 7, "ds18b20", "ds18b20").unwrap();
        assert_eq!(action.port_name(), "/dev/ttyUSB1");
        assert_eq!(action.pin(), 7);
        assert_eq!(action.verb(), "get");
        assert_eq!(Action::pin_off("x", 2).verb(), "off");
    }
}

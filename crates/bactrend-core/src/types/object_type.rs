open_enum! {
    /// BACnetObjectType. Named are the types a trend-log server hosts or
    /// samples; anything else survives as `Other`.
    ObjectType: u16, to_u16, from_u16 {
        AnalogInput = 0,
        AnalogOutput = 1,
        AnalogValue = 2,
        BinaryInput = 3,
        BinaryOutput = 4,
        BinaryValue = 5,
        Device = 8,
        MultiStateInput = 13,
        MultiStateOutput = 14,
        Schedule = 17,
        MultiStateValue = 19,
        TrendLog = 20,
        TrendLogMultiple = 27,
    }
}

const NAMED: [(ObjectType, &str); 13] = [
    (ObjectType::AnalogInput, "ANALOG_INPUT"),
    (ObjectType::AnalogOutput, "ANALOG_OUTPUT"),
    (ObjectType::AnalogValue, "ANALOG_VALUE"),
    (ObjectType::BinaryInput, "BINARY_INPUT"),
    (ObjectType::BinaryOutput, "BINARY_OUTPUT"),
    (ObjectType::BinaryValue, "BINARY_VALUE"),
    (ObjectType::Device, "DEVICE"),
    (ObjectType::MultiStateInput, "MULTI_STATE_INPUT"),
    (ObjectType::MultiStateOutput, "MULTI_STATE_OUTPUT"),
    (ObjectType::Schedule, "SCHEDULE"),
    (ObjectType::MultiStateValue, "MULTI_STATE_VALUE"),
    (ObjectType::TrendLog, "TRENDLOG"),
    (ObjectType::TrendLogMultiple, "TRENDLOG_MULTIPLE"),
];

impl ObjectType {
    /// Upper-case name as used in configuration files, e.g. `ANALOG_VALUE`.
    pub fn name(self) -> Option<&'static str> {
        NAMED
            .iter()
            .find(|(ty, _)| *ty == self)
            .map(|(_, name)| *name)
    }

    /// Parses a configuration name. Matching is case-insensitive and accepts
    /// `-` in place of `_`.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED.iter().find_map(|(ty, candidate)| {
            let same = candidate.len() == name.len()
                && candidate
                    .bytes()
                    .zip(name.bytes())
                    .all(|(a, b)| a == b.to_ascii_uppercase() || (a == b'_' && b == b'-'));
            same.then_some(*ty)
        })
    }

    /// Whether this type carries a present value a trend log can sample.
    pub const fn is_point(self) -> bool {
        matches!(
            self,
            Self::AnalogInput
                | Self::AnalogOutput
                | Self::AnalogValue
                | Self::BinaryInput
                | Self::BinaryOutput
                | Self::BinaryValue
                | Self::MultiStateInput
                | Self::MultiStateOutput
                | Self::MultiStateValue
        )
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ObjectType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_u16(self.to_u16()),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ObjectType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl serde::de::Visitor<'_> for Visitor {
            type Value = ObjectType;

            fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("an object type name or number")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ObjectType, E> {
                ObjectType::from_name(v)
                    .ok_or_else(|| E::invalid_value(serde::de::Unexpected::Str(v), &self))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<ObjectType, E> {
                u16::try_from(v)
                    .ok()
                    .filter(|v| *v < 1024)
                    .map(ObjectType::from_u16)
                    .ok_or_else(|| E::invalid_value(serde::de::Unexpected::Unsigned(v), &self))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

//! Present values of the virtual device's points.
//!
//! Points are fed from the command socket, never from the field, so inputs
//! and outputs are flagged out-of-service like a simulated device would be.

use std::collections::HashMap;

use bactrend_core::services::log_record::LogDatum;
use bactrend_core::services::read_property::PropertyValue;
use bactrend_core::types::{ObjectId, ObjectType, PropertyId, StatusFlags};
use bactrend_trendlog::{LinkedObject, PropertySource, RangeError, Sample, TrendLogManager};
use serde::{Deserialize, Serialize};

use crate::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Analog,
    Binary,
    MultiState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointDirection {
    Input,
    Output,
    Value,
}

/// `None` for object types that are not points.
pub fn classify_point(object_type: ObjectType) -> Option<(PointKind, PointDirection)> {
    Some(match object_type {
        ObjectType::AnalogInput => (PointKind::Analog, PointDirection::Input),
        ObjectType::AnalogOutput => (PointKind::Analog, PointDirection::Output),
        ObjectType::AnalogValue => (PointKind::Analog, PointDirection::Value),
        ObjectType::BinaryInput => (PointKind::Binary, PointDirection::Input),
        ObjectType::BinaryOutput => (PointKind::Binary, PointDirection::Output),
        ObjectType::BinaryValue => (PointKind::Binary, PointDirection::Value),
        ObjectType::MultiStateInput => (PointKind::MultiState, PointDirection::Input),
        ObjectType::MultiStateOutput => (PointKind::MultiState, PointDirection::Output),
        ObjectType::MultiStateValue => (PointKind::MultiState, PointDirection::Value),
        _ => return None,
    })
}

/// One entry of the `points` configuration array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointConfig {
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub instance: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "presentValue")]
    pub present_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub name: String,
    pub present_value: f64,
    #[serde(skip)]
    pub kind: PointKind,
    #[serde(skip)]
    pub status_flags: StatusFlags,
}

impl Point {
    /// The present value as it is logged: real for analog points,
    /// enumerated for binary, unsigned for multi-state.
    pub fn sample(&self) -> Sample {
        let datum = match self.kind {
            PointKind::Analog => LogDatum::Real(self.present_value as f32),
            PointKind::Binary => LogDatum::Enumerated(u32::from(self.present_value != 0.0)),
            PointKind::MultiState => LogDatum::Unsigned(self.present_value.max(0.0) as u32),
        };
        Sample::with_flags(datum, self.status_flags)
    }

    pub fn read_property(
        &self,
        object_id: ObjectId,
        property_id: PropertyId,
    ) -> Result<PropertyValue<'_>, RangeError> {
        Ok(match property_id {
            PropertyId::ObjectIdentifier => PropertyValue::ObjectId(object_id),
            PropertyId::ObjectName => PropertyValue::CharacterString(&self.name),
            PropertyId::ObjectType => {
                PropertyValue::Enumerated(u32::from(object_id.object_type().to_u16()))
            }
            PropertyId::PresentValue => match self.sample().datum {
                LogDatum::Real(v) => PropertyValue::Real(v),
                LogDatum::Enumerated(v) => PropertyValue::Enumerated(v),
                LogDatum::Unsigned(v) => PropertyValue::Unsigned(v),
                _ => return Err(RangeError::unknown_property()),
            },
            PropertyId::StatusFlags => PropertyValue::StatusFlags(self.status_flags),
            PropertyId::OutOfService => {
                PropertyValue::Boolean(self.status_flags.contains(StatusFlags::OUT_OF_SERVICE))
            }
            _ => return Err(RangeError::unknown_property()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PointTable {
    points: HashMap<(ObjectType, u32), Point>,
}

impl PointTable {
    pub fn from_config(configs: &[PointConfig]) -> Self {
        let mut table = Self::default();
        for config in configs {
            if let Err(err) = table.insert(config) {
                log::error!("skipping point {}: {err}", config.instance);
            }
        }
        table
    }

    pub fn insert(&mut self, config: &PointConfig) -> Result<(), ServerError> {
        let (kind, direction) =
            classify_point(config.object_type).ok_or(ServerError::NotAPoint(config.object_type))?;
        let status_flags = match direction {
            PointDirection::Value => StatusFlags::empty(),
            PointDirection::Input | PointDirection::Output => StatusFlags::OUT_OF_SERVICE,
        };
        let name = if config.name.is_empty() {
            format!("{:?}-{}", config.object_type, config.instance)
        } else {
            config.name.clone()
        };
        self.points.insert(
            (config.object_type, config.instance),
            Point {
                name,
                present_value: config.present_value.unwrap_or(0.0),
                kind,
                status_flags,
            },
        );
        Ok(())
    }

    pub fn get(&self, object_type: ObjectType, instance: u32) -> Option<&Point> {
        self.points.get(&(object_type, instance))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Current value of a linked object, for periodic sampling.
    pub fn sample(&self, object: LinkedObject) -> Option<Sample> {
        self.get(object.object_type, object.instance).map(Point::sample)
    }

    /// Sets a present value and returns the resulting sample.
    pub fn write(
        &mut self,
        object_type: ObjectType,
        instance: u32,
        value: f64,
    ) -> Result<Sample, ServerError> {
        let point = self
            .points
            .get_mut(&(object_type, instance))
            .ok_or(ServerError::UnknownPoint {
                object_type,
                instance,
            })?;
        point.present_value = value;
        Ok(point.sample())
    }

    /// Point count per object type, keyed by configuration name.
    pub fn counts(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for (object_type, _) in self.points.keys() {
            if let Some(name) = object_type.name() {
                *counts.entry(name).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// The objects ReadProperty can reach: points and trend logs, borrowed from
/// their locks for one reply.
pub struct DeviceObjects<'a> {
    pub points: &'a PointTable,
    pub trendlogs: &'a TrendLogManager,
}

impl PropertySource for DeviceObjects<'_> {
    fn read_property(
        &self,
        object_id: ObjectId,
        property_id: PropertyId,
    ) -> Result<PropertyValue<'_>, RangeError> {
        let object_type = object_id.object_type();
        if object_type == ObjectType::TrendLog {
            return self.trendlogs.read_property(object_id, property_id);
        }
        self.points
            .get(object_type, object_id.instance())
            .ok_or_else(RangeError::unknown_object)?
            .read_property(object_id, property_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        classify_point, DeviceObjects, PointConfig, PointDirection, PointKind, PointTable,
    };
    use bactrend_core::services::log_record::LogDatum;
    use bactrend_core::services::read_property::PropertyValue;
    use bactrend_core::types::{ErrorCode, ObjectId, ObjectType, PropertyId, StatusFlags};
    use bactrend_trendlog::{LinkedObject, PropertySource, TrendLogConfig, TrendLogManager};

    fn config(object_type: ObjectType, instance: u32, pv: f64) -> PointConfig {
        PointConfig {
            object_type,
            instance,
            name: String::new(),
            present_value: Some(pv),
        }
    }

    #[test]
    fn classify_io() {
        assert_eq!(
            classify_point(ObjectType::AnalogInput),
            Some((PointKind::Analog, PointDirection::Input))
        );
        assert_eq!(
            classify_point(ObjectType::BinaryValue),
            Some((PointKind::Binary, PointDirection::Value))
        );
        assert_eq!(
            classify_point(ObjectType::MultiStateOutput),
            Some((PointKind::MultiState, PointDirection::Output))
        );
        assert_eq!(classify_point(ObjectType::TrendLog), None);
    }

    #[test]
    fn samples_follow_point_kind() {
        let table = PointTable::from_config(&[
            config(ObjectType::AnalogInput, 1, 21.5),
            config(ObjectType::BinaryValue, 2, 1.0),
            config(ObjectType::MultiStateValue, 3, 4.0),
            config(ObjectType::Device, 4, 0.0),
        ]);
        assert_eq!(table.len(), 3);

        let ai = table
            .sample(LinkedObject {
                object_type: ObjectType::AnalogInput,
                instance: 1,
            })
            .unwrap();
        assert_eq!(ai.datum, LogDatum::Real(21.5));
        assert_eq!(ai.status_flags, StatusFlags::OUT_OF_SERVICE);

        let bv = table.get(ObjectType::BinaryValue, 2).unwrap().sample();
        assert_eq!(bv.datum, LogDatum::Enumerated(1));
        assert_eq!(bv.status_flags, StatusFlags::empty());

        let msv = table.get(ObjectType::MultiStateValue, 3).unwrap().sample();
        assert_eq!(msv.datum, LogDatum::Unsigned(4));
    }

    #[test]
    fn write_updates_known_points_only() {
        let mut table = PointTable::from_config(&[config(ObjectType::AnalogValue, 1, 0.0)]);
        let sample = table.write(ObjectType::AnalogValue, 1, 3.25).unwrap();
        assert_eq!(sample.datum, LogDatum::Real(3.25));
        assert_eq!(table.get(ObjectType::AnalogValue, 1).unwrap().present_value, 3.25);
        assert!(table.write(ObjectType::AnalogValue, 2, 1.0).is_err());
        assert_eq!(table.counts().get("ANALOG_VALUE"), Some(&1));
    }

    #[test]
    fn point_properties() {
        let table = PointTable::from_config(&[
            config(ObjectType::AnalogInput, 1, 21.5),
            config(ObjectType::BinaryValue, 2, 1.0),
        ]);
        let mut trendlogs = TrendLogManager::new();
        trendlogs.add(TrendLogConfig::new(1, "AI-1 log")).unwrap();
        let objects = DeviceObjects {
            points: &table,
            trendlogs: &trendlogs,
        };
        let ai = ObjectId::new(ObjectType::AnalogInput, 1);
        let bv = ObjectId::new(ObjectType::BinaryValue, 2);

        assert_eq!(
            objects.read_property(ai, PropertyId::PresentValue),
            Ok(PropertyValue::Real(21.5))
        );
        assert_eq!(
            objects.read_property(ai, PropertyId::StatusFlags),
            Ok(PropertyValue::StatusFlags(StatusFlags::OUT_OF_SERVICE))
        );
        assert_eq!(
            objects.read_property(bv, PropertyId::PresentValue),
            Ok(PropertyValue::Enumerated(1))
        );
        assert_eq!(
            objects.read_property(bv, PropertyId::OutOfService),
            Ok(PropertyValue::Boolean(false))
        );
        assert_eq!(
            objects.read_property(
                ObjectId::new(ObjectType::TrendLog, 1),
                PropertyId::RecordCount
            ),
            Ok(PropertyValue::Unsigned(0))
        );

        let code = |id, property| objects.read_property(id, property).unwrap_err().code;
        assert_eq!(code(ai, PropertyId::LogBuffer), ErrorCode::UnknownProperty);
        assert_eq!(
            code(ObjectId::new(ObjectType::AnalogInput, 9), PropertyId::PresentValue),
            ErrorCode::UnknownObject
        );
    }
}

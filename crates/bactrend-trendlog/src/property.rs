//! ReadProperty access to trend-log objects.

use bactrend_core::services::read_property::PropertyValue;
use bactrend_core::types::{ObjectId, ObjectType, PropertyId, StatusFlags};

use crate::config::TriggerType;
use crate::error::RangeError;
use crate::manager::{TrendLog, TrendLogManager};
use crate::repository::LogView;

/// Objects that answer ReadProperty. Values may borrow from the source, so
/// callers encode them before releasing any lock around it.
pub trait PropertySource {
    fn read_property(
        &self,
        object_id: ObjectId,
        property_id: PropertyId,
    ) -> Result<PropertyValue<'_>, RangeError>;
}

/// BACnetLoggingType.
fn logging_type(trigger: TriggerType) -> u32 {
    match trigger {
        TriggerType::Periodic => 0,
        TriggerType::Cov => 1,
        TriggerType::Triggered => 2,
    }
}

impl TrendLog {
    pub fn read_property(&self, property_id: PropertyId) -> Result<PropertyValue<'_>, RangeError> {
        let config = self.config();
        Ok(match property_id {
            PropertyId::ObjectIdentifier => {
                PropertyValue::ObjectId(ObjectId::new(ObjectType::TrendLog, config.instance))
            }
            PropertyId::ObjectName => PropertyValue::CharacterString(&config.name),
            PropertyId::ObjectType => {
                PropertyValue::Enumerated(u32::from(ObjectType::TrendLog.to_u16()))
            }
            PropertyId::Description => PropertyValue::CharacterString(&config.description),
            PropertyId::StatusFlags => PropertyValue::StatusFlags(StatusFlags::empty()),
            PropertyId::Enable => PropertyValue::Boolean(self.is_running()),
            // hundredths of a second on the wire
            PropertyId::LogInterval => {
                PropertyValue::Unsigned(config.log_interval.saturating_mul(100))
            }
            PropertyId::BufferSize => PropertyValue::Unsigned(config.buffer_size),
            PropertyId::RecordCount => PropertyValue::Unsigned(self.record_count()),
            PropertyId::TotalRecordCount => PropertyValue::Unsigned(self.total_record_count()),
            PropertyId::StopWhenFull => PropertyValue::Boolean(config.stop_when_full),
            PropertyId::AlignIntervals => PropertyValue::Boolean(config.align_intervals),
            PropertyId::LoggingType => {
                PropertyValue::Enumerated(logging_type(config.trigger_type))
            }
            PropertyId::LogBuffer => return Err(RangeError::read_access_denied()),
            _ => return Err(RangeError::unknown_property()),
        })
    }
}

impl PropertySource for TrendLogManager {
    fn read_property(
        &self,
        object_id: ObjectId,
        property_id: PropertyId,
    ) -> Result<PropertyValue<'_>, RangeError> {
        if object_id.object_type() != ObjectType::TrendLog {
            return Err(RangeError::unknown_object());
        }
        self.get(object_id.instance())
            .ok_or_else(RangeError::unknown_object)?
            .read_property(property_id)
    }
}

use crate::types::ObjectType;
use core::fmt;

const INSTANCE_BITS: u32 = 22;

/// BACnetObjectIdentifier: a 10-bit object type above a 22-bit instance,
/// packed the way it travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    pub const MAX_INSTANCE: u32 = (1 << INSTANCE_BITS) - 1;

    /// Instances above [`Self::MAX_INSTANCE`] are masked.
    pub const fn new(object_type: ObjectType, instance: u32) -> Self {
        let kind = (object_type.to_u16() as u32) & 0x03FF;
        Self((kind << INSTANCE_BITS) | (instance & Self::MAX_INSTANCE))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn object_type(self) -> ObjectType {
        ObjectType::from_u16((self.0 >> INSTANCE_BITS) as u16)
    }

    pub const fn instance(self) -> u32 {
        self.0 & Self::MAX_INSTANCE
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.object_type(), self.instance())
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectId;
    use crate::types::ObjectType;

    #[test]
    fn trend_log_packing() {
        let id = ObjectId::new(ObjectType::TrendLog, 1);
        assert_eq!(id.raw(), 0x0500_0001);
        assert_eq!(ObjectId::from_raw(0x0500_0001), id);
        assert_eq!(id.object_type(), ObjectType::TrendLog);
    }

    #[test]
    fn instance_is_masked_to_22_bits() {
        let id = ObjectId::new(ObjectType::AnalogValue, ObjectId::MAX_INSTANCE + 2);
        assert_eq!(id.instance(), 1);
        assert_eq!(id.object_type(), ObjectType::AnalogValue);
    }
}

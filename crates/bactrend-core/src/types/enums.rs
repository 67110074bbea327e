//! Enumerations carried in Error and Reject PDUs. Only the values this
//! server produces or a client is likely to see are named.

wire_enum! {
    ErrorClass: u32, to_u32, from_u32 {
        Device = 0,
        Object = 1,
        Property = 2,
        Resources = 3,
        Security = 4,
        Services = 5,
        Vt = 6,
        Communication = 7,
    }
}

wire_enum! {
    ErrorCode: u32, to_u32, from_u32 {
        Other = 0,
        ConfigurationInProgress = 2,
        DeviceBusy = 3,
        InvalidParameterDataType = 13,
        MissingRequiredParameter = 16,
        NoSpaceForObject = 18,
        PropertyIsNotAList = 22,
        ReadAccessDenied = 27,
        UnknownObject = 31,
        UnknownProperty = 32,
        ValueOutOfRange = 37,
        WriteAccessDenied = 40,
        InvalidArrayIndex = 42,
        PropertyIsNotAnArray = 50,
    }
}

wire_enum! {
    /// BACnetRejectReason.
    RejectReason: u8, to_u8, from_u8 {
        Other = 0,
        BufferOverflow = 1,
        InvalidParameterDataType = 3,
        InvalidTag = 4,
        MissingRequiredParameter = 5,
        TooManyArguments = 7,
        UnrecognizedService = 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorClass, ErrorCode, RejectReason};

    #[test]
    fn read_range_refusals_use_standard_numbers() {
        assert_eq!(ErrorCode::InvalidArrayIndex.to_u32(), 42);
        assert_eq!(ErrorCode::PropertyIsNotAnArray.to_u32(), 50);
        assert_eq!(ErrorClass::Object.to_u32(), 1);
        assert_eq!(RejectReason::TooManyArguments.to_u8(), 7);
    }

    #[test]
    fn unnamed_values() {
        assert_eq!(ErrorCode::from_u32(9999), None);
        assert_eq!(ErrorClass::from_u32(8), None);
        assert_eq!(RejectReason::from_u8(2), None);
        assert_eq!(ErrorCode::from_u32(31), Some(ErrorCode::UnknownObject));
    }
}

open_enum! {
    /// BACnetPropertyIdentifier. The named values are the ones a trend log
    /// and its monitored points expose.
    PropertyId: u32, to_u32, from_u32 {
        Description = 28,
        ObjectIdentifier = 75,
        ObjectName = 77,
        ObjectType = 79,
        OutOfService = 81,
        PresentValue = 85,
        StatusFlags = 111,
        BufferSize = 126,
        LogBuffer = 131,
        Enable = 133,
        LogInterval = 134,
        RecordCount = 141,
        StopWhenFull = 144,
        TotalRecordCount = 145,
        AlignIntervals = 193,
        LoggingType = 197,
    }
}

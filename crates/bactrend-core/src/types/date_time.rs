use core::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year_since_1900: u8,
    pub month: u8,
    pub day: u8,
    /// 1 = Monday .. 7 = Sunday.
    pub weekday: u8,
}

impl Date {
    /// Builds a date from a calendar year and fills in the weekday.
    pub fn from_ymd(year: u16, month: u8, day: u8) -> Option<Self> {
        let year_since_1900 = u8::try_from(year.checked_sub(1900)?).ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(Self {
            year_since_1900,
            month,
            day,
            weekday: weekday_of(year, month, day),
        })
    }

    pub const fn year(self) -> u16 {
        1900 + self.year_since_1900 as u16
    }
}

// Sakamoto's method, remapped from 0 = Sunday to BACnet's 1 = Monday.
fn weekday_of(year: u16, month: u8, day: u8) -> u8 {
    const OFFSETS: [u16; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let y = if month < 3 { year - 1 } else { year };
    let dow = (y + y / 4 - y / 100 + y / 400 + OFFSETS[month as usize - 1] + day as u16) % 7;
    if dow == 0 {
        7
    } else {
        dow as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl Time {
    pub const fn hms(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
            hundredths: 0,
        }
    }
}

/// A BACnetDateTime: date followed by time.
///
/// Ordering is chronological and ignores the weekday octet, which is derived
/// data and may be unspecified on the wire.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

impl DateTime {
    pub const fn new(date: Date, time: Time) -> Self {
        Self { date, time }
    }

    const fn sort_key(&self) -> (u8, u8, u8, u8, u8, u8, u8) {
        (
            self.date.year_since_1900,
            self.date.month,
            self.date.day,
            self.time.hour,
            self.time.minute,
            self.time.second,
            self.time.hundredths,
        )
    }
}

impl PartialEq for DateTime {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for DateTime {}

impl core::hash::Hash for DateTime {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

impl PartialOrd for DateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::{Date, DateTime, Time};

    #[test]
    fn weekday_is_derived() {
        // 2025-01-01 was a Wednesday.
        assert_eq!(Date::from_ymd(2025, 1, 1).unwrap().weekday, 3);
        // 2024-03-03 was a Sunday.
        assert_eq!(Date::from_ymd(2024, 3, 3).unwrap().weekday, 7);
    }

    #[test]
    fn rejects_out_of_range_dates() {
        assert!(Date::from_ymd(1899, 1, 1).is_none());
        assert!(Date::from_ymd(2160, 1, 1).is_none());
        assert!(Date::from_ymd(2025, 13, 1).is_none());
    }

    #[test]
    fn ordering_ignores_weekday() {
        let mut a = DateTime::new(Date::from_ymd(2025, 5, 1).unwrap(), Time::hms(10, 0, 0));
        let b = DateTime::new(Date::from_ymd(2025, 5, 1).unwrap(), Time::hms(10, 0, 1));
        assert!(a < b);
        a.date.weekday = 0xFF;
        assert!(a < b);
        let mut c = b;
        c.date.weekday = 0;
        assert_eq!(b, c);
    }
}

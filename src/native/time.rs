//! Implements a portable wrapper for the Windows FILETIME representation.
//!
//! ETW timestamps (in the event header, and in FILETIME-typed fields) count 100ns intervals since
//! January 1, 1601 (UTC).
use std::convert::TryFrom;

/// Wrapper for [FILETIME](https://learn.microsoft.com/en-us/windows/win32/api/minwinbase/ns-minwinbase-filetime)
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FileTime(i64);

const SECONDS_BETWEEN_1601_AND_1970: i64 = 11_644_473_600;
const NS_IN_SECOND: i64 = 1_000_000_000;
const MS_IN_SECOND: i64 = 1_000;

impl FileTime {
    pub const fn from_quad(quad: i64) -> Self {
        FileTime(quad)
    }

    /// The raw count of 100ns intervals since 1601
    pub const fn as_quad(&self) -> i64 {
        self.0
    }

    /// Converts to a unix timestamp with millisecond granularity.
    pub fn as_unix_timestamp(&self) -> i64 {
        self.0 / 10_000 - (SECONDS_BETWEEN_1601_AND_1970 * MS_IN_SECOND)
    }

    /// Converts to a unix timestamp with nanosecond granularity.
    pub fn as_unix_timestamp_nanos(&self) -> i128 {
        self.0 as i128 * 100 - (SECONDS_BETWEEN_1601_AND_1970 as i128 * NS_IN_SECOND as i128)
    }

    /// Converts to OffsetDateTime
    #[cfg(feature = "time_rs")]
    pub fn as_date_time(&self) -> Result<time::OffsetDateTime, time::error::ComponentRange> {
        time::OffsetDateTime::from_unix_timestamp_nanos(self.as_unix_timestamp_nanos())
    }
}

#[cfg(feature = "time_rs")]
impl TryFrom<FileTime> for time::OffsetDateTime {
    type Error = time::error::ComponentRange;

    fn try_from(file_time: FileTime) -> Result<Self, Self::Error> {
        file_time.as_date_time()
    }
}

impl TryFrom<FileTime> for std::time::SystemTime {
    type Error = std::num::TryFromIntError;

    fn try_from(file_time: FileTime) -> Result<Self, Self::Error> {
        let nanos = file_time.as_unix_timestamp_nanos();
        let since_epoch = std::time::Duration::from_nanos(u64::try_from(nanos.unsigned_abs())?);
        if nanos >= 0 {
            Ok(std::time::UNIX_EPOCH + since_epoch)
        } else {
            Ok(std::time::UNIX_EPOCH - since_epoch)
        }
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Serialize for FileTime {
    #[cfg(feature = "time_rs")]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let date_time = self.as_date_time().map_err(serde::ser::Error::custom)?;
        serde::ser::Serialize::serialize(&date_time, serializer)
    }

    #[cfg(not(feature = "time_rs"))]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.as_unix_timestamp())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // 2022-01-01T00:00:00Z
    const NEW_YEAR_2022: i64 = 132_854_688_000_000_000;

    #[test]
    fn unix_conversions() {
        let ft = FileTime::from_quad(NEW_YEAR_2022);
        assert_eq!(ft.as_unix_timestamp(), 1_640_995_200_000);
        assert_eq!(ft.as_unix_timestamp_nanos(), 1_640_995_200_000_000_000);

        let epoch = FileTime::from_quad(SECONDS_BETWEEN_1601_AND_1970 * 10_000_000);
        assert_eq!(epoch.as_unix_timestamp(), 0);
        assert_eq!(
            std::time::SystemTime::try_from(epoch).unwrap(),
            std::time::UNIX_EPOCH
        );
    }

    #[cfg(feature = "time_rs")]
    #[test]
    fn date_time() {
        let dt = FileTime::from_quad(NEW_YEAR_2022).as_date_time().unwrap();
        assert_eq!(dt.year(), 2022);
        assert_eq!(dt.ordinal(), 1);
    }
}

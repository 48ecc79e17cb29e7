/// The error type returned by table insertions.
///
/// Every variant except [`InsertError::SentinelKey`] is a structural failure:
/// the table's fixed directory cannot take the element. Any entries the failed
/// insert moved are put back, so keys inserted before the failure remain
/// retrievable and the failed element is not stored.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    /// The reserved sentinel key was passed as a data key.
    #[error("the sentinel key marks empty slots and cannot be inserted")]
    SentinelKey,

    /// The probe sequence returned to its origin without finding a free slot.
    #[error(
        "building {table} failed: detected cycle during probing, \
    all buckets along the way are full"
    )]
    ProbingCycle { table: String },

    /// The probe sequence grew longer than the configured bound.
    #[error("maximum probing step count ({max}) exceeded")]
    MaxProbingStepsExceeded { max: usize },

    /// A Robin Hood displacement chain evicted the key being inserted.
    #[error("insertion failed, infinite displacement loop detected")]
    InfiniteDisplacement,

    /// A cuckoo displacement chain grew longer than the configured bound.
    #[error("maximum kick cycle length ({max}) reached")]
    MaxKickCycleLength { max: usize },

    /// A previous insertion into this cuckoo table failed.
    ///
    /// The table stays readable but no longer accepts insertions until it is
    /// cleared.
    #[error("a previous insertion failed, the table no longer accepts insertions")]
    TableFailed,
}

impl InsertError {
    /// Returns `true` if the error is caused by the table running out of room
    /// rather than by a misused key.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SentinelKey)
    }
}

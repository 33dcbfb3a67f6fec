use serde::{Serialize, Serializer};

/// ActivityManager process state, as logged by `am_proc_died`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    Persistent,
    PersistentUi,
    Top,
    BoundTop,
    ForegroundService,
    BoundForegroundService,
    ImportantForeground,
    ImportantBackground,
    TransientBackground,
    Backup,
    Service,
    Receiver,
    TopSleeping,
    HeavyWeight,
    Home,
    LastActivity,
    CachedActivity,
    CachedActivityClient,
    CachedRecent,
    CachedEmpty,
    /// Code outside the lookup table
    Unknown(i32),
}

/// Code → state, indexed by code.
const STATE_TABLE: [ProcessState; 20] = [
    ProcessState::Persistent,
    ProcessState::PersistentUi,
    ProcessState::Top,
    ProcessState::BoundTop,
    ProcessState::ForegroundService,
    ProcessState::BoundForegroundService,
    ProcessState::ImportantForeground,
    ProcessState::ImportantBackground,
    ProcessState::TransientBackground,
    ProcessState::Backup,
    ProcessState::Service,
    ProcessState::Receiver,
    ProcessState::TopSleeping,
    ProcessState::HeavyWeight,
    ProcessState::Home,
    ProcessState::LastActivity,
    ProcessState::CachedActivity,
    ProcessState::CachedActivityClient,
    ProcessState::CachedRecent,
    ProcessState::CachedEmpty,
];

impl ProcessState {
    pub fn from_code(code: i32) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|idx| STATE_TABLE.get(idx).copied())
            .unwrap_or(ProcessState::Unknown(code))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Persistent => "PERSISTENT",
            ProcessState::PersistentUi => "PERSISTENT_UI",
            ProcessState::Top => "TOP",
            ProcessState::BoundTop => "BOUND_TOP",
            ProcessState::ForegroundService => "FOREGROUND_SERVICE",
            ProcessState::BoundForegroundService => "BOUND_FOREGROUND_SERVICE",
            ProcessState::ImportantForeground => "IMPORTANT_FOREGROUND",
            ProcessState::ImportantBackground => "IMPORTANT_BACKGROUND",
            ProcessState::TransientBackground => "TRANSIENT_BACKGROUND",
            ProcessState::Backup => "BACKUP",
            ProcessState::Service => "SERVICE",
            ProcessState::Receiver => "RECEIVER",
            ProcessState::TopSleeping => "TOP_SLEEPING",
            ProcessState::HeavyWeight => "HEAVY_WEIGHT",
            ProcessState::Home => "HOME",
            ProcessState::LastActivity => "LAST_ACTIVITY",
            ProcessState::CachedActivity => "CACHED_ACTIVITY",
            ProcessState::CachedActivityClient => "CACHED_ACTIVITY_CLIENT",
            ProcessState::CachedRecent => "CACHED_RECENT",
            ProcessState::CachedEmpty => "CACHED_EMPTY",
            ProcessState::Unknown(_) => "UNKNOWN_STATE",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ProcessState::Unknown(_))
    }
}

impl Serialize for ProcessState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Name of the dictionary used when no dictionary is named.
pub const DEFAULT_DICTIONARY: &str = "";
pub const DEFAULT_MAX_EDIT_DISTANCE: usize = 2;
pub const DEFAULT_COMPOUND_CANDIDATES: usize = 4;
/// Version tag written into saved models.
pub const ARCHIVE_VERSION: u32 = 1;
